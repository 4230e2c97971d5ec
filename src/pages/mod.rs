use crate::blocks::{self, BlockClick, BlockDisplay, BlockElement};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, Input, Spinner,
};
use crate::models::{AssetKind, Block, BlockKind, Page};
use crate::state::block_list::is_tmp_block_id;
use crate::state::page_tree::TreeRow;
use crate::state::reorder::{DropTarget, Rect};
use crate::state::{AppContext, NoticeLevel};
use crate::util::normalize_title;
use icons::{ChevronDown, ChevronRight, GripVertical, Plus, X};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use tw_merge::tw_merge;

fn rect_of(el: &web_sys::Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect {
        left: r.left(),
        top: r.top(),
        width: r.width(),
        height: r.height(),
    }
}

fn page_label(page: &Page) -> String {
    let title = normalize_title(&page.title, "Untitled");
    match page.icon.as_deref().map(str::trim) {
        Some(icon) if !icon.is_empty() => format!("{icon} {title}"),
        _ => title,
    }
}

#[component]
fn TrashIcon() -> impl IntoView {
    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            width="16"
            height="16"
            viewBox="0 0 24 24"
            fill="none"
            stroke="currentColor"
            stroke-width="2"
            stroke-linecap="round"
            stroke-linejoin="round"
            aria-hidden="true"
        >
            <path d="M3 6h18" />
            <path d="M8 6V4h8v2" />
            <path d="M19 6l-1 14H6L5 6" />
            <path d="M10 11v6" />
            <path d="M14 11v6" />
        </svg>
    }
}

#[component]
pub fn NoticeBanner() -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    move || {
        ws.notice.get().map(|notice| {
            let tone = match notice.level {
                NoticeLevel::Info => "border-border bg-background",
                NoticeLevel::Error => "border-destructive/30 text-destructive",
            };
            view! {
                <Alert class=tone attr:role="alert">
                    <AlertDescription>{notice.message}</AlertDescription>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Icon
                        attr:title="Dismiss"
                        on:click=move |_| ws.dismiss_notice()
                    >
                        <X />
                    </Button>
                </Alert>
            }
        })
    }
}

#[component]
pub fn Sidebar() -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    let new_title: RwSignal<String> = RwSignal::new(String::new());
    let child_of: RwSignal<Option<String>> = RwSignal::new(None);
    let child_title: RwSignal<String> = RwSignal::new(String::new());

    let create_root = Callback::new(move |_| {
        let title = new_title.get_untracked();
        new_title.set(String::new());
        spawn_local(async move {
            if ws.create_page(&title).await.is_err() {
                new_title.set(title);
            }
        });
    });

    let create_child = Callback::new(move |_| {
        let Some(parent_id) = child_of.get_untracked() else {
            return;
        };
        let title = child_title.get_untracked();
        child_of.set(None);
        spawn_local(async move {
            // A page left unlinked is reported through the notice banner.
            let _ = ws.create_nested_page(&parent_id, &title).await;
        });
    });

    let current_id = move || ws.navigation.with(|n| n.current_id().map(str::to_string));

    view! {
        <aside class="flex h-full w-64 shrink-0 flex-col gap-3 border-r bg-muted/30 p-3">
            <div class="flex items-center justify-between">
                <span class="text-xs font-semibold uppercase tracking-wide text-muted-foreground">
                    "Pages"
                </span>
                <Show when=move || ws.tree_loading.get()>
                    <Spinner />
                </Show>
            </div>
            <Input bind_value=new_title placeholder="New page" on_enter=create_root />
            <nav class="flex min-h-0 flex-col gap-0.5 overflow-y-auto">
                {move || {
                    let current = current_id();
                    let rows = ws.tree.with(|t| t.visible_rows());
                    if rows.is_empty() && !ws.tree_loading.get() {
                        return view! {
                            <p class="px-2 py-4 text-xs text-muted-foreground">"No pages yet"</p>
                        }
                            .into_any();
                    }
                    rows.into_iter()
                        .map(|row| {
                            let selected = current.as_deref() == Some(row.page.id.as_str());
                            view! {
                                <PageRow
                                    row=row
                                    selected=selected
                                    child_of=child_of
                                    child_title=child_title
                                    create_child=create_child
                                />
                            }
                        })
                        .collect_view()
                        .into_any()
                }}
            </nav>
        </aside>
    }
}

#[component]
fn PageRow(
    row: TreeRow,
    selected: bool,
    child_of: RwSignal<Option<String>>,
    child_title: RwSignal<String>,
    create_child: Callback<()>,
) -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    let page = row.page.clone();
    let id = page.id.clone();
    let indent = format!("padding-left: {}px", 4 + row.depth * 14);
    let variant = if selected {
        ButtonVariant::Accent
    } else {
        ButtonVariant::Ghost
    };

    let adding = {
        let id = id.clone();
        move || child_of.get().as_deref() == Some(id.as_str())
    };

    let on_toggle = {
        let id = id.clone();
        move |ev: web_sys::MouseEvent| {
            ev.stop_propagation();
            ws.toggle_expansion(&id);
        }
    };

    let on_open = {
        let page = page.clone();
        move |_| {
            let page = page.clone();
            spawn_local(async move {
                let _ = ws.navigate(Some(page)).await;
            });
        }
    };

    let on_add_child = {
        let id = id.clone();
        move |ev: web_sys::MouseEvent| {
            ev.stop_propagation();
            child_title.set(String::new());
            child_of.set(Some(id.clone()));
        }
    };

    let on_delete = {
        let id = id.clone();
        move |ev: web_sys::MouseEvent| {
            ev.stop_propagation();
            let id = id.clone();
            spawn_local(async move {
                if ws.delete_page(&id).await.is_ok() {
                    ws.notify(NoticeLevel::Info, "Page deleted");
                }
            });
        }
    };

    let chevron = if row.is_expanded {
        view! { <ChevronDown /> }.into_any()
    } else {
        view! { <ChevronRight /> }.into_any()
    };

    view! {
        <div class="flex flex-col">
            <div class="group flex min-w-0 items-center gap-1" style=indent.clone()>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    class=if row.has_children { "" } else { "invisible" }
                    attr:title="Expand"
                    on:click=on_toggle
                >
                    {chevron}
                </Button>
                <Button
                    variant=variant
                    size=ButtonSize::Sm
                    class="min-w-0 flex-1 justify-start"
                    attr:aria-current=move || if selected { Some("page") } else { None }
                    on:click=on_open
                >
                    <span class="min-w-0 flex-1 truncate">{page_label(&page)}</span>
                </Button>
                <div class="hidden shrink-0 items-center gap-1 group-hover:flex">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Icon
                        attr:title="Add sub-page"
                        on:click=on_add_child
                    >
                        <Plus />
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Icon
                        class="text-destructive"
                        attr:title="Delete"
                        on:click=on_delete
                    >
                        <TrashIcon />
                    </Button>
                </div>
            </div>
            <Show when=adding>
                <div class="py-1" style=indent.clone()>
                    <Input
                        bind_value=child_title
                        placeholder="Sub-page title"
                        autofocus=true
                        on_enter=create_child
                        on_escape=Callback::new(move |_| child_of.set(None))
                    />
                </div>
            </Show>
        </div>
    }
}

#[component]
fn PageHeader(page: Page) -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    let editing: RwSignal<bool> = RwSignal::new(false);
    let title: RwSignal<String> = RwSignal::new(page.title.clone());
    let asset_path: RwSignal<String> = RwSignal::new(String::new());
    let asset_kind: RwSignal<AssetKind> = RwSignal::new(AssetKind::Cover);
    let uploading: RwSignal<bool> = RwSignal::new(false);

    let commit_title = {
        let id = page.id.clone();
        let original = page.title.clone();
        Callback::new(move |_| {
            if !editing.get_untracked() {
                return;
            }
            editing.set(false);
            let next = title.get_untracked();
            if next.trim() == original.trim() {
                return;
            }
            let id = id.clone();
            spawn_local(async move {
                let _ = ws.rename_page(&id, &next).await;
            });
        })
    };

    let upload = {
        let id = page.id.clone();
        move |_| {
            if uploading.get_untracked() {
                return;
            }
            let id = id.clone();
            let path = asset_path.get_untracked();
            let kind = asset_kind.get_untracked();
            uploading.set(true);
            spawn_local(async move {
                if ws.upload_page_asset(&id, &path, kind).await.is_ok() {
                    asset_path.set(String::new());
                }
                uploading.set(false);
            });
        }
    };

    let cover = page.cover.clone().filter(|c| !c.trim().is_empty());
    let label = page_label(&page);

    view! {
        <header class="flex flex-col gap-3">
            {cover
                .map(|c| {
                    view! {
                        <div
                            class="h-32 w-full rounded-lg bg-muted bg-cover bg-center"
                            style=format!("background-image: url('{c}')")
                            title=c.clone()
                        />
                    }
                })}
            <Show
                when=move || editing.get()
                fallback=move || {
                    let label = label.clone();
                    view! {
                        <h1
                            class="cursor-text text-3xl font-bold tracking-tight"
                            on:click=move |_| editing.set(true)
                        >
                            {label}
                        </h1>
                    }
                }
            >
                <Input
                    bind_value=title
                    class="text-2xl font-bold"
                    autofocus=true
                    on_enter=commit_title
                    on_blur=commit_title
                    on_escape=Callback::new(move |_| editing.set(false))
                />
            </Show>
            <div class="flex items-center gap-2 text-xs text-muted-foreground">
                <select
                    class="h-8 rounded-md border bg-transparent px-2"
                    on:change=move |ev| {
                        let kind = if event_target_value(&ev) == "icon" {
                            AssetKind::Icon
                        } else {
                            AssetKind::Cover
                        };
                        asset_kind.set(kind);
                    }
                >
                    <option value="cover">"Cover"</option>
                    <option value="icon">"Icon"</option>
                </select>
                <Input bind_value=asset_path placeholder="Image path" class="h-8 max-w-64" />
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || uploading.get()
                    on:click=upload
                >
                    "Upload"
                </Button>
            </div>
        </header>
    }
}

fn render_display(display: BlockDisplay) -> AnyView {
    let text = display.text;
    match display.element {
        BlockElement::Paragraph => view! { <p class="leading-7">{text}</p> }.into_any(),
        BlockElement::Heading(1) => {
            view! { <h2 class="text-2xl font-semibold">{text}</h2> }.into_any()
        }
        BlockElement::Heading(2) => {
            view! { <h3 class="text-xl font-semibold">{text}</h3> }.into_any()
        }
        BlockElement::Heading(_) => {
            view! { <h4 class="text-lg font-semibold">{text}</h4> }.into_any()
        }
        BlockElement::ListItem { ordinal } => {
            let marker = match ordinal {
                Some(n) => format!("{n}."),
                None => "•".to_string(),
            };
            view! {
                <div class="flex gap-2">
                    <span class="w-6 shrink-0 text-right text-muted-foreground">{marker}</span>
                    <span>{text}</span>
                </div>
            }
            .into_any()
        }
        BlockElement::Todo { checked } => view! {
            <label class="flex items-center gap-2">
                <input type="checkbox" disabled=true prop:checked=checked />
                <span class=if checked { "text-muted-foreground line-through" } else { "" }>
                    {text}
                </span>
            </label>
        }
        .into_any(),
        BlockElement::Code { language } => view! {
            <pre class="overflow-x-auto rounded-md bg-muted p-3 text-sm" data-language=language>
                <code>{text}</code>
            </pre>
        }
        .into_any(),
        BlockElement::Quote => view! {
            <blockquote class="border-l-2 pl-4 italic text-muted-foreground">{text}</blockquote>
        }
        .into_any(),
        BlockElement::Divider => view! { <hr class="my-2 border-border" /> }.into_any(),
        BlockElement::PageRef { embedded, .. } => {
            let class = if embedded {
                "font-medium underline decoration-border underline-offset-4"
            } else {
                "text-primary underline-offset-4 hover:underline"
            };
            view! { <span class=class>{text}</span> }.into_any()
        }
    }
}

#[component]
fn BlockRow(block: Block, display: BlockDisplay, editing: RwSignal<Option<String>>) -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    let id = block.id.clone();
    let pending = is_tmp_block_id(&block.id);
    let cursor = if blocks::is_editable(&block.block_type) {
        "cursor-text"
    } else {
        "cursor-pointer"
    };
    let draft: RwSignal<String> = RwSignal::new(block.content.clone());

    let is_editing = {
        let id = id.clone();
        move || editing.get().as_deref() == Some(id.as_str())
    };

    let row_class = {
        let id = id.clone();
        move || {
            let dragging = ws.drag.with(|d| d.source() == Some(id.as_str()));
            let over = ws
                .drag
                .with(|d| d.hovered() == Some(&DropTarget::Block(id.clone())));
            tw_merge!(
                "group flex items-start gap-2 rounded-md px-1 py-0.5",
                if dragging { "opacity-40" } else { "" },
                if over { "bg-accent/60" } else { "" },
                if pending { "opacity-60" } else { "" }
            )
        }
    };

    let on_click = {
        let block = block.clone();
        move |_| match blocks::on_click(&block) {
            BlockClick::Edit => {
                if !pending {
                    draft.set(block.content.clone());
                    editing.set(Some(block.id.clone()));
                }
            }
            BlockClick::Navigate(_) => {
                let block = block.clone();
                spawn_local(async move {
                    let _ = ws.follow_block(&block).await;
                });
            }
            BlockClick::Ignore => {}
        }
    };

    let save = {
        let id = id.clone();
        Callback::new(move |_| {
            if editing.get_untracked().as_deref() != Some(id.as_str()) {
                return;
            }
            editing.set(None);
            let id = id.clone();
            let content = draft.get_untracked();
            spawn_local(async move {
                let _ = ws.update_block_content(&id, &content).await;
            });
        })
    };

    let on_grip = {
        let id = id.clone();
        move |ev: web_sys::PointerEvent| {
            ev.prevent_default();
            ws.begin_drag(&id);
        }
    };

    let on_delete = {
        let id = id.clone();
        move |ev: web_sys::MouseEvent| {
            ev.stop_propagation();
            let id = id.clone();
            spawn_local(async move {
                let _ = ws.delete_block(&id).await;
            });
        }
    };

    view! {
        <div data-block-id=id.clone() class=row_class>
            <button
                class="mt-1 cursor-grab text-muted-foreground opacity-0 group-hover:opacity-100"
                title="Drag to reorder"
                disabled=pending
                on:pointerdown=on_grip
            >
                <GripVertical class="size-4" />
            </button>
            <div class="min-w-0 flex-1">
                <Show
                    when=is_editing.clone()
                    fallback={
                        let display = display.clone();
                        let on_click = on_click.clone();
                        move || {
                            view! {
                                <div class=tw_merge!("min-w-0", cursor) on:click=on_click.clone()>
                                    {render_display(display.clone())}
                                </div>
                            }
                        }
                    }
                >
                    <Input
                        bind_value=draft
                        autofocus=true
                        on_enter=save
                        on_blur=save
                        on_escape=Callback::new(move |_| editing.set(None))
                    />
                </Show>
            </div>
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Icon
                class="text-destructive opacity-0 group-hover:opacity-100"
                attr:title="Delete block"
                attr:disabled=pending
                on:click=on_delete
            >
                <TrashIcon />
            </Button>
        </div>
    }
}

#[component]
fn BlockListView() -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    let list_ref: NodeRef<html::Div> = NodeRef::new();
    let end_ref: NodeRef<html::Div> = NodeRef::new();
    let editing: RwSignal<Option<String>> = RwSignal::new(None);

    let on_pointer_move = move |ev: web_sys::PointerEvent| {
        if ws.drag.with_untracked(|d| d.source().is_none()) {
            return;
        }
        let Some(list) = list_ref.get_untracked() else {
            return;
        };
        let children = list.children();
        let rows: Vec<(String, Rect)> = (0..children.length())
            .filter_map(|i| children.item(i))
            .filter_map(|el| {
                let id = el.get_attribute("data-block-id")?;
                Some((id, rect_of(&el)))
            })
            .collect();
        let end_zone = end_ref.get_untracked().map(|el| rect_of(&el));
        ws.drag_pointer_moved(ev.client_x() as f64, ev.client_y() as f64, &rows, end_zone);
    };

    let on_pointer_up = move |_: web_sys::PointerEvent| {
        if ws.drag.with_untracked(|d| d.source().is_none()) {
            return;
        }
        spawn_local(async move {
            let _ = ws.finish_drag().await;
        });
    };

    let end_class = move || {
        let over = ws.drag.with(|d| d.hovered() == Some(&DropTarget::End));
        let active = ws.drag.with(|d| d.source().is_some());
        tw_merge!(
            "h-8 rounded-md border border-dashed border-transparent",
            if active { "border-border" } else { "" },
            if over { "bg-accent/60" } else { "" }
        )
    };

    view! {
        <div
            class="flex flex-col gap-1 select-none"
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=move |_| ws.cancel_drag()
            on:pointercancel=move |_| ws.cancel_drag()
        >
            <Show when=move || ws.blocks.with(|l| l.is_loading())>
                <div class="flex items-center gap-2 py-4 text-sm text-muted-foreground">
                    <Spinner />
                    "Loading blocks"
                </div>
            </Show>
            <div node_ref=list_ref class="flex flex-col gap-0.5">
                {move || {
                    let blocks = ws.blocks.with(|l| l.blocks().to_vec());
                    let displays = blocks::display_all(&blocks);
                    blocks
                        .into_iter()
                        .zip(displays)
                        .map(|(block, display)| {
                            view! { <BlockRow block=block display=display editing=editing /> }
                        })
                        .collect_view()
                }}
            </div>
            <div node_ref=end_ref class=end_class />
        </div>
    }
}

#[component]
fn BlockComposer(page_id: String) -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    let kind: RwSignal<BlockKind> = RwSignal::new(BlockKind::Text);
    let content: RwSignal<String> = RwSignal::new(String::new());
    let sub_title: RwSignal<String> = RwSignal::new(String::new());
    let link_target: RwSignal<String> = RwSignal::new(String::new());

    let add_block = Callback::new(move |_| {
        let Some(block_type) = kind.get_untracked().default_type() else {
            return;
        };
        let text = content.get_untracked();
        content.set(String::new());
        spawn_local(async move {
            if ws.create_block(block_type, &text).await.is_err() {
                content.set(text);
            }
        });
    });

    let add_sub_page = {
        let page_id = page_id.clone();
        Callback::new(move |_| {
            let title = sub_title.get_untracked();
            sub_title.set(String::new());
            let page_id = page_id.clone();
            spawn_local(async move {
                let _ = ws.create_nested_page(&page_id, &title).await;
            });
        })
    };

    let add_link = {
        let page_id = page_id.clone();
        move |_| {
            let target = link_target.get_untracked();
            if target.is_empty() {
                return;
            }
            let page_id = page_id.clone();
            spawn_local(async move {
                if ws.create_page_link(&page_id, &target, "").await.is_ok() {
                    link_target.set(String::new());
                }
            });
        }
    };

    let link_options = {
        let page_id = page_id.clone();
        move || {
            ws.tree
                .with(|t| t.pages())
                .into_iter()
                .filter(|p| p.id != page_id)
                .map(|p| {
                    let label = page_label(&p);
                    view! { <option value=p.id>{label}</option> }
                })
                .collect_view()
        }
    };

    view! {
        <Card>
            <CardContent class="flex flex-col gap-3">
                <div class="flex items-center gap-2">
                    <select
                        class="h-9 rounded-md border bg-transparent px-2 text-sm"
                        on:change=move |ev| {
                            if let Ok(k) = event_target_value(&ev).parse::<BlockKind>() {
                                kind.set(k);
                            }
                        }
                    >
                        {blocks::composer_kinds()
                            .into_iter()
                            .map(|k| {
                                view! {
                                    <option value=k.to_string() selected=move || kind.get() == k>
                                        {blocks::label(k)}
                                    </option>
                                }
                            })
                            .collect_view()}
                    </select>
                    <Show when=move || kind.get() != BlockKind::Divider>
                        <Input bind_value=content placeholder="Write something" on_enter=add_block />
                    </Show>
                    <Button variant=ButtonVariant::Default size=ButtonSize::Sm on:click=move |_| add_block.run(())>
                        "Add"
                    </Button>
                </div>
                <div class="flex items-center gap-2">
                    <Input bind_value=sub_title placeholder="New sub-page" on_enter=add_sub_page />
                    <select
                        class="h-9 max-w-48 rounded-md border bg-transparent px-2 text-sm"
                        prop:value=move || link_target.get()
                        on:change=move |ev| link_target.set(event_target_value(&ev))
                    >
                        <option value="">"Link to page"</option>
                        {link_options}
                    </select>
                    <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=add_link>
                        "Link"
                    </Button>
                </div>
            </CardContent>
        </Card>
    }
}

/// Main pane: the open page or an empty state.
#[component]
pub fn PageView() -> impl IntoView {
    let ws = expect_context::<AppContext>().0;

    move || match ws.navigation.with(|n| n.current().cloned()) {
        Some(page) => {
            let page_id = page.id.clone();
            view! {
                <div class="mx-auto flex w-full max-w-3xl flex-col gap-6 px-8 py-10">
                    <PageHeader page=page />
                    <BlockListView />
                    <BlockComposer page_id=page_id />
                </div>
            }
            .into_any()
        }
        None => view! {
            <div class="flex h-full items-center justify-center text-sm text-muted-foreground">
                "Select or create a page"
            </div>
        }
        .into_any(),
    }
}
