use leptos::html;
use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

#[component]
pub fn Input(
    #[prop(into, optional)] class: String,
    #[prop(into, default = "text")] r#type: &'static str,
    #[prop(into, optional)] placeholder: String,
    #[prop(optional)] disabled: bool,
    #[prop(optional)] autofocus: bool,

    // Manual wiring instead of `bind:value`, which has shifted between Leptos versions.
    #[prop(into)] bind_value: RwSignal<String>,

    /// Fired on Enter.
    #[prop(optional)] on_enter: Option<Callback<()>>,
    /// Fired on Escape.
    #[prop(optional)] on_escape: Option<Callback<()>>,
    #[prop(optional)] on_blur: Option<Callback<()>>,

    #[prop(optional)] node_ref: NodeRef<html::Input>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "placeholder:text-muted-foreground selection:bg-primary selection:text-primary-foreground border-input flex h-9 w-full min-w-0 rounded-md border bg-transparent px-3 py-1 text-base shadow-xs transition-[color,box-shadow] outline-none disabled:pointer-events-none disabled:cursor-not-allowed disabled:opacity-50 md:text-sm",
        "focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2",
        class
    );

    let on_input = move |ev: web_sys::Event| {
        if let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            bind_value.set(input.value());
        }
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
        "Enter" => {
            if let Some(cb) = on_enter {
                ev.prevent_default();
                cb.run(());
            }
        }
        "Escape" => {
            if let Some(cb) = on_escape {
                cb.run(());
            }
        }
        _ => {}
    };

    view! {
        <input
            data-name="Input"
            type=r#type
            class=merged_class
            placeholder=placeholder
            disabled=disabled
            autofocus=autofocus
            prop:value=move || bind_value.get()
            on:input=on_input
            on:keydown=on_keydown
            on:blur=move |_| {
                if let Some(cb) = on_blur {
                    cb.run(());
                }
            }
            node_ref=node_ref
        />
    }
}
