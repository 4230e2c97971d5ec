pub(crate) mod block_list;
pub(crate) mod command;
pub(crate) mod error;
pub(crate) mod expansion;
pub(crate) mod navigation;
pub(crate) mod page_tree;
pub(crate) mod reorder;

use crate::api::{ApiClient, PageStore};
use crate::blocks::resolve_target;
use crate::models::{AssetKind, Block, BlockId, BlockType, Page, PageId};
use crate::state::block_list::{BlockList, CreateBlock, DeleteBlock, UpdateContent};
use crate::state::command::run_command;
use crate::state::error::WorkspaceError;
use crate::state::expansion::ExpansionState;
use crate::state::navigation::{NavEffect, Navigation};
use crate::state::page_tree::{load_page_tree, PageTree};
use crate::state::reorder::{move_block, DragState, Rect, ReorderBlocks};
use leptos::prelude::*;

/// Stored text of divider blocks, which have nothing to type.
const DIVIDER_CONTENT: &str = "---";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoticeLevel {
    Info,
    Error,
}

/// Dismissible message shown above the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything the UI reads, plus the operations that change it.
///
/// Generic over the store so the same flows run against the HTTP client in the browser and an
/// in-memory store in tests.
pub(crate) struct Workspace<S: PageStore> {
    store: StoredValue<S, LocalStorage>,

    pub tree: RwSignal<PageTree>,
    pub tree_loading: RwSignal<bool>,
    /// Tree load guard: only the latest rebuild may land.
    tree_request_id: RwSignal<u64>,

    pub expansion: RwSignal<ExpansionState>,
    pub navigation: RwSignal<Navigation>,
    pub blocks: RwSignal<BlockList>,
    pub drag: RwSignal<DragState>,
    pub notice: RwSignal<Option<Notice>>,
}

impl<S: PageStore> Clone for Workspace<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: PageStore> Copy for Workspace<S> {}

impl<S: PageStore> Workspace<S> {
    pub fn new(store: S, expansion: ExpansionState) -> Self {
        Self {
            store: StoredValue::new_local(store),
            tree: RwSignal::new(PageTree::default()),
            tree_loading: RwSignal::new(false),
            tree_request_id: RwSignal::new(0),
            expansion: RwSignal::new(expansion),
            navigation: RwSignal::new(Navigation::default()),
            blocks: RwSignal::new(BlockList::default()),
            drag: RwSignal::new(DragState::default()),
            notice: RwSignal::new(None),
        }
    }

    fn store(&self) -> S {
        self.store.get_value()
    }

    pub fn current_page(&self) -> Option<Page> {
        self.navigation.with_untracked(|n| n.current().cloned())
    }

    fn current_page_id(&self) -> Option<PageId> {
        self.navigation
            .with_untracked(|n| n.current_id().map(str::to_string))
    }

    // ---- notices ----

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let id = self
            .notice
            .with_untracked(|n| n.as_ref().map(|n| n.id + 1).unwrap_or(1));
        self.notice.set(Some(Notice {
            id,
            level,
            message: message.into(),
        }));
    }

    /// Surfaces `err` as a notice and hands it back.
    fn report(&self, err: WorkspaceError) -> WorkspaceError {
        self.notify(NoticeLevel::Error, err.to_string());
        err
    }

    pub fn dismiss_notice(&self) {
        self.notice.set(None);
    }

    // ---- page tree ----

    /// Rebuilds the whole forest. A failed root fetch leaves an empty sidebar.
    pub async fn load_pages(&self) -> Result<(), WorkspaceError> {
        let req_id = self.tree_request_id.get_untracked().wrapping_add(1);
        self.tree_request_id.set(req_id);
        self.tree_loading.set(true);

        let expansion = self.expansion.get_untracked();
        let res = load_page_tree(&self.store(), &expansion).await;

        if self.tree_request_id.get_untracked() != req_id {
            tracing::debug!(req_id, "discarding superseded page tree");
            return Ok(());
        }
        self.tree_loading.set(false);

        match res {
            Ok(mut tree) => {
                // Expansion may have changed while the tree was loading.
                self.expansion.with_untracked(|e| tree.annotate(e));
                tracing::info!(pages = tree.len(), "page tree loaded");
                self.tree.set(tree);
                Ok(())
            }
            Err(source) => {
                tracing::error!(error = %source, "failed to load pages");
                self.tree.set(PageTree::default());
                Err(self.report(WorkspaceError::Load {
                    scope: "pages",
                    source,
                }))
            }
        }
    }

    /// Flips one page's expansion. No remote call.
    pub fn toggle_expansion(&self, page_id: &str) -> bool {
        let expanded = self
            .expansion
            .try_update(|e| e.toggle(page_id))
            .unwrap_or(false);
        self.reannotate();
        expanded
    }

    pub fn expand(&self, page_id: &str) {
        self.expansion.update(|e| e.expand(page_id));
        self.reannotate();
    }

    /// Expands every ancestor of `page_id` so its row is visible.
    pub fn reveal(&self, page_id: &str) {
        let ancestors = self.tree.with_untracked(|t| t.ancestors(page_id));
        if ancestors.is_empty() {
            return;
        }
        self.expansion.update(|e| {
            for id in &ancestors {
                e.expand(id);
            }
        });
        self.reannotate();
    }

    fn reannotate(&self) {
        let expansion = self.expansion.get_untracked();
        self.tree.update(|t| t.annotate(&expansion));
    }

    // ---- navigation ----

    fn transition(
        &self,
        f: impl FnOnce(&Navigation) -> (Navigation, Vec<NavEffect>),
    ) -> Vec<NavEffect> {
        let (next, effects) = self.navigation.with_untracked(f);
        self.navigation.set(next);
        effects
    }

    async fn run_effects(&self, effects: Vec<NavEffect>) -> Result<(), WorkspaceError> {
        for effect in effects {
            tracing::debug!(generation = effect.generation(), "navigation effect");
            match effect {
                NavEffect::LoadBlocks {
                    page_id,
                    generation,
                } => self.load_blocks(&page_id, generation).await?,
                NavEffect::ClearBlocks { generation } => {
                    self.blocks.update(|l| l.clear(generation));
                }
            }
        }
        Ok(())
    }

    async fn load_blocks(&self, page_id: &str, generation: u64) -> Result<(), WorkspaceError> {
        self.blocks.update(|l| l.begin_load(page_id, generation));

        match self.store().fetch_page_blocks(page_id).await {
            Ok(blocks) => {
                let count = blocks.len();
                let applied = self
                    .blocks
                    .try_update(|l| l.finish_load(generation, blocks))
                    .unwrap_or(false);
                if applied {
                    tracing::debug!(page_id, generation, count, "blocks loaded");
                } else {
                    tracing::debug!(page_id, generation, "discarding stale block load");
                }
                Ok(())
            }
            Err(source) => {
                let applied = self
                    .blocks
                    .try_update(|l| l.fail_load(generation))
                    .unwrap_or(false);
                if !applied {
                    tracing::debug!(page_id, generation, error = %source, "stale block load failed");
                    return Ok(());
                }
                tracing::warn!(page_id, error = %source, "failed to load blocks");
                Err(self.report(WorkspaceError::Load {
                    scope: "blocks",
                    source,
                }))
            }
        }
    }

    /// Opens `page` (or nothing). Every page selection funnels through here.
    pub async fn navigate(&self, page: Option<Page>) -> Result<(), WorkspaceError> {
        if let Some(p) = &page {
            tracing::info!(page_id = %p.id, "navigate");
        }
        let effects = self.transition(|nav| nav.select(page));
        self.run_effects(effects).await
    }

    /// Resolves `page_id` and opens it. On failure the current page stays open.
    pub async fn navigate_to_id(&self, page_id: &str) -> Result<(), WorkspaceError> {
        match self.store().fetch_page(page_id).await {
            Ok(page) => self.navigate(Some(page)).await,
            Err(source) => {
                tracing::warn!(page_id, error = %source, "failed to resolve page");
                Err(self.report(WorkspaceError::Load {
                    scope: "page",
                    source,
                }))
            }
        }
    }

    /// Reopens the page remembered from the last session. A page that is gone is forgotten
    /// quietly.
    pub async fn restore(&self, page_id: &str) -> Result<(), WorkspaceError> {
        match self.store().fetch_page(page_id).await {
            Ok(page) => {
                self.reveal(&page.id);
                self.navigate(Some(page)).await
            }
            Err(e) => {
                tracing::info!(page_id, error = %e, "last open page is unavailable");
                Ok(())
            }
        }
    }

    /// Click on a sub-page or page-link block.
    pub async fn follow_block(&self, block: &Block) -> Result<(), WorkspaceError> {
        match resolve_target(&self.store(), block).await {
            Ok(Some(page)) => self.navigate(Some(page)).await,
            Ok(None) => Ok(()),
            Err(source) => {
                tracing::warn!(block_id = %block.id, error = %source, "failed to open linked page");
                Err(self.report(WorkspaceError::Load {
                    scope: "linked page",
                    source,
                }))
            }
        }
    }

    pub async fn reload_blocks(&self) -> Result<(), WorkspaceError> {
        let effects = self.transition(Navigation::reload);
        self.run_effects(effects).await
    }

    // ---- pages ----

    fn required_title(title: &str) -> Result<String, WorkspaceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkspaceError::validation("Page title cannot be empty"));
        }
        Ok(title.to_string())
    }

    /// Creates a root page and opens it.
    pub async fn create_page(&self, title: &str) -> Result<Page, WorkspaceError> {
        let title = Self::required_title(title).map_err(|e| self.report(e))?;
        let page = self.store().create_page(&title, None).await.map_err(|source| {
            tracing::warn!(error = %source, "failed to create page");
            self.report(WorkspaceError::Mutation {
                command: "create page",
                source,
            })
        })?;
        tracing::info!(page_id = %page.id, "page created");

        let _ = self.load_pages().await;
        self.navigate(Some(page.clone())).await?;
        Ok(page)
    }

    /// Creates a child page of `parent_id`, appends a sub-page block for it to the parent and
    /// expands the parent.
    ///
    /// When the page is created but the block is not, the error carries the new page so the
    /// caller can offer to link it again; the tree is rebuilt either way so the page shows up.
    pub async fn create_nested_page(
        &self,
        parent_id: &str,
        title: &str,
    ) -> Result<Page, WorkspaceError> {
        let title = Self::required_title(title).map_err(|e| self.report(e))?;
        let page = self
            .store()
            .create_page(&title, Some(parent_id))
            .await
            .map_err(|source| {
                tracing::warn!(parent_id, error = %source, "failed to create nested page");
                self.report(WorkspaceError::Mutation {
                    command: "create nested page",
                    source,
                })
            })?;

        self.expand(parent_id);

        let link = CreateBlock::new(
            parent_id,
            BlockType::SubPage {
                page_id: page.id.clone(),
            },
            &page.title,
        );
        let linked = run_command(&self.store(), self.blocks, link).await;

        let _ = self.load_pages().await;

        match linked {
            Ok(_) => {
                tracing::info!(page_id = %page.id, parent_id, "nested page created");
                Ok(page)
            }
            Err(WorkspaceError::Mutation { source, .. }) => {
                tracing::error!(page_id = %page.id, parent_id, error = %source, "nested page left unlinked");
                Err(self.report(WorkspaceError::LinkBlockFailed { page, source }))
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Adds a link to `target_id` on `page_id`, after checking the target still exists.
    pub async fn create_page_link(
        &self,
        page_id: &str,
        target_id: &str,
        content: &str,
    ) -> Result<Option<Block>, WorkspaceError> {
        let exists = self
            .store()
            .validate_page_link(target_id)
            .await
            .map_err(|source| {
                self.report(WorkspaceError::Mutation {
                    command: "validate page link",
                    source,
                })
            })?;
        if !exists {
            return Err(self.report(WorkspaceError::validation(
                "The linked page no longer exists",
            )));
        }

        let content = match content.trim() {
            "" => self
                .tree
                .with_untracked(|t| t.find(target_id).map(|n| n.page.title.clone()))
                .unwrap_or_else(|| "Untitled".to_string()),
            c => c.to_string(),
        };
        let cmd = CreateBlock::new(
            page_id,
            BlockType::PageLink {
                page_id: target_id.to_string(),
            },
            &content,
        );
        run_command(&self.store(), self.blocks, cmd)
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn rename_page(&self, page_id: &str, title: &str) -> Result<Page, WorkspaceError> {
        let title = Self::required_title(title).map_err(|e| self.report(e))?;
        let page = self
            .store()
            .update_page_title(page_id, &title)
            .await
            .map_err(|source| {
                self.report(WorkspaceError::Mutation {
                    command: "rename page",
                    source,
                })
            })?;
        self.navigation.update(|n| *n = n.refresh_page(page.clone()));
        let _ = self.load_pages().await;
        Ok(page)
    }

    /// Deletes a page. Closes it (or any open descendant); reloads the open page when it is
    /// the parent or shows a link to the deleted page.
    pub async fn delete_page(&self, page_id: &str) -> Result<(), WorkspaceError> {
        let parent_id = self.tree.with_untracked(|t| {
            t.find(page_id)
                .and_then(|n| n.page.parent_id.clone())
                .or_else(|| t.ancestors(page_id).pop())
        });

        self.store().delete_page(page_id).await.map_err(|source| {
            tracing::warn!(page_id, error = %source, "failed to delete page");
            self.report(WorkspaceError::Mutation {
                command: "delete page",
                source,
            })
        })?;
        tracing::info!(page_id, "page deleted");

        let current = self.current_page_id();
        let links_deleted = self.blocks.with_untracked(|l| {
            l.blocks()
                .iter()
                .any(|b| b.block_type.linked_page_id() == Some(page_id))
        });
        let current_is_gone = current.as_deref().is_some_and(|cur| {
            cur == page_id
                || self
                    .tree
                    .with_untracked(|t| t.ancestors(cur).iter().any(|a| a == page_id))
        });

        self.expansion.update(|e| e.collapse(page_id));
        let _ = self.load_pages().await;

        if current_is_gone {
            self.navigate(None).await
        } else if links_deleted || (current.is_some() && current == parent_id) {
            self.reload_blocks().await
        } else {
            Ok(())
        }
    }

    /// Uploads an icon or cover image and returns the stored reference.
    pub async fn upload_page_asset(
        &self,
        page_id: &str,
        source_path: &str,
        kind: AssetKind,
    ) -> Result<String, WorkspaceError> {
        if source_path.trim().is_empty() {
            return Err(self.report(WorkspaceError::validation("Choose a file to upload")));
        }
        let reference = self
            .store()
            .upload_page_asset(page_id, source_path.trim(), kind)
            .await
            .map_err(|source| {
                self.report(WorkspaceError::Mutation {
                    command: "upload page asset",
                    source,
                })
            })?;
        tracing::info!(page_id, kind = %kind, reference = %reference, "asset uploaded");

        match self.store().fetch_page(page_id).await {
            Ok(page) => self.navigation.update(|n| *n = n.refresh_page(page)),
            Err(e) => tracing::warn!(page_id, error = %e, "failed to refresh page after upload"),
        }
        let _ = self.load_pages().await;
        Ok(reference)
    }

    // ---- blocks ----

    /// Appends a block to the open page.
    pub async fn create_block(
        &self,
        block_type: BlockType,
        content: &str,
    ) -> Result<Option<Block>, WorkspaceError> {
        let Some(page_id) = self.current_page_id() else {
            return Err(self.report(WorkspaceError::validation("Open a page first")));
        };
        let content = match block_type {
            BlockType::Divider => DIVIDER_CONTENT,
            _ => content,
        };
        if content.trim().is_empty() {
            return Err(self.report(WorkspaceError::validation("Block content cannot be empty")));
        }
        run_command(
            &self.store(),
            self.blocks,
            CreateBlock::new(&page_id, block_type, content),
        )
        .await
        .map_err(|e| self.report(e))
    }

    pub async fn delete_block(&self, block_id: &str) -> Result<(), WorkspaceError> {
        run_command(
            &self.store(),
            self.blocks,
            DeleteBlock::new(block_id),
        )
        .await
        .map(|_| ())
        .map_err(|e| self.report(e))
    }

    pub async fn update_block_content(
        &self,
        block_id: &str,
        content: &str,
    ) -> Result<(), WorkspaceError> {
        run_command(
            &self.store(),
            self.blocks,
            UpdateContent::new(block_id, content),
        )
        .await
        .map(|_| ())
        .map_err(|e| self.report(e))
    }

    /// Persists `next` as the open page's order. Returns `false` when nothing moved.
    pub async fn reorder(&self, next: Vec<Block>) -> Result<bool, WorkspaceError> {
        let current = self.blocks.with_untracked(|l| l.blocks().to_vec());
        let Some(cmd) = ReorderBlocks::new(&current, next) else {
            return Ok(false);
        };
        tracing::debug!(changed = cmd.changed().len(), "reordering blocks");
        run_command(&self.store(), self.blocks, cmd)
            .await
            .map(|applied| applied.is_some())
            .map_err(|e| self.report(e))
    }

    // ---- drag ----

    pub fn begin_drag(&self, block_id: &str) -> bool {
        self.drag.try_update(|d| d.start(block_id)).unwrap_or(false)
    }

    pub fn drag_pointer_moved(&self, x: f64, y: f64, rows: &[(BlockId, Rect)], end_zone: Option<Rect>) {
        if self.drag.with_untracked(|d| d.source().is_none()) {
            return;
        }
        self.drag.update(|d| d.pointer_moved(x, y, rows, end_zone));
    }

    pub fn cancel_drag(&self) {
        self.drag.update(DragState::cancel);
    }

    /// Drops the dragged block where the pointer is. Returns `true` when the order changed.
    pub async fn finish_drag(&self) -> Result<bool, WorkspaceError> {
        let Some((source, target)) = self.drag.try_update(DragState::release).flatten() else {
            return Ok(false);
        };
        let next = self
            .blocks
            .with_untracked(|l| move_block(l.blocks(), &source, &target));
        match next {
            Some(next) => self.reorder(next).await,
            None => {
                tracing::debug!(block_id = %source, "drop left order unchanged");
                Ok(false)
            }
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub Workspace<ApiClient>);
