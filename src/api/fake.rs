//! In-memory [`PageStore`] for tests.
//!
//! Records every call by command name, fails selected commands on demand and can hold
//! block fetches or block mutations until the test releases them.

use super::{ApiError, ApiErrorKind, ApiResult, PageStore};
use crate::models::{AssetKind, Block, BlockType, Page};
use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

#[derive(Default)]
struct FakeState {
    pages: Vec<Page>,
    blocks: Vec<Block>,
    next_id: u64,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    failing_children_of: HashSet<String>,
    failing_reorder_of: HashSet<String>,
    extra_children: HashMap<String, Vec<String>>,
    block_gates: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
    command_gates: HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeStore {
    inner: Rc<RefCell<FakeState>>,
}

fn ts() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

fn injected(command: &str) -> ApiError {
    ApiError {
        kind: ApiErrorKind::Http,
        message: format!("injected failure: {command}"),
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut s = self.inner.borrow_mut();
        s.next_id += 1;
        format!("{prefix}{}", s.next_id)
    }

    pub fn add_page(&self, title: &str, parent_id: Option<&str>) -> Page {
        let page = Page {
            id: self.next_id("page-"),
            title: title.to_string(),
            icon: None,
            cover: None,
            parent_id: parent_id.map(str::to_string),
            is_archived: false,
            created_at: ts(),
            updated_at: ts(),
        };
        self.inner.borrow_mut().pages.push(page.clone());
        page
    }

    pub fn archive_page(&self, page_id: &str) {
        if let Some(p) = self
            .inner
            .borrow_mut()
            .pages
            .iter_mut()
            .find(|p| p.id == page_id)
        {
            p.is_archived = true;
        }
    }

    /// Makes `get_child_pages(parent_id)` also list an existing page, to build cycles.
    pub fn link_child(&self, parent_id: &str, page_id: &str) {
        self.inner
            .borrow_mut()
            .extra_children
            .entry(parent_id.to_string())
            .or_default()
            .push(page_id.to_string());
    }

    pub fn add_block(&self, page_id: &str, block_type: BlockType, content: &str) -> Block {
        let id = self.next_id("block-");
        let mut s = self.inner.borrow_mut();
        let order = next_order(&s.blocks, page_id);
        let block = Block {
            id,
            page_id: page_id.to_string(),
            block_type,
            content: content.to_string(),
            parent_id: None,
            order,
            created_at: ts(),
            updated_at: ts(),
        };
        s.blocks.push(block.clone());
        block
    }

    pub fn fail(&self, command: &'static str) {
        self.inner.borrow_mut().failing.insert(command);
    }

    pub fn heal(&self, command: &'static str) {
        self.inner.borrow_mut().failing.remove(command);
    }

    pub fn fail_children_of(&self, parent_id: &str) {
        self.inner
            .borrow_mut()
            .failing_children_of
            .insert(parent_id.to_string());
    }

    pub fn fail_reorder_of(&self, block_id: &str) {
        self.inner
            .borrow_mut()
            .failing_reorder_of
            .insert(block_id.to_string());
    }

    /// Holds the next `get_page_blocks` for `page_id` until the returned sender fires.
    pub fn gate_blocks(&self, page_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .borrow_mut()
            .block_gates
            .entry(page_id.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    /// Holds the next call of `command` until the returned sender fires. A failing command
    /// reports its failure only once released.
    pub fn gate(&self, command: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .borrow_mut()
            .command_gates
            .entry(command)
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn stored_blocks(&self, page_id: &str) -> Vec<Block> {
        let mut out: Vec<Block> = self
            .inner
            .borrow()
            .blocks
            .iter()
            .filter(|b| b.page_id == page_id)
            .cloned()
            .collect();
        out.sort_by_key(|b| b.order);
        out
    }

    fn enter(&self, command: &'static str) -> ApiResult<()> {
        let mut s = self.inner.borrow_mut();
        s.calls.push(command.to_string());
        if s.failing.contains(command) {
            Err(injected(command))
        } else {
            Ok(())
        }
    }

    /// Like `enter`, but waits on a gate registered for `command` first.
    async fn enter_gated(&self, command: &'static str) -> ApiResult<()> {
        let entered = self.enter(command);
        let gate = self
            .inner
            .borrow_mut()
            .command_gates
            .get_mut(command)
            .and_then(|q| q.pop_front());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        entered
    }
}

fn next_order(blocks: &[Block], page_id: &str) -> i32 {
    blocks
        .iter()
        .filter(|b| b.page_id == page_id)
        .map(|b| b.order)
        .max()
        .unwrap_or(-1)
        + 1
}

impl PageStore for FakeStore {
    async fn fetch_root_pages(&self) -> ApiResult<Vec<Page>> {
        self.enter("get_root_pages")?;
        Ok(self
            .inner
            .borrow()
            .pages
            .iter()
            .filter(|p| p.parent_id.is_none())
            .cloned()
            .collect())
    }

    async fn fetch_children(&self, parent_id: &str) -> ApiResult<Vec<Page>> {
        self.enter("get_child_pages")?;
        if self.inner.borrow().failing_children_of.contains(parent_id) {
            return Err(injected("get_child_pages"));
        }
        let s = self.inner.borrow();
        let extra = s.extra_children.get(parent_id).cloned().unwrap_or_default();
        Ok(s.pages
            .iter()
            .filter(|p| p.parent_id.as_deref() == Some(parent_id) || extra.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn fetch_page(&self, page_id: &str) -> ApiResult<Page> {
        self.enter("get_page")?;
        self.inner
            .borrow()
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(page_id))
    }

    async fn create_page(&self, title: &str, parent_id: Option<&str>) -> ApiResult<Page> {
        self.enter(if parent_id.is_some() {
            "create_nested_page"
        } else {
            "create_page"
        })?;
        Ok(self.add_page(title, parent_id))
    }

    async fn update_page_title(&self, page_id: &str, title: &str) -> ApiResult<Page> {
        self.enter("update_page_title")?;
        let mut s = self.inner.borrow_mut();
        let page = s
            .pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| ApiError::not_found(page_id))?;
        page.title = title.to_string();
        Ok(page.clone())
    }

    async fn delete_page(&self, page_id: &str) -> ApiResult<()> {
        self.enter("delete_page")?;
        let mut s = self.inner.borrow_mut();
        s.pages.retain(|p| p.id != page_id);
        s.blocks.retain(|b| b.page_id != page_id);
        Ok(())
    }

    async fn validate_page_link(&self, page_id: &str) -> ApiResult<bool> {
        self.enter("validate_page_link")?;
        Ok(self.inner.borrow().pages.iter().any(|p| p.id == page_id))
    }

    async fn upload_page_asset(
        &self,
        page_id: &str,
        source_path: &str,
        asset_type: AssetKind,
    ) -> ApiResult<String> {
        self.enter("upload_page_asset")?;
        let file = source_path.rsplit('/').next().unwrap_or(source_path).to_string();
        let mut s = self.inner.borrow_mut();
        let page = s
            .pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| ApiError::not_found(page_id))?;
        match asset_type {
            AssetKind::Icon => page.icon = Some(file.clone()),
            AssetKind::Cover => page.cover = Some(file.clone()),
        }
        Ok(file)
    }

    async fn fetch_page_blocks(&self, page_id: &str) -> ApiResult<Vec<Block>> {
        self.enter("get_page_blocks")?;
        let gate = self
            .inner
            .borrow_mut()
            .block_gates
            .get_mut(page_id)
            .and_then(|q| q.pop_front());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        // Unsorted on purpose: callers must sort by order.
        let mut out = self.stored_blocks(page_id);
        out.reverse();
        Ok(out)
    }

    async fn create_block(
        &self,
        page_id: &str,
        block_type: &BlockType,
        content: &str,
        _parent_id: Option<&str>,
    ) -> ApiResult<Block> {
        self.enter_gated("create_block").await?;
        Ok(self.add_block(page_id, block_type.clone(), content))
    }

    async fn delete_block(&self, block_id: &str) -> ApiResult<()> {
        self.enter_gated("delete_block").await?;
        self.inner.borrow_mut().blocks.retain(|b| b.id != block_id);
        Ok(())
    }

    async fn update_block_content(&self, block_id: &str, content: &str) -> ApiResult<Block> {
        self.enter_gated("update_block_content").await?;
        let mut s = self.inner.borrow_mut();
        let block = s
            .blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or_else(|| ApiError::not_found(block_id))?;
        block.content = content.to_string();
        block.updated_at = ts() + chrono::Duration::seconds(1);
        Ok(block.clone())
    }

    async fn reorder_block(&self, block_id: &str, new_order: i32) -> ApiResult<Block> {
        self.enter_gated("reorder_block").await?;
        if self.inner.borrow().failing_reorder_of.contains(block_id) {
            return Err(injected("reorder_block"));
        }
        let mut s = self.inner.borrow_mut();
        let block = s
            .blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or_else(|| ApiError::not_found(block_id))?;
        block.order = new_order;
        Ok(block.clone())
    }
}
