use crate::api::{ApiError, PageStore};
use crate::models::{Block, BlockId, BlockType, PageId};
use crate::state::command::BlockCommand;
use crate::util::{now, now_ms, random_u64};

/// Blocks of the one page currently open. Opening another page replaces everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct BlockList {
    page_id: Option<PageId>,
    blocks: Vec<Block>,
    generation: u64,
    loading: bool,
}

impl BlockList {
    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_showing(&self, page_id: &str) -> bool {
        self.page_id.as_deref() == Some(page_id)
    }

    pub fn get(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    pub fn position(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }

    /// Switches to `page_id` under load `generation`; the previous page's blocks are dropped.
    pub fn begin_load(&mut self, page_id: &str, generation: u64) {
        self.page_id = Some(page_id.to_string());
        self.blocks.clear();
        self.generation = generation;
        self.loading = true;
    }

    pub fn clear(&mut self, generation: u64) {
        self.page_id = None;
        self.blocks.clear();
        self.generation = generation;
        self.loading = false;
    }

    /// Installs a load result. Returns `false` (and changes nothing) for a stale generation.
    pub fn finish_load(&mut self, generation: u64, mut blocks: Vec<Block>) -> bool {
        if generation != self.generation {
            return false;
        }
        blocks.sort_by_key(|b| b.order);
        self.blocks = blocks;
        self.loading = false;
        true
    }

    /// A failed load leaves the page empty.
    pub fn fail_load(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.blocks.clear();
        self.loading = false;
        true
    }

    pub(crate) fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Inserts at `ix`, clamped to the end of the list.
    pub(crate) fn insert(&mut self, ix: usize, block: Block) {
        let ix = ix.min(self.blocks.len());
        self.blocks.insert(ix, block);
    }

    pub(crate) fn remove(&mut self, block_id: &str) -> Option<Block> {
        let ix = self.position(block_id)?;
        Some(self.blocks.remove(ix))
    }

    pub(crate) fn replace(&mut self, block_id: &str, block: Block) -> bool {
        match self.blocks.iter_mut().find(|b| b.id == block_id) {
            Some(slot) => {
                *slot = block;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_content(&mut self, block_id: &str, content: &str) -> bool {
        match self.blocks.iter_mut().find(|b| b.id == block_id) {
            Some(b) => {
                b.content = content.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_sequence(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }
}

pub(crate) fn is_tmp_block_id(id: &str) -> bool {
    id.starts_with("tmp-")
}

pub(crate) fn make_tmp_block_id(now_ms: i64, rand: u64) -> String {
    format!("tmp-{now_ms}-{rand}")
}

/// Appends a provisional block, swapped for the store's block once created.
pub(crate) struct CreateBlock {
    pub page_id: PageId,
    pub block_type: BlockType,
    pub content: String,
    pub tmp_id: BlockId,
}

impl CreateBlock {
    pub fn new(page_id: &str, block_type: BlockType, content: &str) -> Self {
        Self {
            page_id: page_id.to_string(),
            block_type,
            content: content.to_string(),
            tmp_id: make_tmp_block_id(now_ms(), random_u64()),
        }
    }

    fn provisional(&self, order: i32) -> Block {
        let ts = now();
        Block {
            id: self.tmp_id.clone(),
            page_id: self.page_id.clone(),
            block_type: self.block_type.clone(),
            content: self.content.clone(),
            parent_id: None,
            order,
            created_at: ts,
            updated_at: ts,
        }
    }
}

impl<S: PageStore> BlockCommand<S> for CreateBlock {
    type Output = Block;

    fn name(&self) -> &'static str {
        "create block"
    }

    fn apply(&mut self, list: &mut BlockList) -> bool {
        if list.is_showing(&self.page_id) {
            let order = list.blocks().last().map(|b| b.order + 1).unwrap_or(0);
            list.push(self.provisional(order));
        }
        true
    }

    async fn commit(&self, store: &S) -> Result<Block, ApiError> {
        store
            .create_block(&self.page_id, &self.block_type, &self.content, None)
            .await
    }

    fn settle(&self, list: &mut BlockList, created: &Block) {
        if list.replace(&self.tmp_id, created.clone()) {
            return;
        }
        if list.is_showing(&created.page_id) && list.get(&created.id).is_none() {
            list.push(created.clone());
        }
    }

    fn rollback(&self, list: &mut BlockList) {
        list.remove(&self.tmp_id);
    }
}

/// Removes a block; a failed delete puts it back where it was.
pub(crate) struct DeleteBlock {
    pub block_id: BlockId,
    removed: Option<(usize, Block)>,
}

impl DeleteBlock {
    pub fn new(block_id: &str) -> Self {
        Self {
            block_id: block_id.to_string(),
            removed: None,
        }
    }
}

impl<S: PageStore> BlockCommand<S> for DeleteBlock {
    type Output = ();

    fn name(&self) -> &'static str {
        "delete block"
    }

    fn apply(&mut self, list: &mut BlockList) -> bool {
        if is_tmp_block_id(&self.block_id) {
            return false;
        }
        let Some(ix) = list.position(&self.block_id) else {
            return false;
        };
        self.removed = list.remove(&self.block_id).map(|b| (ix, b));
        self.removed.is_some()
    }

    async fn commit(&self, store: &S) -> Result<(), ApiError> {
        store.delete_block(&self.block_id).await
    }

    fn rollback(&self, list: &mut BlockList) {
        if let Some((ix, block)) = &self.removed {
            if list.get(&block.id).is_none() {
                list.insert(*ix, block.clone());
            }
        }
    }
}

/// Edits a block's text. Unchanged content is a no-op.
pub(crate) struct UpdateContent {
    pub block_id: BlockId,
    pub content: String,
    previous: Option<String>,
}

impl UpdateContent {
    pub fn new(block_id: &str, content: &str) -> Self {
        Self {
            block_id: block_id.to_string(),
            content: content.to_string(),
            previous: None,
        }
    }
}

impl<S: PageStore> BlockCommand<S> for UpdateContent {
    type Output = Block;

    fn name(&self) -> &'static str {
        "update block"
    }

    fn apply(&mut self, list: &mut BlockList) -> bool {
        if is_tmp_block_id(&self.block_id) {
            return false;
        }
        match list.get(&self.block_id) {
            Some(b) if b.content != self.content => {
                self.previous = Some(b.content.clone());
                list.set_content(&self.block_id, &self.content)
            }
            _ => false,
        }
    }

    async fn commit(&self, store: &S) -> Result<Block, ApiError> {
        store.update_block_content(&self.block_id, &self.content).await
    }

    fn settle(&self, list: &mut BlockList, echo: &Block) {
        list.replace(&self.block_id, echo.clone());
    }

    /// Puts the old text back unless the block has been edited again since.
    fn rollback(&self, list: &mut BlockList) {
        let Some(previous) = &self.previous else {
            return;
        };
        if list.get(&self.block_id).is_some_and(|b| b.content == self.content) {
            list.set_content(&self.block_id, previous);
        }
    }
}
