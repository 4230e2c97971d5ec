use crate::models::{Page, PageId};

/// Work the caller must carry out after a navigation transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NavEffect {
    LoadBlocks { page_id: PageId, generation: u64 },
    ClearBlocks { generation: u64 },
}

impl NavEffect {
    pub fn generation(&self) -> u64 {
        match self {
            NavEffect::LoadBlocks { generation, .. } | NavEffect::ClearBlocks { generation } => {
                *generation
            }
        }
    }
}

/// The currently open page.
///
/// Transitions are pure: they return the next state and the effects to run. Each effect
/// carries a fresh generation, and the block list drops any load result tagged with an older
/// one, so the last selection always wins no matter which response lands first.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Navigation {
    current: Option<Page>,
    generation: u64,
}

impl Navigation {
    pub fn current(&self) -> Option<&Page> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.id.as_str())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Every page selection goes through here, including re-selecting the open page.
    pub fn select(&self, page: Option<Page>) -> (Navigation, Vec<NavEffect>) {
        let generation = self.generation + 1;
        let effect = match &page {
            Some(p) => NavEffect::LoadBlocks {
                page_id: p.id.clone(),
                generation,
            },
            None => NavEffect::ClearBlocks { generation },
        };
        (
            Navigation {
                current: page,
                generation,
            },
            vec![effect],
        )
    }

    /// Loads the open page's blocks again under a new generation.
    pub fn reload(&self) -> (Navigation, Vec<NavEffect>) {
        self.select(self.current.clone())
    }

    /// Swaps in fresh page metadata without touching the blocks.
    pub fn refresh_page(&self, page: Page) -> Navigation {
        if self.current_id() != Some(page.id.as_str()) {
            return self.clone();
        }
        Navigation {
            current: Some(page),
            generation: self.generation,
        }
    }
}
