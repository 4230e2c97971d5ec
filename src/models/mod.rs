use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub(crate) type PageId = String;
pub(crate) type BlockId = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Page {
    pub id: PageId,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,

    /// `None` for root pages.
    #[serde(default)]
    pub parent_id: Option<PageId>,

    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed payload of a block.
///
/// Serialized adjacently tagged: `{"type": "Todo", "data": {"checked": true}}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub(crate) enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Todo { checked: bool },
    Code { language: String },
    Quote,
    Divider,
    SubPage { page_id: PageId },
    PageLink { page_id: PageId },
}

/// Payload-free tag of a [`BlockType`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
pub(crate) enum BlockKind {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Todo,
    Code,
    Quote,
    Divider,
    SubPage,
    PageLink,
}

impl BlockType {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockType::Text => BlockKind::Text,
            BlockType::Heading1 => BlockKind::Heading1,
            BlockType::Heading2 => BlockKind::Heading2,
            BlockType::Heading3 => BlockKind::Heading3,
            BlockType::BulletList => BlockKind::BulletList,
            BlockType::NumberedList => BlockKind::NumberedList,
            BlockType::Todo { .. } => BlockKind::Todo,
            BlockType::Code { .. } => BlockKind::Code,
            BlockType::Quote => BlockKind::Quote,
            BlockType::Divider => BlockKind::Divider,
            BlockType::SubPage { .. } => BlockKind::SubPage,
            BlockType::PageLink { .. } => BlockKind::PageLink,
        }
    }

    /// Target page of a SubPage/PageLink block.
    pub fn linked_page_id(&self) -> Option<&str> {
        match self {
            BlockType::SubPage { page_id } | BlockType::PageLink { page_id } => Some(page_id),
            _ => None,
        }
    }
}

impl BlockKind {
    /// Payload used when a block of this kind is created from the composer.
    ///
    /// Page references need a target id and have no default.
    pub fn default_type(self) -> Option<BlockType> {
        let t = match self {
            BlockKind::Text => BlockType::Text,
            BlockKind::Heading1 => BlockType::Heading1,
            BlockKind::Heading2 => BlockType::Heading2,
            BlockKind::Heading3 => BlockType::Heading3,
            BlockKind::BulletList => BlockType::BulletList,
            BlockKind::NumberedList => BlockType::NumberedList,
            BlockKind::Todo => BlockType::Todo { checked: false },
            BlockKind::Code => BlockType::Code {
                language: String::new(),
            },
            BlockKind::Quote => BlockType::Quote,
            BlockKind::Divider => BlockType::Divider,
            BlockKind::SubPage | BlockKind::PageLink => return None,
        };
        Some(t)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Block {
    pub id: BlockId,
    pub page_id: PageId,
    pub block_type: BlockType,
    pub content: String,

    /// Reserved for intra-page nesting. Never set or read by the workspace.
    #[serde(default)]
    pub parent_id: Option<BlockId>,

    /// Sort key within the page.
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Page plus its materialized children, as shown in the sidebar.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PageNode {
    pub page: Page,
    pub children: Vec<PageNode>,
    pub is_expanded: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum AssetKind {
    Icon,
    Cover,
}
