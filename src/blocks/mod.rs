//! Block type dispatch: how each block kind displays and what a click on it does.
//!
//! Every dispatch is an exhaustive `match` over [`BlockType`], so a new variant fails to
//! compile until display, editability and click handling all cover it.

use crate::api::{ApiResult, PageStore};
use crate::models::{Block, BlockKind, BlockType, Page, PageId};
use strum::IntoEnumIterator;

/// Visual element a block renders as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum BlockElement {
    Paragraph,
    Heading(u8),
    ListItem { ordinal: Option<usize> },
    Todo { checked: bool },
    Code { language: Option<String> },
    Quote,
    Divider,
    PageRef { page_id: PageId, embedded: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlockDisplay {
    pub element: BlockElement,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum BlockClick {
    Edit,
    Navigate(PageId),
    Ignore,
}

/// Keeps an empty row clickable.
const EMPTY_TEXT: &str = "\u{00A0}";

pub(crate) fn is_editable(block_type: &BlockType) -> bool {
    match block_type {
        BlockType::SubPage { .. } | BlockType::PageLink { .. } | BlockType::Divider => false,
        BlockType::Text
        | BlockType::Heading1
        | BlockType::Heading2
        | BlockType::Heading3
        | BlockType::BulletList
        | BlockType::NumberedList
        | BlockType::Todo { .. }
        | BlockType::Code { .. }
        | BlockType::Quote => true,
    }
}

pub(crate) fn on_click(block: &Block) -> BlockClick {
    match &block.block_type {
        BlockType::SubPage { page_id } | BlockType::PageLink { page_id } => {
            BlockClick::Navigate(page_id.clone())
        }
        BlockType::Divider => BlockClick::Ignore,
        BlockType::Text
        | BlockType::Heading1
        | BlockType::Heading2
        | BlockType::Heading3
        | BlockType::BulletList
        | BlockType::NumberedList
        | BlockType::Todo { .. }
        | BlockType::Code { .. }
        | BlockType::Quote => BlockClick::Edit,
    }
}

fn display_text(content: &str) -> String {
    if content.trim().is_empty() {
        EMPTY_TEXT.to_string()
    } else {
        content.to_string()
    }
}

/// Display transform for a single block. `ordinal` is only used by numbered list items.
pub(crate) fn display(block: &Block, ordinal: Option<usize>) -> BlockDisplay {
    let element = match &block.block_type {
        BlockType::Text => BlockElement::Paragraph,
        BlockType::Heading1 => BlockElement::Heading(1),
        BlockType::Heading2 => BlockElement::Heading(2),
        BlockType::Heading3 => BlockElement::Heading(3),
        BlockType::BulletList => BlockElement::ListItem { ordinal: None },
        BlockType::NumberedList => BlockElement::ListItem {
            ordinal: Some(ordinal.unwrap_or(1)),
        },
        BlockType::Todo { checked } => BlockElement::Todo { checked: *checked },
        BlockType::Code { language } => BlockElement::Code {
            language: Some(language.trim().to_string()).filter(|l| !l.is_empty()),
        },
        BlockType::Quote => BlockElement::Quote,
        BlockType::Divider => {
            return BlockDisplay {
                element: BlockElement::Divider,
                text: String::new(),
            }
        }
        BlockType::SubPage { page_id } => BlockElement::PageRef {
            page_id: page_id.clone(),
            embedded: true,
        },
        BlockType::PageLink { page_id } => BlockElement::PageRef {
            page_id: page_id.clone(),
            embedded: false,
        },
    };

    BlockDisplay {
        element,
        text: display_text(&block.content),
    }
}

/// Displays a whole page; numbered list ordinals restart after any other block kind.
pub(crate) fn display_all(blocks: &[Block]) -> Vec<BlockDisplay> {
    let mut run = 0usize;
    blocks
        .iter()
        .map(|b| {
            if b.block_type.kind() == BlockKind::NumberedList {
                run += 1;
                display(b, Some(run))
            } else {
                run = 0;
                display(b, None)
            }
        })
        .collect()
}

/// Resolves the target of a page reference block into a full page.
///
/// Returns `Ok(None)` for blocks that do not navigate.
pub(crate) async fn resolve_target<S: PageStore>(
    store: &S,
    block: &Block,
) -> ApiResult<Option<Page>> {
    match on_click(block) {
        BlockClick::Navigate(page_id) => store.fetch_page(&page_id).await.map(Some),
        BlockClick::Edit | BlockClick::Ignore => Ok(None),
    }
}

pub(crate) fn label(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Text => "Text",
        BlockKind::Heading1 => "Heading 1",
        BlockKind::Heading2 => "Heading 2",
        BlockKind::Heading3 => "Heading 3",
        BlockKind::BulletList => "Bulleted list",
        BlockKind::NumberedList => "Numbered list",
        BlockKind::Todo => "To-do",
        BlockKind::Code => "Code",
        BlockKind::Quote => "Quote",
        BlockKind::Divider => "Divider",
        BlockKind::SubPage => "Page",
        BlockKind::PageLink => "Link to page",
    }
}

/// Kinds offered by the block composer, in menu order.
pub(crate) fn composer_kinds() -> Vec<BlockKind> {
    BlockKind::iter()
        .filter(|k| k.default_type().is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeStore;
    use chrono::DateTime;
    use futures::executor::block_on;

    fn block(id: &str, block_type: BlockType, content: &str) -> Block {
        Block {
            id: id.to_string(),
            page_id: "p".to_string(),
            block_type,
            content: content.to_string(),
            parent_id: None,
            order: 0,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
            updated_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_page_references_and_divider_are_not_editable() {
        let mut types: Vec<BlockType> = composer_kinds()
            .into_iter()
            .filter_map(|k| k.default_type())
            .collect();
        types.push(BlockType::SubPage { page_id: "x".into() });
        types.push(BlockType::PageLink { page_id: "x".into() });

        for t in types {
            let expect = !matches!(
                t.kind(),
                BlockKind::SubPage | BlockKind::PageLink | BlockKind::Divider
            );
            assert_eq!(is_editable(&t), expect, "{}", t.kind());
        }
    }

    #[test]
    fn test_click_never_edits_non_editable_blocks() {
        let sub = block("a", BlockType::SubPage { page_id: "p2".into() }, "Child");
        let link = block("b", BlockType::PageLink { page_id: "p3".into() }, "Ref");
        let div = block("c", BlockType::Divider, "");
        let text = block("d", BlockType::Text, "hi");

        assert_eq!(on_click(&sub), BlockClick::Navigate("p2".to_string()));
        assert_eq!(on_click(&link), BlockClick::Navigate("p3".to_string()));
        assert_eq!(on_click(&div), BlockClick::Ignore);
        assert_eq!(on_click(&text), BlockClick::Edit);
    }

    #[test]
    fn test_numbered_list_ordinals_restart_after_other_kinds() {
        let blocks = vec![
            block("1", BlockType::NumberedList, "a"),
            block("2", BlockType::NumberedList, "b"),
            block("3", BlockType::Text, "break"),
            block("4", BlockType::NumberedList, "c"),
        ];
        let shown = display_all(&blocks);
        assert_eq!(shown[0].element, BlockElement::ListItem { ordinal: Some(1) });
        assert_eq!(shown[1].element, BlockElement::ListItem { ordinal: Some(2) });
        assert_eq!(shown[3].element, BlockElement::ListItem { ordinal: Some(1) });
    }

    #[test]
    fn test_display_keeps_empty_rows_clickable_and_divider_blank() {
        let empty = display(&block("1", BlockType::Quote, "   "), None);
        assert_eq!(empty.text, "\u{00A0}");

        let div = display(&block("2", BlockType::Divider, "ignored"), None);
        assert_eq!(div.element, BlockElement::Divider);
        assert!(div.text.is_empty());

        let code = display(
            &block("3", BlockType::Code { language: " ".into() }, "x"),
            None,
        );
        assert_eq!(code.element, BlockElement::Code { language: None });
    }

    #[test]
    fn test_resolve_target_fetches_referenced_page() {
        let store = FakeStore::new();
        let target = store.add_page("Target", None);
        let b = block("1", BlockType::PageLink { page_id: target.id.clone() }, "go");

        let resolved = block_on(resolve_target(&store, &b)).expect("should resolve");
        assert_eq!(resolved.map(|p| p.title), Some("Target".to_string()));

        let plain = block("2", BlockType::Text, "x");
        assert!(block_on(resolve_target(&store, &plain))
            .expect("no call")
            .is_none());
        assert_eq!(store.count("get_page"), 1);
    }

    #[test]
    fn test_composer_excludes_page_references() {
        let kinds = composer_kinds();
        assert!(!kinds.contains(&BlockKind::SubPage));
        assert!(!kinds.contains(&BlockKind::PageLink));
        assert_eq!(kinds.first(), Some(&BlockKind::Text));
    }
}
