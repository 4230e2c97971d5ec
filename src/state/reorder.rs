//! Drag-to-reorder: the pointer state machine, the move itself and the persisted diff.

use crate::api::{ApiError, PageStore};
use crate::models::{Block, BlockId};
use crate::state::block_list::{is_tmp_block_id, BlockList};
use crate::state::command::BlockCommand;
use crate::state::error::WorkspaceError;
use futures::future::join_all;
use std::collections::HashMap;

/// Ids whose index differs between `old` and `new`, with their new index.
pub(crate) fn changed_positions(old: &[Block], new: &[Block]) -> Vec<(BlockId, usize)> {
    let before: HashMap<&str, usize> = old
        .iter()
        .enumerate()
        .map(|(ix, b)| (b.id.as_str(), ix))
        .collect();
    new.iter()
        .enumerate()
        .filter(|(ix, b)| before.get(b.id.as_str()) != Some(ix))
        .map(|(ix, b)| (b.id.clone(), ix))
        .collect()
}

fn same_ids(a: &[Block], b: &[Block]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut x: Vec<&str> = a.iter().map(|b| b.id.as_str()).collect();
    let mut y: Vec<&str> = b.iter().map(|b| b.id.as_str()).collect();
    x.sort_unstable();
    y.sort_unstable();
    x == y
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DropTarget {
    Block(BlockId),
    /// Past the last block.
    End,
}

/// Moves `source` onto `target` and returns the new sequence.
///
/// Dropping on a block takes that block's index; the end zone appends. `None` when nothing
/// would change: unknown ids, a drop onto itself, or a move that lands where it started.
pub(crate) fn move_block(seq: &[Block], source: &str, target: &DropTarget) -> Option<Vec<Block>> {
    if matches!(target, DropTarget::Block(id) if id == source) {
        return None;
    }
    let from = seq.iter().position(|b| b.id == source)?;
    let to = match target {
        DropTarget::Block(id) => seq.iter().position(|b| &b.id == id)?,
        DropTarget::End => seq.len() - 1,
    };
    if from == to {
        return None;
    }
    let mut next = seq.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Some(next)
}

/// Client rectangle of a rendered row, in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.top + self.height
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum DragState {
    #[default]
    Idle,
    Dragging { source: BlockId },
    Hovering { source: BlockId, over: DropTarget },
}

impl DragState {
    pub fn source(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { source } | DragState::Hovering { source, .. } => Some(source),
        }
    }

    pub fn hovered(&self) -> Option<&DropTarget> {
        match self {
            DragState::Hovering { over, .. } => Some(over),
            _ => None,
        }
    }

    /// Starts dragging `block_id`. Provisional blocks stay put.
    pub fn start(&mut self, block_id: &str) -> bool {
        if is_tmp_block_id(block_id) {
            return false;
        }
        *self = DragState::Dragging {
            source: block_id.to_string(),
        };
        true
    }

    /// Recomputes the hover target from scratch for the pointer at (`x`, `y`).
    ///
    /// Every row is tested, then the end zone; a pointer over nothing falls back to plain
    /// dragging.
    pub fn pointer_moved(&mut self, x: f64, y: f64, rows: &[(BlockId, Rect)], end_zone: Option<Rect>) {
        let Some(source) = self.source().map(str::to_string) else {
            return;
        };
        let over = rows
            .iter()
            .find(|(_, r)| r.contains(x, y))
            .map(|(id, _)| DropTarget::Block(id.clone()))
            .or_else(|| {
                end_zone
                    .filter(|r| r.contains(x, y))
                    .map(|_| DropTarget::End)
            });
        *self = match over {
            Some(over) => DragState::Hovering { source, over },
            None => DragState::Dragging { source },
        };
    }

    /// Ends the gesture. Returns the drop when the pointer was over a target.
    pub fn release(&mut self) -> Option<(BlockId, DropTarget)> {
        match std::mem::take(self) {
            DragState::Hovering { source, over } => Some((source, over)),
            DragState::Dragging { .. } | DragState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}

/// Persists a new block order: local first, then one call per moved block, all at once.
pub(crate) struct ReorderBlocks {
    next: Vec<Block>,
    changed: Vec<(BlockId, usize)>,
    before: Vec<(BlockId, i32)>,
}

impl ReorderBlocks {
    /// `None` unless `next` is a permutation of `current` that actually moves something.
    pub fn new(current: &[Block], next: Vec<Block>) -> Option<Self> {
        if !same_ids(current, &next) {
            return None;
        }
        let changed = changed_positions(current, &next);
        if changed.is_empty() {
            return None;
        }
        let next = next
            .into_iter()
            .enumerate()
            .map(|(ix, mut b)| {
                b.order = ix as i32;
                b
            })
            .collect();
        Some(Self {
            next,
            changed,
            before: Vec::new(),
        })
    }

    pub fn changed(&self) -> &[(BlockId, usize)] {
        &self.changed
    }
}

impl<S: PageStore> BlockCommand<S> for ReorderBlocks {
    type Output = ();

    fn name(&self) -> &'static str {
        "reorder blocks"
    }

    fn apply(&mut self, list: &mut BlockList) -> bool {
        // The list may have changed since the gesture was computed.
        if !same_ids(list.blocks(), &self.next) {
            return false;
        }
        self.before = list
            .blocks()
            .iter()
            .map(|b| (b.id.clone(), b.order))
            .collect();
        list.set_sequence(self.next.clone());
        true
    }

    async fn commit(&self, store: &S) -> Result<(), ApiError> {
        let results = join_all(
            self.changed
                .iter()
                .map(|(id, ix)| store.reorder_block(id, *ix as i32)),
        )
        .await;

        let mut first_err = None;
        for ((id, _), res) in self.changed.iter().zip(results) {
            if let Err(e) = res {
                tracing::warn!(block_id = %id, error = %e, "position update failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn error(&self, source: ApiError) -> WorkspaceError {
        WorkspaceError::Reorder { source }
    }

    /// Restores the previous order if the list still shows this move. Block contents are
    /// taken from the current list.
    fn rollback(&self, list: &mut BlockList) {
        let unchanged = list
            .blocks()
            .iter()
            .map(|b| b.id.as_str())
            .eq(self.next.iter().map(|b| b.id.as_str()));
        if !unchanged {
            tracing::debug!("block order changed again, keeping it");
            return;
        }
        let restored = self
            .before
            .iter()
            .filter_map(|(id, order)| {
                list.get(id).cloned().map(|mut b| {
                    b.order = *order;
                    b
                })
            })
            .collect();
        list.set_sequence(restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeStore;
    use crate::models::BlockType;
    use crate::state::command::run_command;
    use futures::executor::block_on;
    use leptos::prelude::*;

    fn seeded(n: usize) -> (FakeStore, RwSignal<BlockList>) {
        let store = FakeStore::new();
        for i in 0..n {
            store.add_block("p", BlockType::Text, &format!("b{i}"));
        }
        let mut list = BlockList::default();
        list.begin_load("p", 1);
        list.finish_load(1, store.stored_blocks("p"));
        (store, RwSignal::new(list))
    }

    fn ids(blocks: &[Block]) -> Vec<String> {
        blocks.iter().map(|b| b.content.clone()).collect()
    }

    fn current(list: RwSignal<BlockList>) -> Vec<Block> {
        list.with_untracked(|l| l.blocks().to_vec())
    }

    #[test]
    fn test_changed_set_counts_only_moved_ids() {
        let (_, list) = seeded(5);
        let s = current(list);
        let moved = move_block(&s, &s[1].id, &DropTarget::Block(s[3].id.clone())).expect("moved");
        assert_eq!(ids(&moved), vec!["b0", "b2", "b3", "b1", "b4"]);

        let changed = changed_positions(&s, &moved);
        let differing = s
            .iter()
            .enumerate()
            .filter(|(ix, b)| moved[*ix].id != b.id)
            .count();
        assert_eq!(changed.len(), differing);
        assert_eq!(changed.len(), 3);
    }

    fn permutations(items: Vec<Block>) -> Vec<Vec<Block>> {
        if items.len() <= 1 {
            return vec![items];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.clone();
            let head = rest.remove(i);
            for mut tail in permutations(rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_changed_set_matches_moved_ids_for_every_permutation() {
        for n in 0..=4 {
            let (_, list) = seeded(n);
            let s = current(list);
            let all = permutations(s.clone());
            assert_eq!(all.len(), (1..=n).product::<usize>());
            for p in all {
                let changed = changed_positions(&s, &p);
                let differing = s
                    .iter()
                    .enumerate()
                    .filter(|(ix, b)| p[*ix].id != b.id)
                    .count();
                assert_eq!(changed.len(), differing, "permutation {:?}", ids(&p));
                for (id, ix) in &changed {
                    assert_eq!(&p[*ix].id, id);
                }
                assert_eq!(ReorderBlocks::new(&s, p.clone()).is_some(), differing > 0);
            }
        }
    }

    #[test]
    fn test_drop_onto_block_takes_its_index_in_both_directions() {
        let (_, list) = seeded(4);
        let s = current(list);
        let up = move_block(&s, &s[3].id, &DropTarget::Block(s[1].id.clone())).expect("up");
        assert_eq!(ids(&up), vec!["b0", "b3", "b1", "b2"]);
        let end = move_block(&s, &s[0].id, &DropTarget::End).expect("end");
        assert_eq!(ids(&end), vec!["b1", "b2", "b3", "b0"]);
    }

    #[test]
    fn test_drop_onto_self_or_last_to_end_is_a_no_op() {
        let (store, list) = seeded(3);
        let s = current(list);
        assert!(move_block(&s, &s[1].id, &DropTarget::Block(s[1].id.clone())).is_none());
        assert!(move_block(&s, &s[2].id, &DropTarget::End).is_none());
        assert!(ReorderBlocks::new(&s, s.clone()).is_none());
        assert!(store.calls().is_empty());
        assert_eq!(current(list), s);
    }

    #[test]
    fn test_successful_reorder_persists_changed_positions() {
        let (store, list) = seeded(4);
        let s = current(list);
        let moved = move_block(&s, &s[0].id, &DropTarget::End).expect("moved");
        let cmd = ReorderBlocks::new(&s, moved).expect("changes");
        assert_eq!(cmd.changed().len(), 4);

        block_on(run_command(&store, list, cmd)).expect("reorder");
        assert_eq!(store.count("reorder_block"), 4);
        assert_eq!(ids(&store.stored_blocks("p")), vec!["b1", "b2", "b3", "b0"]);
        let orders: Vec<i32> = current(list).iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_any_failed_position_rolls_back_everything() {
        let (store, list) = seeded(4);
        let s = current(list);
        let moved = move_block(&s, &s[3].id, &DropTarget::Block(s[0].id.clone())).expect("moved");
        store.fail_reorder_of(&s[2].id);

        let res = block_on(run_command(&store, list, ReorderBlocks::new(&s, moved).expect("changes")));
        assert!(matches!(res, Err(WorkspaceError::Reorder { .. })));
        // Every changed id was still attempted.
        assert_eq!(store.count("reorder_block"), 4);
        assert_eq!(current(list), s);
    }

    #[test]
    fn test_hover_is_recomputed_per_row() {
        let rows = vec![
            ("a".to_string(), Rect { left: 0.0, top: 0.0, width: 100.0, height: 20.0 }),
            ("b".to_string(), Rect { left: 0.0, top: 20.0, width: 100.0, height: 20.0 }),
        ];
        let end = Some(Rect { left: 0.0, top: 40.0, width: 100.0, height: 30.0 });

        let mut drag = DragState::default();
        assert!(!drag.start("tmp-1-2"));
        assert_eq!(drag, DragState::Idle);
        assert!(drag.start("a"));

        drag.pointer_moved(10.0, 25.0, &rows, end);
        assert_eq!(drag.hovered(), Some(&DropTarget::Block("b".into())));
        drag.pointer_moved(10.0, 50.0, &rows, end);
        assert_eq!(drag.hovered(), Some(&DropTarget::End));
        drag.pointer_moved(300.0, 50.0, &rows, end);
        assert_eq!(drag, DragState::Dragging { source: "a".into() });

        drag.pointer_moved(10.0, 5.0, &rows, end);
        assert_eq!(drag.release(), Some(("a".to_string(), DropTarget::Block("a".into()))));
        assert_eq!(drag, DragState::Idle);

        drag.start("b");
        drag.cancel();
        assert_eq!(drag.release(), None);
    }
}
