//! Optimistic block-list mutations.
//!
//! A command changes the local list first, then calls the store. On failure the command undoes
//! only its own change, so loads and other commands that landed in the meantime survive. A list
//! that has since been replaced by another page load is left alone.

use crate::api::{ApiError, PageStore};
use crate::state::block_list::BlockList;
use crate::state::error::WorkspaceError;
use leptos::prelude::*;

pub(crate) trait BlockCommand<S: PageStore> {
    type Output;

    fn name(&self) -> &'static str;

    /// Local change. Returning `false` means there is nothing to do: the list must be left
    /// untouched and the store is not called. Whatever `rollback` needs is recorded here.
    fn apply(&mut self, list: &mut BlockList) -> bool;

    async fn commit(&self, store: &S) -> Result<Self::Output, ApiError>;

    /// Folds the store's answer into the list.
    fn settle(&self, _list: &mut BlockList, _output: &Self::Output) {}

    /// Reverts this command's local change, leaving everything else in `list` as it is now.
    fn rollback(&self, list: &mut BlockList);

    fn error(&self, source: ApiError) -> WorkspaceError {
        WorkspaceError::Mutation {
            command: self.name(),
            source,
        }
    }
}

/// Runs `cmd` against `list`. `Ok(None)` means the command had nothing to do.
pub(crate) async fn run_command<S, C>(
    store: &S,
    list: RwSignal<BlockList>,
    mut cmd: C,
) -> Result<Option<C::Output>, WorkspaceError>
where
    S: PageStore,
    C: BlockCommand<S>,
{
    let generation = list.with_untracked(|l| l.generation());

    let mut proceed = false;
    list.update(|l| proceed = cmd.apply(l));
    if !proceed {
        tracing::debug!(command = cmd.name(), "nothing to do");
        return Ok(None);
    }

    match cmd.commit(store).await {
        Ok(output) => {
            list.update(|l| {
                if l.generation() == generation {
                    cmd.settle(l, &output);
                } else {
                    tracing::debug!(command = cmd.name(), "page switched before commit settled");
                }
            });
            Ok(Some(output))
        }
        Err(e) => {
            tracing::warn!(command = cmd.name(), error = %e, "command failed, rolling back");
            list.update(|l| {
                if l.generation() == generation {
                    cmd.rollback(l);
                } else {
                    tracing::debug!(command = cmd.name(), "page switched before rollback");
                }
            });
            Err(cmd.error(e))
        }
    }
}
