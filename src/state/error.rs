use crate::api::ApiError;
use crate::models::Page;

/// Failures surfaced to the presentation layer.
#[derive(Clone, Debug, thiserror::Error)]
pub(crate) enum WorkspaceError {
    /// A read failed; the affected view degraded to empty.
    #[error("Failed to load {scope}: {source}")]
    Load {
        scope: &'static str,
        #[source]
        source: ApiError,
    },

    /// A write failed; its local effect was rolled back.
    #[error("Failed to {command}: {source}")]
    Mutation {
        command: &'static str,
        #[source]
        source: ApiError,
    },

    /// At least one position update failed; the previous order was restored.
    #[error("Failed to reorder blocks, previous order restored: {source}")]
    Reorder {
        #[source]
        source: ApiError,
    },

    #[error("{0}")]
    Validation(String),

    /// Nested page creation stopped halfway: the page exists but its parent has no link to it.
    #[error("Page \"{}\" was created but could not be linked from its parent: {source}", page.title)]
    LinkBlockFailed {
        page: Page,
        #[source]
        source: ApiError,
    },
}

impl WorkspaceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
