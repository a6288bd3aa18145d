use thiserror::Error;

/// Failure of an Entity Store Adapter operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] adscope_db::DbError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    /// The request itself is malformed; nothing has run yet.
    #[error("{0}")]
    Validation(String),

    #[error("unknown tool: '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArgument { tool: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("language model request failed: {0}")]
    Model(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
}

impl AgentError {
    pub(crate) fn invalid(tool: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            tool,
            reason: reason.into(),
        }
    }

    /// `true` for errors caused by the caller's input rather than by a
    /// collaborator or the store.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
