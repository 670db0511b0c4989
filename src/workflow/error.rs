use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy of the workflow engine. The three front-line kinds
/// (validation, authorization, invalid transition) stay distinguishable to
/// callers; concurrency and collaborator failures get their own variants so
/// the caller decides whether to retry.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("invalid transition for {entity}: {from} -> {attempted}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        attempted: &'static str,
    },

    /// The entity changed under us: the status precondition no longer held
    /// when the write was applied. Nothing was modified.
    #[error("concurrent modification of {entity} {id}")]
    ConcurrentModification { entity: &'static str, id: i64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The persistence collaborator timed out or was unreachable. Entity
    /// state is unchanged; the engine never retries on its own.
    #[error("persistence collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WorkflowError::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        WorkflowError::Authorization(msg.into())
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: &'static str,
        attempted: &'static str,
    ) -> Self {
        WorkflowError::InvalidTransition { entity, from, attempted }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => WorkflowError::CollaboratorUnavailable(msg),
            StoreError::Backend(msg) => WorkflowError::Storage(msg),
        }
    }
}
