#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A write was based on a version other than the stored one.
    #[error("{entity} {id} is at version {current}, but the update was based on version {expected}")]
    VersionConflict {
        entity: &'static str,
        id: String,
        current: i64,
        expected: i64,
    },

    /// A conflict reported by a remote service, without version details.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl CoreError {
    /// Whether this error means the caller's copy is out of date.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::VersionConflict { .. } | CoreError::Conflict(_)
        )
    }
}
