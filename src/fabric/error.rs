use thiserror::Error;

/// Errors surfaced while assembling a topology. Construction either fully
/// succeeds or fails with one of these before any graph is handed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FabricError {
    /// Invalid or inconsistent structural parameters. User-correctable.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The builder produced a structurally invalid graph. Indicates a bug
    /// in the builder itself, not a user error.
    #[error("topology invariant violated: {0}")]
    InvariantViolation(String),
}

impl FabricError {
    pub fn config(msg: impl Into<String>) -> Self {
        FabricError::Configuration(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        FabricError::InvariantViolation(msg.into())
    }
}
