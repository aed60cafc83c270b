use thiserror::Error;

/// Errors shared across crate boundaries that don't belong to a single
/// subsystem (config loading, id parsing). Subsystem-specific errors live in
/// their own crates (`StoreError`, `HookError`, `PipelineError`, ...) and each
/// exposes a `code()` the same way this one does.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid id: {0}")]
    InvalidId(String),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::InvalidId(_) => "INVALID_ID",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
