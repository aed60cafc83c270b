use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook '{name}' failed: {reason}")]
    ExecutionFailed { name: String, reason: String },

    #[error("hook '{name}' timed out after {ms}ms")]
    Timeout { name: String, ms: u64 },
}

impl HookError {
    pub fn code(&self) -> &'static str {
        match self {
            HookError::ExecutionFailed { .. } => "HOOK_EXECUTION_FAILED",
            HookError::Timeout { .. } => "HOOK_TIMEOUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, HookError>;
