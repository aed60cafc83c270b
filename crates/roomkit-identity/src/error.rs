use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("resolver backend error: {0}")]
    Backend(String),
}

impl IdentityError {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::Backend(_) => "IDENTITY_BACKEND_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
