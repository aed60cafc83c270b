use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("content cannot be expressed for the target's declared capabilities")]
    NotTranscodable,
}

impl TranscodeError {
    pub fn code(&self) -> &'static str {
        "TRANSCODING_FAILED"
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
