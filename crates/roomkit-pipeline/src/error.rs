use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] roomkit_store::StoreError),

    #[error("routing error: {0}")]
    Routing(#[from] roomkit_router::RouterError),

    #[error("channel error: {0}")]
    Channel(#[from] roomkit_channel::ChannelError),

    #[error("the room's exclusive section could not be held within process_timeout")]
    ProcessTimeout,

    #[error("cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Store(_) => "STORE_ERROR",
            PipelineError::Routing(e) => e.code(),
            PipelineError::Channel(e) => e.code(),
            PipelineError::ProcessTimeout => "PROCESS_TIMEOUT",
            PipelineError::Cancelled => "CANCELLED",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
