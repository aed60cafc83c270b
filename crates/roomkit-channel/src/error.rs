use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("auth failed: {0}")]
    AuthFailed(String),

    #[error("timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("config error: {0}")]
    ConfigError(String),
}

impl ChannelError {
    pub fn code(&self) -> &'static str {
        match self {
            ChannelError::ConnectionFailed(_) => "CHANNEL_CONNECTION_FAILED",
            ChannelError::SendFailed(_) => "CHANNEL_SEND_FAILED",
            ChannelError::AuthFailed(_) => "CHANNEL_AUTH_FAILED",
            ChannelError::Timeout { .. } => "CHANNEL_TIMEOUT",
            ChannelError::ConfigError(_) => "CHANNEL_CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
