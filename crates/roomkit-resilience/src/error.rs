use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResilienceError<E: std::error::Error + 'static> {
    #[error("circuit breaker open")]
    CircuitOpen,

    #[error("retries exhausted: {0}")]
    RetriesExhausted(E),

    #[error(transparent)]
    Inner(E),
}

impl<E: std::error::Error + 'static> ResilienceError<E> {
    pub fn code(&self) -> &'static str {
        match self {
            ResilienceError::CircuitOpen => "CIRCUIT_OPEN",
            ResilienceError::RetriesExhausted(_) => "RETRIES_EXHAUSTED",
            ResilienceError::Inner(_) => "DELIVERY_FAILED",
        }
    }
}
