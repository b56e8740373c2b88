use std::time::Duration;

/// Typed failure kinds for provider calls.
///
/// Every adapter error is classified into one of these so callers can decide
/// between retry, fallback, and hard failure without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    Unconfigured(String),

    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    #[error("Provider authentication failed: {0}")]
    Auth(String),

    #[error("Provider rate limit hit")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Unexpected provider payload: {0}")]
    Data(String),

    #[error("Provider order creation failed: {0}")]
    Order(String),
}

impl ProviderError {
    /// Whether a caller may retry the same call and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Unreachable(_) | ProviderError::RateLimited { .. }
        )
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
