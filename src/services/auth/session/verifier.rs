use async_trait::async_trait;
use thiserror::Error;

/// Why a credential could not be confirmed as trusted.
///
/// Callers never surface this to the visitor: every variant is folded into
/// "untrusted" by the gateway (fail-closed).
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("session verification rejected with status {0}")]
    Rejected(u16),
    #[error("session verification timed out")]
    Timeout,
    #[error("session verification transport error: {0}")]
    Transport(String),
    #[error("credential is not a valid header value")]
    InvalidCredential,
}

/// Remote "is this session still valid?" check.
///
/// - `Ok(())`  => the backend answered with a success status
/// - `Err(_)`  => anything else (caller must treat as untrusted)
///
/// Implementations issue at most one request per call and never retry.
#[async_trait]
pub trait SessionVerifier: Send + Sync + 'static {
    // For logging only.
    fn backend_name(&self) -> &'static str;

    async fn verify(&self, credential: &str) -> Result<(), VerifyError>;
}
