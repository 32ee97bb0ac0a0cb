//! Factory: build the page `Gateway` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::services::auth::gateway::{Gateway, GatewayPolicy};
use crate::services::auth::session::{HttpSessionVerifier, SessionVerifier};

pub fn build_gateway(config: &Config) -> Result<Arc<Gateway>, ConfigError> {
    let policy = GatewayPolicy {
        enabled: config.auth_enabled,
        verify_timeout: config.session_verify_timeout,
        ..GatewayPolicy::default()
    };

    // 無効時は検証先が無くてもよい (どうせ呼ばれない)
    let verifier: Option<Arc<dyn SessionVerifier>> = match config.api_base_url.as_deref() {
        Some(base_url) => {
            let verifier = HttpSessionVerifier::new(base_url, config.session_verify_timeout)?;
            tracing::debug!(endpoint = %verifier.endpoint(), "session verifier configured");
            let verifier: Arc<dyn SessionVerifier> = Arc::new(verifier);
            Some(verifier)
        }
        None => None,
    };

    Ok(Arc::new(Gateway::new(policy, verifier)))
}
