use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderValue, header};
use url::Url;

use crate::config::ConfigError;
use crate::services::auth::session::verifier::{SessionVerifier, VerifyError};

/// Path of the backend's session status endpoint.
pub const VERIFY_PATH: &str = "/auth/status";
/// Cookie the backend expects the session token in.
pub const SESSION_COOKIE: &str = "access_token";

/// Session verifier backed by the remote API (`GET {base}/auth/status`).
///
/// The token is forwarded as `Cookie: access_token=<value>` and caching is
/// disabled on the request so every decision reflects the backend's current state.
#[derive(Clone, Debug)]
pub struct HttpSessionVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSessionVerifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = endpoint_url(base_url)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            // 検証エンドポイントのリダイレクトには追従しない (3xx は失敗扱い)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|_| ConfigError::Invalid("API_BASE_URL"))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn endpoint_url(base_url: &str) -> Result<Url, ConfigError> {
    let mut base = Url::parse(base_url).map_err(|_| ConfigError::Invalid("API_BASE_URL"))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("API_BASE_URL"));
    }

    // `http://api/v1` + `auth/status` => `http://api/v1/auth/status`
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(VERIFY_PATH.trim_start_matches('/'))
        .map_err(|_| ConfigError::Invalid("API_BASE_URL"))
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn verify(&self, credential: &str) -> Result<(), VerifyError> {
        let cookie = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, credential))
            .map_err(|_| VerifyError::InvalidCredential)?;

        let resp = self
            .client
            .get(self.endpoint.clone())
            .header(header::COOKIE, cookie)
            .header(header::CACHE_CONTROL, "no-cache, no-store")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    VerifyError::Timeout
                } else {
                    VerifyError::Transport(err.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(VerifyError::Rejected(status.as_u16()))
        }
    }
}
