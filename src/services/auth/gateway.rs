//! Page authorization gateway - decision logic.
//!
//! Runs once per page request, before rendering:
//! 1. classify the path (`Protected` / `AuthOnly` / `Public`)
//! 2. for gated paths only, ask the session backend whether the credential is trusted
//! 3. return `Continue` or a `Redirect`
//!
//! This module does not know about axum middleware; `middleware::auth::gateway`
//! feeds it the path, query and cookie and turns the `Decision` into a response.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::services::auth::path_policy::{PathClass, PathPolicy};
use crate::services::auth::return_to::{self, RETURN_TO_PARAM};
use crate::services::auth::session::http::SESSION_COOKIE;
use crate::services::auth::session::{SessionVerifier, VerifyError};

/// Policy knobs for the gateway.
///
/// Kept separate from `Config` so the decision logic can be tested with
/// substituted prefix lists and kill switch.
#[derive(Debug, Clone)]
pub struct GatewayPolicy {
    // false => 全リクエストを素通し (検証 API も呼ばない)
    pub enabled: bool,
    pub paths: PathPolicy,
    pub login_path: String,
    // return-to が無い/不正なときのログイン後の遷移先
    pub default_landing_path: String,
    pub return_to_param: String,
    pub session_cookie: String,
    pub verify_timeout: Duration,
}

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/mypage";

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            paths: PathPolicy::default(),
            login_path: LOGIN_PATH.to_string(),
            default_landing_path: DEFAULT_LANDING_PATH.to_string(),
            return_to_param: RETURN_TO_PARAM.to_string(),
            session_cookie: SESSION_COOKIE.to_string(),
            verify_timeout: Duration::from_secs(5),
        }
    }
}

/// Verification outcome. There is no error state: failures are `Untrusted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    Trusted,
    Untrusted,
}

/// Where to send the visitor instead of rendering the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub path: String,
    // Protected + untrusted のときだけ Some (元のパスを login に持ち回る)
    pub return_to: Option<String>,
}

impl RedirectTarget {
    /// Value for the `Location` header.
    pub fn location(&self, param: &str) -> String {
        match &self.return_to {
            Some(original) => return_to::login_location(&self.path, param, original),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect(RedirectTarget),
}

/// Per-request input, borrowed from the inbound request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub credential: Option<&'a str>,
}

pub struct Gateway {
    policy: GatewayPolicy,
    // None は「検証先が無い」= 常に Untrusted
    verifier: Option<Arc<dyn SessionVerifier>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("policy", &self.policy)
            .field(
                "verifier",
                &self.verifier.as_ref().map(|v| v.backend_name()),
            )
            .finish()
    }
}

impl Gateway {
    pub fn new(policy: GatewayPolicy, verifier: Option<Arc<dyn SessionVerifier>>) -> Self {
        Self { policy, verifier }
    }

    pub fn policy(&self) -> &GatewayPolicy {
        &self.policy
    }

    pub async fn decide(&self, ctx: RequestContext<'_>) -> Decision {
        if !self.policy.enabled {
            return Decision::Continue;
        }

        let class = self.policy.paths.classify(ctx.path);

        let decision = match class {
            PathClass::Public => Decision::Continue,
            PathClass::Protected => match self.trust(ctx.credential).await {
                Trust::Trusted => Decision::Continue,
                Trust::Untrusted => Decision::Redirect(RedirectTarget {
                    path: self.policy.login_path.clone(),
                    return_to: Some(ctx.path.to_string()),
                }),
            },
            PathClass::AuthOnly => {
                // 未ログインならそもそも検証しない
                if ctx.credential.is_none() {
                    Decision::Continue
                } else {
                    match self.trust(ctx.credential).await {
                        Trust::Untrusted => Decision::Continue,
                        Trust::Trusted => Decision::Redirect(RedirectTarget {
                            path: self.landing_for(ctx.query),
                            return_to: None,
                        }),
                    }
                }
            }
        };

        debug!(path = %ctx.path, ?class, ?decision, "gateway decision");
        decision
    }

    /// Resolve the post-login destination from the incoming `redirect` param.
    ///
    /// Off-site values and values that would land on another auth-only page
    /// fall back to the default landing path.
    fn landing_for(&self, query: Option<&str>) -> String {
        let param = self.policy.return_to_param.as_str();

        let Some(raw) = return_to::find_in_query(query, param) else {
            return self.policy.default_landing_path.clone();
        };

        match return_to::sanitize(&raw, param) {
            Some(target) if self.policy.paths.classify(&target) != PathClass::AuthOnly => target,
            Some(target) => {
                debug!(target = %target, "return-to points at an auth-only page; using default");
                self.policy.default_landing_path.clone()
            }
            None => {
                warn!(raw = %raw, "rejected return-to value");
                self.policy.default_landing_path.clone()
            }
        }
    }

    /// The single place where verification failures become `Untrusted`.
    async fn trust(&self, credential: Option<&str>) -> Trust {
        let Some(credential) = credential else {
            return Trust::Untrusted;
        };

        let Some(verifier) = self.verifier.as_ref() else {
            warn!("no session verifier configured; treating session as untrusted");
            return Trust::Untrusted;
        };

        let result = match tokio::time::timeout(
            self.policy.verify_timeout,
            verifier.verify(credential),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(VerifyError::Timeout),
        };

        match result {
            Ok(()) => Trust::Trusted,
            Err(VerifyError::Rejected(status)) => {
                debug!(status, backend = verifier.backend_name(), "session rejected");
                Trust::Untrusted
            }
            Err(err) => {
                warn!(error = ?err, backend = verifier.backend_name(), "session verification failed");
                Trust::Untrusted
            }
        }
    }
}
