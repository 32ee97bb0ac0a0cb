//! ページ描画前の認可ゲート
//!
//! - Cookie `access_token` を取り出し、`Gateway::decide` に渡す
//! - `Continue` なら次へ、`Redirect` なら 307 + `Location` を返す
//! - 検証の失敗はすべて Untrusted として扱われるので、ここでエラーレスポンスは作らない

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};

use crate::services::auth::credential;
use crate::services::auth::{Decision, RequestContext};
use crate::state::AppState;

/// ページ系ルートにゲートを掛ける。
///
/// 例：
/// ```ignore
/// let pages = Router::new().fallback(render_page);
/// let pages = middleware::auth::gateway::apply(pages, state.clone());
/// ```
///
/// `layer` なので、先に route / fallback を登録してから呼ぶこと。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, gateway_middleware))
}

async fn gateway_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Response {
    let policy = state.gateway.policy();

    let token = credential::session_token(req.headers(), &policy.session_cookie);

    let ctx = RequestContext {
        path: original_uri.path(),
        query: original_uri.query(),
        credential: token.as_deref(),
    };

    match state.gateway.decide(ctx).await {
        Decision::Continue => next.run(req).await,
        Decision::Redirect(target) => {
            let location = target.location(&policy.return_to_param);
            // 訪問者ごとの判定なので中間キャッシュさせない
            (
                [(header::CACHE_CONTROL, "no-store")],
                Redirect::temporary(&location),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::gateway::tests::FakeVerifier;
    use crate::services::auth::{Gateway, GatewayPolicy};

    fn app(verifier: Arc<FakeVerifier>) -> Router {
        let state = AppState::new(Arc::new(Gateway::new(
            GatewayPolicy::default(),
            Some(verifier),
        )));
        let router = Router::new().fallback(|| async { "page" });
        apply(router, state.clone()).with_state(state)
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn redirect_carries_location_and_no_store() {
        let resp = app(Arc::new(FakeVerifier::trusting("valid_token")))
            .oneshot(get("/mypage", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()[header::LOCATION], "/login?redirect=/mypage");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn cookie_is_read_from_request() {
        let verifier = Arc::new(FakeVerifier::trusting("valid_token"));
        let resp = app(verifier.clone())
            .oneshot(get("/mypage", Some("theme=dark; access_token=valid_token")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::LOCATION).is_none());
        assert_eq!(verifier.calls(), 1);
    }
}
