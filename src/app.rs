/*
 * Responsibility
 * - Config読み込み → 依存生成 (Gateway) → Router 組み立て
 * - Middleware の適用 (HTTP/Security headers/CORS/認可ゲート)
 * - axum::serve() で起動
 */
use std::{panic, process};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::build_gateway;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,storefront_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development では即落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    let state = build_state(&config)?;

    if config.auth_enabled {
        tracing::info!(
            api_base_url = config.api_base_url.as_deref().unwrap_or_default(),
            timeout_ms = config.session_verify_timeout.as_millis() as u64,
            "authorization gateway enabled"
        );
    } else {
        tracing::warn!("authorization gateway DISABLED (AUTH_ENABLED=false); all pages pass through");
    }

    tracing::info!(
        "starting storefront in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    let gateway = build_gateway(config)?;
    Ok(AppState::new(gateway))
}

/// 外側から: http (request-id/trace/timeout) → security headers → CORS → ルート
/// 認可ゲートはページ用ルートの内側にだけ掛かる
pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .merge(api::routes())
        .merge(api::pages(state.clone()))
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router, config.request_timeout)
}
