/*
 * Responsibility
 * - URL 構造を定義
 * - /health はゲートの外、それ以外 (ページ) はすべてゲートの内側
 */
use axum::{Router, routing::get};

use crate::api::handlers::{health::health, pages::render_page};
use crate::middleware;
use crate::state::AppState;

/// ゲートを通らないルート
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// ページ全体 (fallback) に認可ゲートを掛けたルート
pub fn pages(state: AppState) -> Router<AppState> {
    let pages = Router::new().fallback(render_page);
    middleware::auth::gateway::apply(pages, state)
}
