/*
 * Responsibility
 * - ゲート通過後のページ描画の受け口
 * - 実際の描画 (商品一覧, カート, マイページ等) はフロントエンド側の責務。
 *   ここではゲートを通過したことだけを返す。
 */
use axum::{
    extract::OriginalUri,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};

const PAGE_SHELL: &str =
    "<!doctype html><html><head><meta charset=\"utf-8\"><title>Acrylic Store</title></head><body><div id=\"app\"></div></body></html>";

pub async fn render_page(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    tracing::debug!(path = %uri.path(), "rendering page");

    (
        StatusCode::OK,
        // ゲートの判定に依存するページはキャッシュさせない
        [(header::CACHE_CONTROL, "private, no-cache")],
        Html(PAGE_SHELL),
    )
}
