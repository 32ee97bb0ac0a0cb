/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各 module は `apply(router, ...) -> Router` の形で揃える
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
