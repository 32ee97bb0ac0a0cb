/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: gateway: 認可ゲート (policy + session verifier)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト間で共有するのは読み取り専用の設定だけ (可変状態は持たない)
 */
use std::sync::Arc;

use crate::services::auth::Gateway;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}
