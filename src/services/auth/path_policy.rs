//! Path classification for the page gateway.
//!
//! Pure logic only: no axum, no network. The middleware asks `classify` first
//! and only talks to the session backend when the answer is not `Public`.

/// Which gate (if any) applies to a requested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    // 信頼済みセッションが必要 (マイページ, チェックアウト)
    Protected,
    // ログイン済みなら見せないページ (ログイン, 会員登録)
    AuthOnly,
    // 誰でも見られる (トップ, 商品一覧など)
    Public,
}

/// Prefix lists used by `classify`.
///
/// Note: matching is a plain `starts_with`, so `/mypage` also covers
/// `/mypage/orders` (and `/mypages`). Overlapping lists resolve to `Protected`.
#[derive(Debug, Clone)]
pub struct PathPolicy {
    pub protected_prefixes: Vec<String>,
    pub auth_only_prefixes: Vec<String>,
}

pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &["/mypage", "/checkout"];
pub const DEFAULT_AUTH_ONLY_PREFIXES: &[&str] = &["/login", "/register"];

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROTECTED_PREFIXES, DEFAULT_AUTH_ONLY_PREFIXES)
    }
}

impl PathPolicy {
    pub fn new(protected: &[&str], auth_only: &[&str]) -> Self {
        Self {
            protected_prefixes: protected.iter().map(|s| s.to_string()).collect(),
            auth_only_prefixes: auth_only.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn classify(&self, path: &str) -> PathClass {
        // HTTP 層からは空文字は来ないが、来たらルート扱い
        let path = if path.is_empty() { "/" } else { path };

        if self
            .protected_prefixes
            .iter()
            .any(|p| path.starts_with(p.as_str()))
        {
            return PathClass::Protected;
        }

        if self
            .auth_only_prefixes
            .iter()
            .any(|p| path.starts_with(p.as_str()))
        {
            return PathClass::AuthOnly;
        }

        PathClass::Public
    }
}
