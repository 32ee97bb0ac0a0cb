/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, AUTH_ENABLED, API_BASE_URL など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動時に 1 回だけ読み、以降は不変 (リクエスト毎に env を読まない)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // false にすると認可ゲートを丸ごと無効化する (バックエンドが無い環境向け)
    pub auth_enabled: bool,
    // セッション検証エンドポイントのベース URL
    pub api_base_url: Option<String>,
    pub session_verify_timeout: Duration,
    // ルータ全体の TimeoutLayer。検証タイムアウトはこれより短くなければならない
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `from_env` の本体。テストでは env を汚さずに任意の値を渡せる。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = lookup("APP_ENV")
            .map(|raw| AppEnv::parse(&raw))
            .unwrap_or(AppEnv::Development);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_enabled = match lookup("AUTH_ENABLED") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid("AUTH_ENABLED"))?,
            None => true,
        };

        let api_base_url = lookup("API_BASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // ゲートが有効なのに検証先が無いと、全ての protected path が常に拒否になる。
        // 黙って動かすより起動時に落とす。
        if auth_enabled && api_base_url.is_none() {
            return Err(ConfigError::Missing("API_BASE_URL"));
        }

        let session_verify_timeout_ms = match lookup("SESSION_VERIFY_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid("SESSION_VERIFY_TIMEOUT_MS"))?,
            None => 5_000,
        };

        let request_timeout_ms = match lookup("REQUEST_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_MS"))?,
            None => 30_000,
        };

        // 外側の TimeoutLayer が先に発火すると、ログインへのリダイレクトではなく 408 になる
        if session_verify_timeout_ms >= request_timeout_ms {
            return Err(ConfigError::Invalid("SESSION_VERIFY_TIMEOUT_MS"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            auth_enabled,
            api_base_url,
            session_verify_timeout: Duration::from_millis(session_verify_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_base_url_is_set() {
        let config = load(&[("API_BASE_URL", "http://backend:8080")]).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.auth_enabled);
        assert_eq!(config.api_base_url.as_deref(), Some("http://backend:8080"));
        assert_eq!(config.session_verify_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn enabled_gateway_requires_base_url() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("API_BASE_URL"));
    }

    #[test]
    fn kill_switch_does_not_need_base_url() {
        let config = load(&[("AUTH_ENABLED", "false")]).unwrap();
        assert!(!config.auth_enabled);
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn unrecognized_flag_is_rejected() {
        let err = load(&[("AUTH_ENABLED", "maybe")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_ENABLED"));
    }

    #[test]
    fn parses_origins_env_and_timeout() {
        let config = load(&[
            ("API_BASE_URL", "http://backend"),
            ("APP_ENV", "prod"),
            ("PORT", "8081"),
            ("CORS_ALLOWED_ORIGINS", "https://shop.example, ,https://admin.example"),
            ("SESSION_VERIFY_TIMEOUT_MS", "750"),
        ])
        .unwrap();

        assert!(config.app_env.is_production());
        assert_eq!(config.addr.port(), 8081);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://shop.example", "https://admin.example"]
        );
        assert_eq!(config.session_verify_timeout, Duration::from_millis(750));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let err = load(&[
            ("API_BASE_URL", "http://backend"),
            ("SESSION_VERIFY_TIMEOUT_MS", "0"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("SESSION_VERIFY_TIMEOUT_MS"));
    }

    #[test]
    fn verify_timeout_must_be_shorter_than_request_timeout() {
        for verify_ms in ["30000", "60000"] {
            let err = load(&[
                ("API_BASE_URL", "http://backend"),
                ("SESSION_VERIFY_TIMEOUT_MS", verify_ms),
            ])
            .unwrap_err();
            assert_eq!(err, ConfigError::Invalid("SESSION_VERIFY_TIMEOUT_MS"));
        }

        // デフォルトの 5s でも、リクエスト側を短くすれば不正になる
        let err = load(&[
            ("API_BASE_URL", "http://backend"),
            ("REQUEST_TIMEOUT_MS", "3000"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("SESSION_VERIFY_TIMEOUT_MS"));

        let config = load(&[
            ("API_BASE_URL", "http://backend"),
            ("REQUEST_TIMEOUT_MS", "90000"),
            ("SESSION_VERIFY_TIMEOUT_MS", "60000"),
        ])
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(90));
        assert_eq!(config.session_verify_timeout, Duration::from_secs(60));
    }
}
