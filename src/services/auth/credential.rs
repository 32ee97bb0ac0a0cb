use axum::http::{HeaderMap, header};

/// Pull the session token out of the request's `Cookie` header(s).
///
/// Returns `None` when the cookie is missing or empty; the gateway treats
/// that as "untrusted" without calling the backend.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(header::COOKIE, HeaderValue::from_str(c).unwrap());
        }
        map
    }

    #[test]
    fn finds_token_among_other_cookies() {
        let h = headers(&["theme=dark; access_token=valid_token; cart=3"]);
        assert_eq!(session_token(&h, "access_token").as_deref(), Some("valid_token"));
    }

    #[test]
    fn searches_every_cookie_header() {
        let h = headers(&["theme=dark", "access_token=abc"]);
        assert_eq!(session_token(&h, "access_token").as_deref(), Some("abc"));
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let h = headers(&["access_token=\"abc\""]);
        assert_eq!(session_token(&h, "access_token").as_deref(), Some("abc"));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        assert_eq!(session_token(&HeaderMap::new(), "access_token"), None);
        assert_eq!(session_token(&headers(&["access_token="]), "access_token"), None);
        assert_eq!(session_token(&headers(&["x_access_token=abc"]), "access_token"), None);
    }
}
