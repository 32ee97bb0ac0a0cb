//! Return-to ("deep link survives login") handling.
//!
//! The destination a visitor originally asked for is carried in the URL
//! (`/login?redirect=/mypage/orders`) instead of a server-side session.
//! Anything read back from that parameter is attacker-controlled, so it is
//! only accepted as a same-origin relative path.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

/// Query parameter that carries the return-to path.
pub const RETURN_TO_PARAM: &str = "redirect";

// これより長い値は正規の遷移先とみなさない
const MAX_RETURN_TO_LEN: usize = 2048;

// login の `redirect=` に載せる値: unreserved と `/` 以外はエンコード
const PATH_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

// Location にそのまま出すパス: 上に加えて区切り文字 (`?&=#%+` など) は残す
const LOCATION_TARGET: &AsciiSet = &PATH_VALUE
    .remove(b'?')
    .remove(b'#')
    .remove(b'&')
    .remove(b'=')
    .remove(b'%')
    .remove(b'+')
    .remove(b':')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b',')
    .remove(b';');

/// Read the raw (decoded) return-to value from a request query string.
pub fn find_in_query(query: Option<&str>, param: &str) -> Option<String> {
    let query = query?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
}

/// Accept `raw` only if it is a same-origin relative path.
///
/// Rejected:
/// - empty / not starting with `/` (`https://evil.example`, `javascript:...`, `mypage`)
/// - protocol-relative `//evil.example`
/// - any backslash (`/\evil.example` is treated as `//` by browsers)
/// - control characters (header injection, `\t` tricks)
///
/// On success, any nested `param` pair inside the target's own query is removed
/// so the outgoing redirect never carries the return-to parameter again, and
/// the (already decoded) value is percent-encoded back into a URI reference
/// that can go into `Location` as-is.
pub fn sanitize(raw: &str, param: &str) -> Option<String> {
    if raw.is_empty() || raw.len() > MAX_RETURN_TO_LEN {
        return None;
    }
    if !raw.starts_with('/') || raw.starts_with("//") {
        return None;
    }
    if raw.contains('\\') || raw.chars().any(char::is_control) {
        return None;
    }

    let target = strip_param(raw, param);
    Some(utf8_percent_encode(&target, LOCATION_TARGET).to_string())
}

fn strip_param(target: &str, param: &str) -> String {
    let (before_fragment, fragment) = match target.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (target, None),
    };

    let (path, query) = match before_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (before_fragment, None),
    };

    let mut out = path.to_string();

    if let Some(query) = query {
        let has_param = form_urlencoded::parse(query.as_bytes()).any(|(k, _)| k == param);
        if has_param {
            let kept: String = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(
                    form_urlencoded::parse(query.as_bytes()).filter(|(k, _)| k != param),
                )
                .finish();
            if !kept.is_empty() {
                out.push('?');
                out.push_str(&kept);
            }
        } else if !query.is_empty() {
            out.push('?');
            out.push_str(query);
        }
    }

    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }

    out
}

/// `Location` for the login redirect: `{login_path}?{param}={original_path}`.
///
/// `/` is left as-is so the value stays readable (`redirect=/mypage`);
/// everything outside the unreserved set is percent-encoded.
pub fn login_location(login_path: &str, param: &str, original_path: &str) -> String {
    format!(
        "{}?{}={}",
        login_path,
        param,
        utf8_percent_encode(original_path, PATH_VALUE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_paths() {
        assert_eq!(sanitize("/mypage", RETURN_TO_PARAM).as_deref(), Some("/mypage"));
        assert_eq!(
            sanitize("/checkout?step=2#summary", RETURN_TO_PARAM).as_deref(),
            Some("/checkout?step=2#summary")
        );
    }

    #[test]
    fn rejects_off_site_targets() {
        for raw in [
            "",
            "https://evil.example/",
            "http://evil.example",
            "javascript:alert(1)",
            "//evil.example/mypage",
            "/\\evil.example",
            "\\\\evil.example",
            "mypage",
            "/mypage\r\nSet-Cookie: a=b",
            "/\tevil",
        ] {
            assert_eq!(sanitize(raw, RETURN_TO_PARAM), None, "raw {raw:?}");
        }
    }

    #[test]
    fn rejects_overlong_values() {
        let raw = format!("/{}", "a".repeat(MAX_RETURN_TO_LEN));
        assert_eq!(sanitize(&raw, RETURN_TO_PARAM), None);
    }

    #[test]
    fn decoded_target_is_re_encoded_for_location() {
        assert_eq!(
            sanitize("/checkout/ä", RETURN_TO_PARAM).as_deref(),
            Some("/checkout/%C3%A4")
        );
        assert_eq!(
            sanitize("/mypage/my orders?tab=a b&x=<y>#top", RETURN_TO_PARAM).as_deref(),
            Some("/mypage/my%20orders?tab=a%20b&x=%3Cy%3E#top")
        );
        // 区切り文字と既存の %XX はそのまま
        assert_eq!(
            sanitize("/search?q=a%2Bb&page=2", RETURN_TO_PARAM).as_deref(),
            Some("/search?q=a%2Bb&page=2")
        );
    }

    #[test]
    fn nested_return_to_is_stripped() {
        assert_eq!(
            sanitize("/mypage?redirect=/checkout", RETURN_TO_PARAM).as_deref(),
            Some("/mypage")
        );
        assert_eq!(
            sanitize("/mypage?tab=orders&redirect=%2Fx&page=2", RETURN_TO_PARAM).as_deref(),
            Some("/mypage?tab=orders&page=2")
        );
    }

    #[test]
    fn reads_and_decodes_param_from_query() {
        assert_eq!(
            find_in_query(Some("redirect=%2Fmypage%2Forders"), RETURN_TO_PARAM).as_deref(),
            Some("/mypage/orders")
        );
        assert_eq!(
            find_in_query(Some("a=1&redirect=/checkout"), RETURN_TO_PARAM).as_deref(),
            Some("/checkout")
        );
        assert_eq!(find_in_query(Some("a=1"), RETURN_TO_PARAM), None);
        assert_eq!(find_in_query(None, RETURN_TO_PARAM), None);
    }

    #[test]
    fn login_location_keeps_slashes_readable() {
        assert_eq!(
            login_location("/login", RETURN_TO_PARAM, "/mypage"),
            "/login?redirect=/mypage"
        );
        assert_eq!(
            login_location("/login", RETURN_TO_PARAM, "/mypage/a b&c"),
            "/login?redirect=/mypage/a%20b%26c"
        );
    }

    #[test]
    fn login_location_round_trips_through_the_query_reader() {
        let location = login_location("/login", RETURN_TO_PARAM, "/checkout/ä?x");
        let (_, query) = location.split_once('?').unwrap();
        assert_eq!(
            find_in_query(Some(query), RETURN_TO_PARAM).as_deref(),
            Some("/checkout/ä?x")
        );
    }
}
