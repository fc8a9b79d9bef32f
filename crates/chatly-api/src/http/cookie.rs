//! Session cookie construction and parsing.
//!
//! The session token travels in a cookie named `token`: `HttpOnly`,
//! `SameSite=Lax`, `Path=/`, `Secure` unless disabled for plain-HTTP
//! development.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: i64,
}

impl CookieSettings {
    /// `Set-Cookie` value carrying `token`.
    pub fn session(&self, token: &str) -> String {
        self.build(token, self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn cleared(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// The session token from the request's `Cookie` header(s), if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn settings(secure: bool) -> CookieSettings {
        CookieSettings {
            secure,
            max_age_secs: 86_400,
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = settings(true).session("abc.def");
        assert_eq!(
            cookie,
            "token=abc.def; HttpOnly; SameSite=Lax; Path=/; Max-Age=86400; Secure"
        );
    }

    #[test]
    fn test_insecure_cookie_for_plain_http() {
        assert!(!settings(false).session("abc").contains("Secure"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = settings(true).cleared();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=abc.def; lang=en"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_token_across_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("token=xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_empty_or_lookalike_cookie_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("token=; xtoken=nope"));
        assert_eq!(session_token(&headers), None);
    }
}
