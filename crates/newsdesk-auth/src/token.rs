//! Bearer credential lookup across request locations.
//!
//! A request may carry its token in the session cookie, the
//! `Authorization: Bearer` header, or a `token` query parameter. They are
//! checked in exactly that order and the first non-empty one wins.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cookie,
    Header,
    Query,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenSource::Cookie => "cookie",
            TokenSource::Header => "header",
            TokenSource::Query => "query",
        })
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; anything other than `Bearer`
/// yields `None`.
pub fn bearer_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Picks the token to verify, honouring cookie > header > query precedence.
pub fn select_token<'a>(
    cookie: Option<&'a str>,
    authorization: Option<&'a str>,
    query: Option<&'a str>,
) -> Option<(&'a str, TokenSource)> {
    let non_empty = |v: &'a str| {
        let v = v.trim();
        (!v.is_empty()).then_some(v)
    };

    cookie
        .and_then(non_empty)
        .map(|t| (t, TokenSource::Cookie))
        .or_else(|| {
            authorization
                .and_then(bearer_from_header)
                .map(|t| (t, TokenSource::Header))
        })
        .or_else(|| query.and_then(non_empty).map(|t| (t, TokenSource::Query)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_wins_over_header_and_query() {
        let selected = select_token(Some("from-cookie"), Some("Bearer from-header"), Some("q"));
        assert_eq!(selected, Some(("from-cookie", TokenSource::Cookie)));
    }

    #[test]
    fn test_header_wins_over_query() {
        let selected = select_token(None, Some("Bearer from-header"), Some("from-query"));
        assert_eq!(selected, Some(("from-header", TokenSource::Header)));
    }

    #[test]
    fn test_query_is_last_resort() {
        let selected = select_token(Some(""), Some("Basic dXNlcjpwYXNz"), Some("from-query"));
        assert_eq!(selected, Some(("from-query", TokenSource::Query)));
    }

    #[test]
    fn test_nothing_present() {
        assert_eq!(select_token(None, None, None), None);
        assert_eq!(select_token(Some("  "), Some("Bearer "), Some("")), None);
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        assert_eq!(bearer_from_header("bearer abc"), Some("abc"));
        assert_eq!(bearer_from_header("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_from_header("Token abc"), None);
        assert_eq!(bearer_from_header("Bearer"), None);
    }
}
