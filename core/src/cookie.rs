//! XSRF token extraction from the panel's `Set-Cookie` header.

use crate::error::PanelError;

/// Extract the XSRF token from a raw `Set-Cookie` value.
///
/// The token is the text after the first `=` and before the next `;`, or the
/// rest of the string when there is no `;`. A value without `=` is rejected.
///
/// ```
/// use pca_core::derive_xsrf_token;
///
/// assert_eq!(derive_xsrf_token("sessionid=abc123; Path=/").unwrap(), "abc123");
/// ```
pub fn derive_xsrf_token(set_cookie: &str) -> Result<String, PanelError> {
    let (_, rest) = set_cookie
        .split_once('=')
        .ok_or_else(|| PanelError::MalformedCookie(set_cookie.to_string()))?;
    let token = match rest.split_once(';') {
        Some((token, _)) => token,
        None => rest,
    };
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_between_equals_and_semicolon() {
        assert_eq!(derive_xsrf_token("sessionid=abc123; Path=/").unwrap(), "abc123");
    }

    #[test]
    fn token_runs_to_end_without_semicolon() {
        assert_eq!(derive_xsrf_token("_xsrf=2|ab12|cd34|1700000000").unwrap(), "2|ab12|cd34|1700000000");
    }

    #[test]
    fn only_first_equals_splits() {
        assert_eq!(derive_xsrf_token("_xsrf=a=b; Path=/").unwrap(), "a=b");
    }

    #[test]
    fn empty_value_is_allowed() {
        assert_eq!(derive_xsrf_token("_xsrf=; Path=/").unwrap(), "");
    }

    #[test]
    fn missing_equals_is_a_typed_error() {
        let err = derive_xsrf_token("garbage").unwrap_err();
        assert!(matches!(err, PanelError::MalformedCookie(ref raw) if raw == "garbage"));
    }
}
