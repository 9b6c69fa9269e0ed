//! Error types for the panel session client.
//!
//! # Design
//! Every variant belongs to one `ErrorKind` so boundary layers (the FFI
//! envelope, the CLI) can decide presentation by category without matching
//! on each variant. Non-2xx statuses keep the raw status and body for
//! debugging.

/// Broad category of a `PanelError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    Transport,
    /// The session cookie or XSRF token is missing, malformed or rejected.
    Auth,
    /// The panel answered with something the client cannot interpret.
    Protocol,
    /// The panel answered with an unexpected non-2xx status.
    Http,
    /// The client configuration is invalid.
    Config,
}

/// Errors returned by `PanelClient` and `PanelSession` operations.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    #[error("timed out calling {url}")]
    Timeout { url: String },

    #[error("no session cookie captured yet")]
    MissingCookie,

    #[error("no XSRF token captured yet")]
    MissingToken,

    #[error("malformed Set-Cookie value: {0:?}")]
    MalformedCookie(String),

    #[error("panel rejected credentials (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("invalid zone list: {0}")]
    InvalidZoneList(String),

    #[error("zone list has not been fetched")]
    ZonesNotFetched,

    #[error("invalid zone field: {0}")]
    InvalidZoneField(String),

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PanelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PanelError::Transport { .. } | PanelError::Timeout { .. } => ErrorKind::Transport,
            PanelError::MissingCookie
            | PanelError::MissingToken
            | PanelError::MalformedCookie(_)
            | PanelError::Unauthorized { .. } => ErrorKind::Auth,
            PanelError::InvalidZoneList(_)
            | PanelError::ZonesNotFetched
            | PanelError::InvalidZoneField(_) => ErrorKind::Protocol,
            PanelError::HttpError { .. } => ErrorKind::Http,
            PanelError::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// HTTP status carried by the error, if the panel produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            PanelError::Unauthorized { status, .. } | PanelError::HttpError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_a_transport_error() {
        let err = PanelError::Timeout {
            url: "https://panel/zones".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn unauthorized_is_an_auth_error_with_status() {
        let err = PanelError::Unauthorized {
            status: 403,
            body: "xsrf mismatch".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "panel rejected credentials (HTTP 403): xsrf mismatch");
    }

    #[test]
    fn zone_errors_are_protocol_errors() {
        assert_eq!(PanelError::ZonesNotFetched.kind(), ErrorKind::Protocol);
        assert_eq!(
            PanelError::InvalidZoneList("expected object".into()).kind(),
            ErrorKind::Protocol
        );
    }
}
