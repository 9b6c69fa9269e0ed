//! Request builder and response interpreter for the panel's endpoints.
//!
//! # Design
//! `PanelClient` holds only the base URL and carries no session state.
//! Each endpoint has a `build_*` method that produces an `HttpRequest` from
//! explicit inputs (cookie, XSRF token, zone states). `parse_body` and
//! `parse_zone_names` interpret what comes back. `PanelSession` owns the
//! state and the transport and drives these methods.

use crate::encoder::{encode_start_body, form_encode, STOP_BODY};
use crate::error::PanelError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ZoneSet, ZoneStates};

pub const HEADER_COOKIE: &str = "Cookie";
pub const HEADER_REQUESTED_WITH: &str = "X-Requested-With";
pub const HEADER_CONTENT_TYPE: &str = "Content-type";
pub const HEADER_CSRF_TOKEN: &str = "X-Csrftoken";

const XML_HTTP_REQUEST: &str = "XMLHttpRequest";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Stateless builder for panel requests.
#[derive(Debug, Clone)]
pub struct PanelClient {
    base_url: String,
}

impl PanelClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET the panel's landing page, which hands out the initial cookie.
    pub fn build_home(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.base_url.clone(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_zones(&self, cookie: Option<&str>) -> HttpRequest {
        self.get_with_cookie("/zones", cookie)
    }

    pub fn build_control_page(&self, cookie: Option<&str>) -> HttpRequest {
        self.get_with_cookie("/control", cookie)
    }

    /// POST the password to `/login`. The token goes both in the body and in
    /// the `X-Csrftoken` header.
    pub fn build_login(&self, cookie: &str, xsrf_token: &str, password: &str) -> HttpRequest {
        let body = format!("_xsrf={xsrf_token}&password={}", form_encode(password));
        self.form_post("/login", cookie, xsrf_token, body)
    }

    pub fn build_start_zones(&self, cookie: &str, xsrf_token: &str, states: &ZoneStates) -> HttpRequest {
        self.form_post("/control", cookie, xsrf_token, encode_start_body(states))
    }

    pub fn build_stop_zones(&self, cookie: &str, xsrf_token: &str) -> HttpRequest {
        self.form_post("/control", cookie, xsrf_token, STOP_BODY.to_string())
    }

    /// Return the body of a 2xx response, or map the status to an error.
    pub fn parse_body(&self, response: HttpResponse) -> Result<String, PanelError> {
        check_status(&response)?;
        Ok(response.body)
    }

    fn get_with_cookie(&self, path: &str, cookie: Option<&str>) -> HttpRequest {
        let headers = match cookie {
            Some(cookie) => vec![(HEADER_COOKIE.to_string(), cookie.to_string())],
            None => Vec::new(),
        };
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn form_post(&self, path: &str, cookie: &str, xsrf_token: &str, body: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            headers: vec![
                (HEADER_REQUESTED_WITH.to_string(), XML_HTTP_REQUEST.to_string()),
                (HEADER_CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string()),
                (HEADER_CSRF_TOKEN.to_string(), xsrf_token.to_string()),
                (HEADER_COOKIE.to_string(), cookie.to_string()),
            ],
            body: Some(body),
        }
    }
}

/// Parse the key set of the JSON object returned by `/zones`. Values are
/// ignored.
pub fn parse_zone_names(body: &str) -> Result<ZoneSet, PanelError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| PanelError::InvalidZoneList(e.to_string()))?;
    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().map(|(name, _)| name).collect()),
        other => Err(PanelError::InvalidZoneList(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Map non-success status codes to the appropriate `PanelError` variant.
fn check_status(response: &HttpResponse) -> Result<(), PanelError> {
    if response.is_success() {
        return Ok(());
    }
    if matches!(response.status, 401 | 403) {
        return Err(PanelError::Unauthorized {
            status: response.status,
            body: response.body.clone(),
        });
    }
    Err(PanelError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PanelClient {
        PanelClient::new("https://panel.local:8888")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_home_targets_base_url() {
        let req = client().build_home();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://panel.local:8888");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_zones_attaches_cookie_when_present() {
        let req = client().build_zones(Some("_xsrf=abc; Path=/"));
        assert_eq!(req.url, "https://panel.local:8888/zones");
        assert_eq!(req.header("cookie"), Some("_xsrf=abc; Path=/"));

        let req = client().build_zones(None);
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_login_sends_token_twice() {
        let req = client().build_login("_xsrf=abc; Path=/", "abc", "hunter2");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://panel.local:8888/login");
        assert_eq!(req.body.as_deref(), Some("_xsrf=abc&password=hunter2"));
        assert_eq!(req.header(HEADER_CSRF_TOKEN), Some("abc"));
        assert_eq!(req.header(HEADER_REQUESTED_WITH), Some("XMLHttpRequest"));
        assert_eq!(
            req.header(HEADER_CONTENT_TYPE),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
        assert_eq!(req.header(HEADER_COOKIE), Some("_xsrf=abc; Path=/"));
    }

    #[test]
    fn build_login_escapes_password() {
        let req = client().build_login("c=1", "1", "a&b=c");
        assert_eq!(req.body.as_deref(), Some("_xsrf=1&password=a%26b%3Dc"));
    }

    #[test]
    fn build_stop_zones_carries_cookie_and_token() {
        let req = client().build_stop_zones("sid=XYZ; Path=/", "XYZ");
        assert_eq!(req.url, "https://panel.local:8888/control");
        assert_eq!(req.body.as_deref(), Some("&on=off&zone="));
        assert_eq!(req.header(HEADER_COOKIE), Some("sid=XYZ; Path=/"));
        assert_eq!(req.header(HEADER_CSRF_TOKEN), Some("XYZ"));
    }

    #[test]
    fn build_start_zones_uses_encoder() {
        let states: ZoneStates = [("front", true)].into_iter().collect();
        let req = client().build_start_zones("sid=1", "1", &states);
        assert_eq!(req.body.as_deref(), Some("&on=true&zone=%7B%22front%22%3Atrue%7D"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = PanelClient::new("https://panel.local/").build_control_page(None);
        assert_eq!(req.url, "https://panel.local/control");
    }

    #[test]
    fn parse_body_success() {
        assert_eq!(client().parse_body(response(200, "ok")).unwrap(), "ok");
        assert_eq!(client().parse_body(response(204, "")).unwrap(), "");
    }

    #[test]
    fn parse_body_forbidden_is_unauthorized() {
        let err = client().parse_body(response(403, "xsrf")).unwrap_err();
        assert!(matches!(err, PanelError::Unauthorized { status: 403, .. }));
    }

    #[test]
    fn parse_body_server_error() {
        let err = client().parse_body(response(500, "boom")).unwrap_err();
        assert!(matches!(err, PanelError::HttpError { status: 500, .. }));
    }

    #[test]
    fn zone_names_ignore_values() {
        let names = parse_zone_names(r#"{"front":true,"back":false}"#).unwrap();
        let expected: ZoneSet = ["front", "back"].into_iter().collect();
        assert_eq!(names, expected);

        let names = parse_zone_names(r#"{"a":{"pin":4},"b":null}"#).unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn zone_names_reject_bad_json() {
        let err = parse_zone_names("<html>login</html>").unwrap_err();
        assert!(matches!(err, PanelError::InvalidZoneList(_)));
    }

    #[test]
    fn zone_names_reject_non_object() {
        let err = parse_zone_names(r#"["front","back"]"#).unwrap_err();
        assert!(matches!(err, PanelError::InvalidZoneList(ref m) if m.contains("an array")));
    }
}
