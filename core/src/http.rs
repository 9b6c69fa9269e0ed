//! HTTP request/response types exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `PanelClient` builds `HttpRequest`
//! values and interprets `HttpResponse` values without touching the network;
//! a `Transport` performs the round trip in between. Header lookups are
//! case-insensitive because servers disagree on `Set-Cookie` casing.

/// HTTP method for a request. The panel only speaks GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The last `Set-Cookie` value on the response. When the panel sends
    /// several, the last one wins.
    pub fn last_set_cookie(&self) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::new(),
        }
    }

    #[test]
    fn last_set_cookie_prefers_the_final_header() {
        let resp = response(&[
            ("Set-Cookie", "_xsrf=first; Path=/"),
            ("Content-Type", "text/html"),
            ("set-cookie", "_xsrf=second; Path=/"),
        ]);
        assert_eq!(resp.last_set_cookie(), Some("_xsrf=second; Path=/"));
    }

    #[test]
    fn last_set_cookie_absent() {
        let resp = response(&[("Content-Type", "text/html")]);
        assert_eq!(resp.last_set_cookie(), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(&[("Content-Type", "application/json")]);
        assert_eq!(resp.header("content-type"), Some("application/json"));
    }

    #[test]
    fn success_range() {
        let mut resp = response(&[]);
        assert!(resp.is_success());
        resp.status = 302;
        assert!(!resp.is_success());
    }
}
