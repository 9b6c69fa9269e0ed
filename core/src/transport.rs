//! Blocking HTTP transport.
//!
//! # Design
//! `Transport` performs one request/response round trip and nothing else:
//! no cookie jar, no retries, no status interpretation. 4xx/5xx responses
//! come back as data so `PanelClient` decides what they mean. Tests swap in
//! scripted transports to simulate timeouts and canned panel replies.

use ureq::tls::TlsConfig;

use crate::config::{ClientConfig, TlsVerification};
use crate::error::PanelError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a single HTTP request, blocking until the response is read.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PanelError>;
}

/// `Transport` backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let mut builder = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(config.connect_timeout))
            .timeout_recv_response(Some(config.read_timeout))
            .timeout_recv_body(Some(config.read_timeout));
        if config.tls == TlsVerification::Insecure {
            builder = builder.tls_config(TlsConfig::builder().disable_verification(true).build());
        }
        Self {
            agent: builder.build().new_agent(),
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PanelError> {
        let url = request.url;
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                let body = request.body.unwrap_or_default();
                builder.send(body.as_bytes())
            }
        };
        let mut response = result.map_err(|e| map_ureq_error(&url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| map_ureq_error(&url, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> PanelError {
    match err {
        ureq::Error::Timeout(_) => PanelError::Timeout {
            url: url.to_string(),
        },
        other => PanelError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
