//! Client configuration.
//!
//! A `ClientConfig` is built once at process start, either through
//! `ClientConfig::builder()` or from `PCA_*` environment variables, and
//! handed to `PanelSession::new`.

use std::time::Duration;

use crate::error::PanelError;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_URL: &str = "PCA_URL";
pub const ENV_INSECURE_TLS: &str = "PCA_INSECURE_TLS";
pub const ENV_CONNECT_TIMEOUT: &str = "PCA_CONNECT_TIMEOUT_SECS";
pub const ENV_READ_TIMEOUT: &str = "PCA_READ_TIMEOUT_SECS";

/// Whether the server's TLS certificate and hostname are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsVerification {
    #[default]
    Strict,
    /// Accept any server identity. Only for panels with self-signed
    /// certificates on a trusted network.
    Insecure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and optional port, without a trailing slash.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub tls: TlsVerification,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, PanelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its
    /// value. `PCA_URL` is required; everything else has a default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PanelError> {
        let url = lookup(ENV_URL)
            .ok_or_else(|| PanelError::InvalidConfig(format!("{ENV_URL} is not set")))?;
        let mut builder = Self::builder().base_url(url);

        if let Some(raw) = lookup(ENV_INSECURE_TLS) {
            builder = builder.insecure_tls(parse_flag(ENV_INSECURE_TLS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT) {
            builder = builder.connect_timeout(parse_secs(ENV_CONNECT_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_READ_TIMEOUT) {
            builder = builder.read_timeout(parse_secs(ENV_READ_TIMEOUT, &raw)?);
        }
        builder.build()
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    connect_timeout: Duration,
    read_timeout: Duration,
    tls: TlsVerification,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            tls: TlsVerification::Strict,
        }
    }
}

impl ClientConfigBuilder {
    /// Panel address. A bare `host[:port]` gets an `https://` prefix.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn insecure_tls(self, insecure: bool) -> Self {
        self.tls(if insecure {
            TlsVerification::Insecure
        } else {
            TlsVerification::Strict
        })
    }

    pub fn build(self) -> Result<ClientConfig, PanelError> {
        let raw = self
            .base_url
            .ok_or_else(|| PanelError::InvalidConfig("base URL is required".to_string()))?;
        Ok(ClientConfig {
            base_url: normalize_base_url(&raw)?,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            tls: self.tls,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, PanelError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(PanelError::InvalidConfig("base URL is empty".to_string()));
    }
    match trimmed.split_once("://") {
        Some(("http" | "https", rest)) if !rest.is_empty() => Ok(trimmed.to_string()),
        Some((scheme, _)) => Err(PanelError::InvalidConfig(format!(
            "unsupported base URL {trimmed:?} (scheme {scheme:?})"
        ))),
        None => Ok(format!("https://{trimmed}")),
    }
}

/// Parse a boolean setting the way `from_lookup` does: `1/true/yes/on` or
/// `0/false/no/off`, case-insensitive. `key` names the setting in errors.
pub fn parse_flag(key: &str, raw: &str) -> Result<bool, PanelError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(PanelError::InvalidConfig(format!("{key}: not a boolean: {other:?}"))),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, PanelError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| PanelError::InvalidConfig(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_strict_with_ten_second_timeouts() {
        let config = ClientConfig::builder().base_url("https://panel").build().unwrap();
        assert_eq!(config.tls, TlsVerification::Strict);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
    }

    #[test]
    fn bare_host_gets_https_prefix() {
        let config = ClientConfig::builder().base_url("192.168.1.20:8888/").build().unwrap();
        assert_eq!(config.base_url, "https://192.168.1.20:8888");
    }

    #[test]
    fn http_scheme_is_kept() {
        let config = ClientConfig::builder().base_url("http://127.0.0.1:3000").build().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let err = ClientConfig::builder().base_url("ftp://panel").build().unwrap_err();
        assert!(matches!(err, PanelError::InvalidConfig(_)));
    }

    #[test]
    fn missing_url_is_rejected() {
        assert!(ClientConfig::builder().build().is_err());
        assert!(ClientConfig::builder().base_url("  ").build().is_err());
    }

    #[test]
    fn env_lookup_reads_all_settings() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "panel.lan"),
            (ENV_INSECURE_TLS, "true"),
            (ENV_CONNECT_TIMEOUT, "3"),
            (ENV_READ_TIMEOUT, "20"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://panel.lan");
        assert_eq!(config.tls, TlsVerification::Insecure);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.read_timeout, Duration::from_secs(20));
    }

    #[test]
    fn env_lookup_requires_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_URL));
    }

    #[test]
    fn env_lookup_rejects_bad_flag() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_URL, "panel"), (ENV_INSECURE_TLS, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, PanelError::InvalidConfig(_)));
    }
}
