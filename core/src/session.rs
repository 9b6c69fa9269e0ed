//! Authenticated session against one panel.
//!
//! # Design
//! `PanelSession` is the explicit handle a process creates once and shares
//! (behind an `Arc` if needed) with every caller. It owns the transport and
//! the captured cookie/XSRF state, so callers never thread tokens through
//! by hand.
//!
//! - Operations are `async`. The blocking transport runs on tokio's blocking
//!   pool, so callers never spawn threads themselves.
//! - State sits behind a `tokio::sync::Mutex` held for the whole round trip.
//!   Requests through one session are therefore serialized, and a response
//!   can never interleave with another call's cookie update.
//! - State is only written after a response arrives. A transport failure
//!   leaves the cookie, token and cached zone list untouched.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::{parse_zone_names, PanelClient};
use crate::config::{ClientConfig, TlsVerification};
use crate::cookie::derive_xsrf_token;
use crate::error::PanelError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{ZoneSet, ZoneStates};

/// Cookie, token and cached `/zones` body.
///
/// A `Set-Cookie` is only captured from a 2xx response. Error responses
/// never rotate the session. A 2xx whose `Set-Cookie` cannot be parsed
/// fails with `MalformedCookie` and keeps the previous cookie, even though
/// the panel has already handled the request.
#[derive(Debug, Default)]
struct SessionState {
    cookie: Option<String>,
    xsrf_token: Option<String>,
    zones_body: Option<String>,
}

impl SessionState {
    /// Store a raw `Set-Cookie` and its token. Both fields change together
    /// or not at all.
    fn absorb_cookie(&mut self, raw: &str) -> Result<(), PanelError> {
        let token = derive_xsrf_token(raw)?;
        debug!("captured session cookie");
        self.cookie = Some(raw.to_string());
        self.xsrf_token = Some(token);
        Ok(())
    }

    fn credentials(&self) -> Result<(String, String), PanelError> {
        let cookie = self.cookie.clone().ok_or(PanelError::MissingCookie)?;
        let token = self.xsrf_token.clone().ok_or(PanelError::MissingToken)?;
        Ok((cookie, token))
    }
}

pub struct PanelSession {
    client: PanelClient,
    transport: Arc<dyn Transport>,
    state: Mutex<SessionState>,
}

impl PanelSession {
    /// Create a session talking to the panel over HTTP(S).
    pub fn new(config: &ClientConfig) -> Self {
        if config.tls == TlsVerification::Insecure {
            warn!(
                base_url = %config.base_url,
                "TLS certificate verification is DISABLED for this panel"
            );
        }
        Self::with_transport(&config.base_url, Arc::new(UreqTransport::new(config)))
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            client: PanelClient::new(base_url),
            transport,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// GET the landing page and capture the initial cookie and token.
    pub async fn fetch_home(&self) -> Result<String, PanelError> {
        let mut state = self.state.lock().await;
        let response = self.execute(self.client.build_home()).await?;
        self.accept(&mut state, response)
    }

    /// GET `/zones` and cache the raw body for `zone_names`.
    pub async fn fetch_zones(&self) -> Result<String, PanelError> {
        let mut state = self.state.lock().await;
        let request = self.client.build_zones(state.cookie.as_deref());
        let response = self.execute(request).await?;
        let body = self.accept(&mut state, response)?;
        state.zones_body = Some(body.clone());
        Ok(body)
    }

    /// Zone names from the last successful `fetch_zones`.
    pub async fn zone_names(&self) -> Result<ZoneSet, PanelError> {
        let state = self.state.lock().await;
        let body = state.zones_body.as_deref().ok_or(PanelError::ZonesNotFetched)?;
        parse_zone_names(body)
    }

    /// POST the password to `/login`. Requires a cookie from `fetch_home`.
    pub async fn login(&self, password: &str) -> Result<String, PanelError> {
        let mut state = self.state.lock().await;
        let (cookie, token) = state.credentials()?;
        let response = self
            .execute(self.client.build_login(&cookie, &token, password))
            .await?;
        let body = self.accept(&mut state, response)?;
        info!(base_url = %self.client.base_url(), "logged in to panel");
        Ok(body)
    }

    pub async fn fetch_control_page(&self) -> Result<String, PanelError> {
        let mut state = self.state.lock().await;
        let request = self.client.build_control_page(state.cookie.as_deref());
        let response = self.execute(request).await?;
        self.accept(&mut state, response)
    }

    /// Start the PCA system with the given per-zone flags.
    pub async fn start_zones(&self, states: &ZoneStates) -> Result<String, PanelError> {
        let mut state = self.state.lock().await;
        let (cookie, token) = state.credentials()?;
        let response = self
            .execute(self.client.build_start_zones(&cookie, &token, states))
            .await?;
        let body = self.accept(&mut state, response)?;
        info!(enabled = ?states.enabled().collect::<Vec<_>>(), "started PCA system");
        Ok(body)
    }

    /// Stop the PCA system. Sends the session cookie like every other
    /// authenticated call.
    pub async fn stop_zones(&self) -> Result<String, PanelError> {
        let mut state = self.state.lock().await;
        let (cookie, token) = state.credentials()?;
        let response = self.execute(self.client.build_stop_zones(&cookie, &token)).await?;
        let body = self.accept(&mut state, response)?;
        info!("stopped PCA system");
        Ok(body)
    }

    pub async fn cookie(&self) -> Option<String> {
        self.state.lock().await.cookie.clone()
    }

    pub async fn xsrf_token(&self) -> Option<String> {
        self.state.lock().await.xsrf_token.clone()
    }

    /// Forget the cookie, token and cached zone list.
    pub async fn clear(&self) {
        *self.state.lock().await = SessionState::default();
    }

    /// Check the status, then capture any `Set-Cookie` from the successful
    /// response.
    fn accept(&self, state: &mut SessionState, response: HttpResponse) -> Result<String, PanelError> {
        let set_cookie = response.last_set_cookie().map(str::to_string);
        let body = self.client.parse_body(response)?;
        if let Some(raw) = set_cookie {
            state.absorb_cookie(&raw)?;
        }
        Ok(body)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PanelError> {
        debug!(method = request.method.as_str(), url = %request.url, "call to panel");
        let url = request.url.clone();
        let transport = Arc::clone(&self.transport);
        let response = tokio::task::spawn_blocking(move || transport.execute(request))
            .await
            .map_err(|e| PanelError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })??;
        if !response.is_success() {
            warn!(status = response.status, url = %url, "panel returned non-success status");
        }
        Ok(response)
    }
}
