//! Session client for a PCA irrigation panel's web control interface.
//!
//! # Overview
//! The panel exposes `/`, `/zones`, `/login` and `/control`. A client fetches
//! the landing page to obtain an XSRF cookie, logs in with a password, then
//! starts or stops the pump-control-area (PCA) system for a set of zones.
//!
//! # Design
//! - `PanelClient` is stateless: `build_*` methods produce `HttpRequest`
//!   values and `parse_*` functions interpret `HttpResponse` values, so the
//!   wire contract is testable without a network.
//! - `PanelSession` owns a `Transport` and the captured cookie/token and
//!   exposes the async API callers actually use.
//! - `encoder` reproduces the panel's bespoke start-request encoding byte for
//!   byte.
//!
//! ```no_run
//! use pca_core::{ClientConfig, PanelSession};
//!
//! # async fn run() -> Result<(), pca_core::PanelError> {
//! let config = ClientConfig::from_env()?;
//! let session = PanelSession::new(&config);
//! session.fetch_home().await?;
//! session.fetch_zones().await?;
//! session.login("secret").await?;
//!
//! let mut states = session.zone_names().await?.to_states(false);
//! states.set("front", true);
//! session.start_zones(&states).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod cookie;
pub mod encoder;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{parse_zone_names, PanelClient};
pub use config::{ClientConfig, ClientConfigBuilder, TlsVerification};
pub use cookie::derive_xsrf_token;
pub use encoder::{decode_zone_field, encode_start_body, STOP_BODY};
pub use error::{ErrorKind, PanelError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::PanelSession;
pub use transport::{Transport, UreqTransport};
pub use types::{ZoneSet, ZoneStates};
