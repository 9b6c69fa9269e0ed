//! In-process stand-in for the PCA panel's web control interface.
//!
//! Mirrors the endpoints the client talks to: `/` issues an `_xsrf` cookie,
//! `/zones` lists zones, `/login` checks the password and rotates the cookie,
//! and `/control` starts or stops zones. State-changing requests must echo the
//! cookie's token in `X-Csrftoken`, as the real panel requires.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const XSRF_COOKIE: &str = "_xsrf";
pub const XSRF_HEADER: &str = "x-csrftoken";

#[derive(Clone, Debug)]
pub struct PanelConfig {
    pub password: String,
    pub zones: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            password: "secret".to_string(),
            zones: vec!["front".to_string(), "back yard".to_string(), "greenhouse".to_string()],
        }
    }
}

/// What `POST /control` reports after applying a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStatus {
    pub running: bool,
    pub zones: BTreeMap<String, bool>,
}

#[derive(Debug)]
pub struct Panel {
    password: String,
    zones: BTreeMap<String, bool>,
    running: bool,
    issued: HashSet<String>,
    authenticated: HashSet<String>,
}

impl Panel {
    fn new(config: PanelConfig) -> Self {
        Self {
            password: config.password,
            zones: config.zones.into_iter().map(|z| (z, false)).collect(),
            running: false,
            issued: HashSet::new(),
            authenticated: HashSet::new(),
        }
    }

    fn status(&self) -> ControlStatus {
        ControlStatus {
            running: self.running,
            zones: self.zones.clone(),
        }
    }
}

pub type Db = Arc<RwLock<Panel>>;

pub fn app() -> Router {
    app_with(PanelConfig::default())
}

pub fn app_with(config: PanelConfig) -> Router {
    let db: Db = Arc::new(RwLock::new(Panel::new(config)));
    Router::new()
        .route("/", get(home))
        .route("/zones", get(list_zones))
        .route("/login", post(login))
        .route("/control", get(control_page).post(control))
        .with_state(db)
}

pub async fn run(listener: TcpListener, config: PanelConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn home(State(db): State<Db>) -> Response {
    let token = new_token();
    db.write().await.issued.insert(token.clone());
    debug!("issued anonymous xsrf token");
    (
        [(header::SET_COOKIE, xsrf_cookie(&token))],
        Html("<html><body><h1>PCA</h1><a href=\"/login\">Log in</a></body></html>"),
    )
        .into_response()
}

async fn list_zones(State(db): State<Db>) -> Json<BTreeMap<String, bool>> {
    Json(db.read().await.zones.clone())
}

async fn login(State(db): State<Db>, headers: HeaderMap, body: String) -> Response {
    let mut panel = db.write().await;
    let Some(token) = cookie_token(&headers) else {
        return forbidden("missing _xsrf cookie");
    };
    if !panel.issued.contains(&token) && !panel.authenticated.contains(&token) {
        return forbidden("unknown _xsrf cookie");
    }
    let form = parse_form(&body);
    if header_token(&headers).as_deref() != Some(token.as_str())
        || form_field(&form, XSRF_COOKIE) != Some(token.as_str())
    {
        return forbidden("XSRF cookie does not match");
    }

    let password = form_field(&form, "password")
        .map(form_decode)
        .transpose()
        .ok()
        .flatten();
    if password.as_deref() != Some(panel.password.as_str()) {
        return (StatusCode::UNAUTHORIZED, "invalid password").into_response();
    }

    panel.issued.remove(&token);
    let session = new_token();
    panel.authenticated.insert(session.clone());
    info!("login accepted");
    (
        [(header::SET_COOKIE, xsrf_cookie(&session))],
        Json(serde_json::json!({ "status": "ok" })),
    )
        .into_response()
}

async fn control_page(State(db): State<Db>, headers: HeaderMap) -> Response {
    let panel = db.read().await;
    if !is_authenticated(&panel, &headers) {
        return forbidden("login required");
    }
    let rows: String = panel
        .zones
        .iter()
        .map(|(name, on)| format!("<li>{name}: {}</li>", if *on { "on" } else { "off" }))
        .collect();
    Html(format!(
        "<html><body><h1>Control</h1><p>running: {}</p><ul>{rows}</ul></body></html>",
        panel.running
    ))
    .into_response()
}

async fn control(State(db): State<Db>, headers: HeaderMap, body: String) -> Response {
    let mut panel = db.write().await;
    if !is_authenticated(&panel, &headers) {
        return forbidden("login required");
    }
    if header_token(&headers) != cookie_token(&headers) {
        return forbidden("XSRF cookie does not match");
    }

    let form = parse_form(&body);
    match form_field(&form, "on") {
        Some("true") => {
            let requested = match form_field(&form, "zone").map(decode_zones) {
                Some(Ok(zones)) => zones,
                Some(Err(msg)) => return (StatusCode::BAD_REQUEST, msg).into_response(),
                None => return (StatusCode::BAD_REQUEST, "missing zone field").into_response(),
            };
            if let Some(unknown) = requested
                .keys()
                .find(|name| !panel.zones.contains_key(name.as_str()))
            {
                return (StatusCode::BAD_REQUEST, format!("unknown zone: {unknown}")).into_response();
            }
            for (name, on) in panel.zones.iter_mut() {
                *on = requested.get(name).copied().unwrap_or(false);
            }
            panel.running = panel.zones.values().any(|on| *on);
            info!(running = panel.running, "zones started");
        }
        Some("off") => {
            panel.zones.values_mut().for_each(|on| *on = false);
            panel.running = false;
            info!("zones stopped");
        }
        _ => return (StatusCode::BAD_REQUEST, "missing on field").into_response(),
    }
    Json(panel.status()).into_response()
}

fn forbidden(msg: &'static str) -> Response {
    (StatusCode::FORBIDDEN, msg).into_response()
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn xsrf_cookie(token: &str) -> String {
    format!("{XSRF_COOKIE}={token}; Path=/")
}

fn is_authenticated(panel: &Panel, headers: &HeaderMap) -> bool {
    cookie_token(headers).is_some_and(|token| panel.authenticated.contains(&token))
}

/// Value of the `_xsrf` pair in the `Cookie` header. Attributes such as
/// `Path=/` are tolerated since clients may echo the raw `Set-Cookie`.
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, _)| *name == XSRF_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(XSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Split a form body into raw (still encoded) name/value pairs.
pub fn parse_form(body: &str) -> Vec<(&str, &str)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect()
}

fn form_field<'a>(form: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    form.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
}

/// Decode the `zone` field: a percent-encoded `{"name":bool ,...}` literal.
pub fn decode_zones(raw: &str) -> Result<BTreeMap<String, bool>, String> {
    let literal = form_decode(raw)?;
    serde_json::from_str(&literal).map_err(|e| format!("bad zone field: {e}"))
}

pub fn form_decode(raw: &str) -> Result<String, String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let byte = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| format!("bad percent escape at offset {i}"))?;
                out.push(byte);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).map_err(|e| e.to_string())
}
