//! Form-body encoding for the panel's `/control` and `/login` endpoints.
//!
//! # Design
//! The start request embeds a not-quite-JSON literal in a form field:
//! `{"name":true ,"other":false}` with a space before every comma. Only the
//! punctuation is percent-encoded. Zone names are lower-cased and every
//! whitespace character becomes `+`, but nothing else in a name is escaped.
//! The server matches on these exact bytes, so the encoder reproduces them
//! rather than running a general-purpose form encoder over the literal.

use std::collections::BTreeMap;

use crate::error::PanelError;
use crate::types::ZoneStates;

/// Form fields preceding the encoded zone literal in a start request.
pub const START_PREFIX: &str = "&on=true&zone=";

/// Complete body of a stop request.
pub const STOP_BODY: &str = "&on=off&zone=";

const OPEN_BRACE: &str = "%7B";
const CLOSE_BRACE: &str = "%7D";
const QUOTE: &str = "%22";
const COLON: &str = "%3A";
const SEPARATOR: &str = "+%2C";

/// Encode `states` as the body of a start request.
///
/// ```
/// use pca_core::{encode_start_body, ZoneStates};
///
/// let states: ZoneStates = [("front", true), ("back yard", false)].into_iter().collect();
/// assert_eq!(
///     encode_start_body(&states),
///     "&on=true&zone=%7B%22front%22%3Atrue+%2C%22back+yard%22%3Afalse%7D"
/// );
/// ```
pub fn encode_start_body(states: &ZoneStates) -> String {
    let pairs: Vec<String> = states
        .iter()
        .map(|(name, on)| format!("{QUOTE}{}{QUOTE}{COLON}{on}", encode_zone_name(name)))
        .collect();
    format!("{START_PREFIX}{OPEN_BRACE}{}{CLOSE_BRACE}", pairs.join(SEPARATOR))
}

/// Lower-case a zone name and replace each whitespace character with `+`.
pub fn encode_zone_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if is_form_whitespace(c) { '+' } else { c })
        .collect()
}

// Space, tab, newline, vertical tab, form feed and carriage return.
fn is_form_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Decode the value of the `zone` form field back into zone states.
///
/// The inverse of the literal produced by `encode_start_body`. Entries come
/// back sorted by name since the literal is parsed as a JSON object.
pub fn decode_zone_field(raw: &str) -> Result<ZoneStates, PanelError> {
    let literal = form_decode(raw).map_err(PanelError::InvalidZoneField)?;
    let map: BTreeMap<String, bool> =
        serde_json::from_str(&literal).map_err(|e| PanelError::InvalidZoneField(e.to_string()))?;
    Ok(map.into_iter().collect())
}

/// `application/x-www-form-urlencoded` encoding of a single value.
pub fn form_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(b"0123456789ABCDEF"[(b >> 4) as usize]));
                out.push(char::from(b"0123456789ABCDEF"[(b & 0xf) as usize]));
            }
        }
    }
    out
}

/// Reverse `form_encode`: `+` becomes a space and `%XX` a byte.
pub fn form_decode(s: &str) -> Result<String, String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| format!("bad percent escape at offset {i}"))?;
                out.push(hex);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|e| e.to_string())
}
