//! Decoded-payload normalization and station matching.
//!
//! Matching is deliberately strict: after normalization the payload must
//! equal a registered code exactly. No prefix or fuzzy matching.

use crate::station::{Station, StationRegistry};

/// Canonical form used on both sides of a comparison: surrounding
/// whitespace stripped, literal `\:` unescaped (some QR encoders escape
/// the separator), and uppercased so matching is case-insensitive.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().replace("\\:", ":").to_uppercase()
}

/// Resolve a raw decoded payload to a registered station, or `None`.
/// Unmatched payloads are not errors; the caller keeps scanning.
#[must_use]
pub fn match_station<'r>(registry: &'r StationRegistry, raw: &str) -> Option<&'r Station> {
    let wanted = normalize(raw);
    if wanted.is_empty() {
        return None;
    }
    registry
        .stations()
        .iter()
        .find(|station| normalize(&station.code) == wanted)
}
