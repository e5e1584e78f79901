//! Completion token derivation.
//!
//! The token is a weak, human-checkable receipt for event staff. It is
//! recomputed from the completion timestamp and the station set on demand
//! and never stored. It is not an access credential.

use chrono::{DateTime, Utc};

use crate::station::StationRegistry;

const CHECKSUM_MODULUS: u32 = 997;
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36_upper(mut value: u64) -> String {
    if value == 0 {
        return String::from("0");
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Zero-padded `YYYY-MM-DD HH:MM`, rendered in UTC so the token does not
/// depend on the device timezone.
fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Derive the completion token for a finished hunt.
///
/// Deterministic for a fixed timestamp and registry: the first character
/// of every station id (registry order) is concatenated with the formatted
/// timestamp, the character codes of that string are summed modulo 997,
/// and the token is composed as `OHQ-<checksum>-<millis>`, both parts in
/// uppercase base-36.
#[must_use]
pub fn completion_token(completed_at_ms: u64, registry: &StationRegistry) -> String {
    let mut seed = String::new();
    for station in registry.stations() {
        if let Some(initial) = station.id.chars().next() {
            seed.push(initial);
        }
    }
    seed.push_str(&format_timestamp(completed_at_ms));

    let checksum = seed.chars().map(|c| c as u32).sum::<u32>() % CHECKSUM_MODULUS;
    format!(
        "OHQ-{}-{}",
        to_base36_upper(u64::from(checksum)),
        to_base36_upper(completed_at_ms)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::Station;

    fn registry(ids: &[&str]) -> StationRegistry {
        StationRegistry::new(
            ids.iter()
                .map(|id| Station {
                    id: (*id).to_string(),
                    name: (*id).to_string(),
                    code: format!("OPENHOUSE:{id}"),
                    hint: None,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn token_is_reproducible_for_fixed_inputs() {
        let registry = registry(&["A", "B", "C"]);
        let token = completion_token(1_700_000_000_000, &registry);
        assert_eq!(token, "OHQ-R4-LOYW3V28");
        assert_eq!(completion_token(1_700_000_000_000, &registry), token);
    }

    #[test]
    fn token_depends_on_station_set_and_instant() {
        let abc = registry(&["A", "B", "C"]);
        let abd = registry(&["A", "B", "D"]);
        assert_ne!(
            completion_token(1_700_000_000_000, &abc),
            completion_token(1_700_000_000_000, &abd)
        );
        assert_ne!(
            completion_token(1_700_000_000_000, &abc),
            completion_token(1_700_000_060_000, &abc)
        );
    }

    #[test]
    fn base36_rendering() {
        assert_eq!(to_base36_upper(0), "0");
        assert_eq!(to_base36_upper(35), "Z");
        assert_eq!(to_base36_upper(36), "10");
        assert_eq!(to_base36_upper(976), "R4");
    }

    #[test]
    fn timestamp_formats_zero_padded_utc() {
        // 2023-11-14T22:13:20Z
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13");
        // Early-month instant keeps its zero padding.
        assert_eq!(format_timestamp(1_704_070_861_000), "2024-01-01 01:01");
    }
}
