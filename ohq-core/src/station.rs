//! Station registry configuration
use serde::{Deserialize, Serialize};

use crate::payload;

const DEFAULT_STATIONS_DATA: &str =
    include_str!("../../ohq-web/static/assets/data/stations.json");

/// A single quest stop participants have to find.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Station {
    /// Unique key, also embedded in the expected payload
    pub id: String,
    /// Display label
    pub name: String,
    /// Exact payload the station's QR code carries
    pub code: String,
    /// Optional nudge shown for stations not yet found
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate station id `{0}`")]
    DuplicateId(String),
    #[error("duplicate station code `{0}`")]
    DuplicateCode(String),
    #[error("station `{0}` has an empty code")]
    EmptyCode(String),
    #[error("station config error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered, validated set of stations. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    /// Build a registry, enforcing unique ids and unique, non-empty codes.
    /// Code uniqueness is checked on the normalized form so two codes that
    /// would match the same scan cannot coexist.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` describing the first violated invariant.
    pub fn new(stations: Vec<Station>) -> Result<Self, RegistryError> {
        let mut ids: Vec<&str> = Vec::with_capacity(stations.len());
        let mut codes: Vec<String> = Vec::with_capacity(stations.len());
        for station in &stations {
            if ids.contains(&station.id.as_str()) {
                return Err(RegistryError::DuplicateId(station.id.clone()));
            }
            let code = payload::normalize(&station.code);
            if code.is_empty() {
                return Err(RegistryError::EmptyCode(station.id.clone()));
            }
            if codes.contains(&code) {
                return Err(RegistryError::DuplicateCode(station.code.clone()));
            }
            ids.push(&station.id);
            codes.push(code);
        }
        Ok(Self { stations })
    }

    /// Parse and validate a registry from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` if the JSON is malformed or an invariant
    /// is violated.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let stations: Vec<Station> = serde_json::from_str(json)?;
        Self::new(stations)
    }

    /// Load the registry shipped with the web assets.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_STATIONS_DATA).unwrap_or_default()
    }

    /// Look up a station by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// All stations in declaration order.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
