//! Hunt session: the dependency-injected composition of station registry,
//! progress store, and clock.
//!
//! The session is the only component that touches the persistent store.
//! Every mutation is written through immediately; there is no batching.

use std::collections::BTreeMap;

use crate::payload;
use crate::progress::{HuntProgress, ProgressSnapshot, ScanOutcome};
use crate::station::StationRegistry;
use crate::token::completion_token;
use crate::{Clock, ProgressStore};

/// Store key for the persisted completion map (JSON object of id → bool).
pub const PROGRESS_KEY: &str = "ohq_progress_v1";
/// Store key for the completion instant (stringified epoch milliseconds).
pub const COMPLETED_KEY: &str = "ohq_completed_v1";

/// What happened to one raw payload fed into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanReport {
    /// The payload does not belong to any registered station.
    NoMatch,
    /// The station was already complete; nothing was written.
    Duplicate { station_id: String },
    /// The station was newly completed and persisted.
    Recorded {
        station_id: String,
        completed_all: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("progress store error: {0}")]
    Store(#[source] E),
    #[error("progress serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct HuntSession<S, C>
where
    S: ProgressStore,
    C: Clock,
{
    registry: StationRegistry,
    store: S,
    clock: C,
    progress: HuntProgress,
}

impl<S, C> HuntSession<S, C>
where
    S: ProgressStore,
    C: Clock,
{
    /// Build a session, rehydrating progress from the store.
    ///
    /// Unreadable or corrupt persisted state is treated as "no saved
    /// progress": the hunt starts fresh rather than failing to mount.
    #[must_use]
    pub fn load(registry: StationRegistry, store: S, clock: C) -> Self {
        let saved_flags = match store.get(PROGRESS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<BTreeMap<String, bool>>(&json) {
                Ok(flags) => flags,
                Err(err) => {
                    log::warn!("discarding unreadable saved progress: {err}");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                log::warn!("progress store unavailable, starting fresh: {err}");
                BTreeMap::new()
            }
        };
        let completed_at_ms = match store.get(COMPLETED_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().ok(),
            _ => None,
        };
        let progress = HuntProgress::from_saved(&registry, &saved_flags, completed_at_ms);
        Self {
            registry,
            store,
            clock,
            progress,
        }
    }

    /// Validate one raw decoded payload and apply it.
    ///
    /// The whole scan pipeline runs here: normalization and matching, the
    /// idempotent flag flip, write-through of the updated map, and the
    /// one-time completion latch (persisted only by the scan that fires
    /// it).
    ///
    /// # Errors
    ///
    /// Returns a `SessionError` when the store rejects a write. The
    /// in-memory map keeps the applied mutation either way.
    pub fn record_scan(&mut self, raw: &str) -> Result<ScanReport, SessionError<S::Error>> {
        let Some(station) = payload::match_station(&self.registry, raw) else {
            return Ok(ScanReport::NoMatch);
        };
        let station_id = station.id.clone();
        match self.progress.apply_scan(&station_id, self.clock.now_ms()) {
            // The map always mirrors the registry, so a matched station is
            // never unknown; treat it as no match if it ever happens.
            ScanOutcome::UnknownStation => Ok(ScanReport::NoMatch),
            ScanOutcome::AlreadyComplete => Ok(ScanReport::Duplicate { station_id }),
            ScanOutcome::Recorded { completed_all } => {
                let json = serde_json::to_string(self.progress.flags())?;
                self.store
                    .set(PROGRESS_KEY, &json)
                    .map_err(SessionError::Store)?;
                if completed_all && let Some(ms) = self.progress.completed_at_ms() {
                    self.store
                        .set(COMPLETED_KEY, &ms.to_string())
                        .map_err(SessionError::Store)?;
                }
                Ok(ScanReport::Recorded {
                    station_id,
                    completed_all,
                })
            }
        }
    }

    /// Clear all progress and erase both persisted keys. Synchronous:
    /// reads issued after this call see the cleared state.
    ///
    /// # Errors
    ///
    /// Returns a `SessionError` when the store rejects a removal.
    pub fn reset(&mut self) -> Result<(), SessionError<S::Error>> {
        self.progress.reset();
        self.store
            .remove(PROGRESS_KEY)
            .map_err(SessionError::Store)?;
        self.store
            .remove(COMPLETED_KEY)
            .map_err(SessionError::Store)?;
        Ok(())
    }

    /// Completion token, present once the hunt is complete.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.progress
            .completed_at_ms()
            .map(|ms| completion_token(ms, &self.registry))
    }

    #[must_use]
    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    #[must_use]
    pub fn progress(&self) -> &HuntProgress {
        &self.progress
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }
}
