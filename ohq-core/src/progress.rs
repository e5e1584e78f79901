//! Hunt progress state machine.
//!
//! `HuntProgress` is the sole writer of the per-station completion flags
//! and the completion timestamp. The timestamp is a one-way latch: it is
//! recorded by the specific scan that makes the map fully complete, and
//! only `reset` clears it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::station::StationRegistry;

/// Result of applying one validated scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The station was newly marked complete. `completed_all` is true when
    /// this particular update finished the hunt.
    Recorded { completed_all: bool },
    /// The station was already complete; nothing changed.
    AlreadyComplete,
    /// The id does not belong to the registry backing this map.
    UnknownStation,
}

/// Read-model of the current progress, cheap to clone and compare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub flags: BTreeMap<String, bool>,
    pub completed_at_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuntProgress {
    done: BTreeMap<String, bool>,
    completed_at_ms: Option<u64>,
}

impl HuntProgress {
    /// Fresh all-false map with exactly one entry per registered station.
    #[must_use]
    pub fn new(registry: &StationRegistry) -> Self {
        let done = registry
            .stations()
            .iter()
            .map(|s| (s.id.clone(), false))
            .collect();
        Self {
            done,
            completed_at_ms: None,
        }
    }

    /// Rehydrate from persisted flags. The map is reconciled against the
    /// registry: ids the registry no longer knows are dropped, new ids
    /// default to false. A persisted completion timestamp is honored only
    /// if the reconciled map is still fully complete; otherwise the latch
    /// re-arms.
    #[must_use]
    pub fn from_saved(
        registry: &StationRegistry,
        saved: &BTreeMap<String, bool>,
        completed_at_ms: Option<u64>,
    ) -> Self {
        let done: BTreeMap<String, bool> = registry
            .stations()
            .iter()
            .map(|s| (s.id.clone(), saved.get(&s.id).copied().unwrap_or(false)))
            .collect();
        let all_done = !done.is_empty() && done.values().all(|d| *d);
        Self {
            done,
            completed_at_ms: completed_at_ms.filter(|_| all_done),
        }
    }

    /// Mark a station complete. Idempotent for already-complete stations.
    ///
    /// Completion is evaluated against the map *after* the flag flip, so
    /// the latch fires on exactly the scan that finishes the hunt.
    pub fn apply_scan(&mut self, station_id: &str, now_ms: u64) -> ScanOutcome {
        let Some(flag) = self.done.get_mut(station_id) else {
            return ScanOutcome::UnknownStation;
        };
        if *flag {
            return ScanOutcome::AlreadyComplete;
        }
        *flag = true;
        let completed_all = self.done.values().all(|d| *d);
        if completed_all && self.completed_at_ms.is_none() {
            self.completed_at_ms = Some(now_ms);
        }
        ScanOutcome::Recorded { completed_all }
    }

    /// Clear every flag and the completion timestamp.
    pub fn reset(&mut self) {
        for flag in self.done.values_mut() {
            *flag = false;
        }
        self.completed_at_ms = None;
    }

    #[must_use]
    pub fn is_done(&self, station_id: &str) -> bool {
        self.done.get(station_id).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.done.values().filter(|d| **d).count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.done.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.done.is_empty() && self.done.values().all(|d| *d)
    }

    #[must_use]
    pub fn completed_at_ms(&self) -> Option<u64> {
        self.completed_at_ms
    }

    /// Persisted representation of the flags.
    #[must_use]
    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.done
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            flags: self.done.clone(),
            completed_at_ms: self.completed_at_ms,
        }
    }
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
    fn scan_flips_only_the_target_station() {
        let mut progress = HuntProgress::new(&registry(&["A", "B", "C"]));
        assert_eq!(
            progress.apply_scan("B", 10),
            ScanOutcome::Recorded {
                completed_all: false
            }
        );
        assert!(progress.is_done("B"));
        assert!(!progress.is_done("A"));
        assert!(!progress.is_done("C"));
        assert_eq!(progress.completed_count(), 1);
        assert_eq!(progress.completed_at_ms(), None);
    }

    #[test]
    fn duplicate_scan_is_a_noop() {
        let mut progress = HuntProgress::new(&registry(&["A", "B"]));
        progress.apply_scan("A", 1);
        let before = progress.snapshot();
        assert_eq!(progress.apply_scan("A", 2), ScanOutcome::AlreadyComplete);
        assert_eq!(progress.snapshot(), before);
    }

    #[test]
    fn latch_fires_on_the_completing_scan_and_only_once() {
        let mut progress = HuntProgress::new(&registry(&["A", "B", "C"]));
        progress.apply_scan("A", 1);
        progress.apply_scan("B", 2);
        assert_eq!(progress.completed_at_ms(), None);
        assert_eq!(
            progress.apply_scan("C", 3),
            ScanOutcome::Recorded {
                completed_all: true
            }
        );
        assert_eq!(progress.completed_at_ms(), Some(3));
        // Later duplicate scans never move the timestamp.
        progress.apply_scan("A", 99);
        assert_eq!(progress.completed_at_ms(), Some(3));
    }

    #[test]
    fn unknown_station_is_rejected_without_side_effects() {
        let mut progress = HuntProgress::new(&registry(&["A"]));
        assert_eq!(progress.apply_scan("Z", 1), ScanOutcome::UnknownStation);
        assert_eq!(progress.completed_count(), 0);
    }

    #[test]
    fn reset_clears_flags_and_timestamp() {
        let mut progress = HuntProgress::new(&registry(&["A", "B"]));
        progress.apply_scan("A", 1);
        progress.apply_scan("B", 2);
        assert!(progress.is_complete());
        progress.reset();
        assert!(!progress.is_complete());
        assert_eq!(progress.completed_count(), 0);
        assert_eq!(progress.completed_at_ms(), None);
        // The latch re-arms after reset.
        progress.apply_scan("A", 5);
        progress.apply_scan("B", 6);
        assert_eq!(progress.completed_at_ms(), Some(6));
    }

    #[test]
    fn saved_state_is_reconciled_against_the_registry() {
        let old = registry(&["A", "B"]);
        let mut progress = HuntProgress::new(&old);
        progress.apply_scan("A", 1);
        progress.apply_scan("B", 2);
        let saved = progress.flags().clone();

        // A third station was added since the save; the stale timestamp
        // must not survive an incomplete reconciled map.
        let grown = registry(&["A", "B", "C"]);
        let restored = HuntProgress::from_saved(&grown, &saved, progress.completed_at_ms());
        assert_eq!(restored.total(), 3);
        assert_eq!(restored.completed_count(), 2);
        assert_eq!(restored.completed_at_ms(), None);

        // Unknown ids from the save are dropped.
        let shrunk = registry(&["A"]);
        let restored = HuntProgress::from_saved(&shrunk, &saved, Some(2));
        assert_eq!(restored.total(), 1);
        assert!(restored.is_complete());
        assert_eq!(restored.completed_at_ms(), Some(2));
    }
}
