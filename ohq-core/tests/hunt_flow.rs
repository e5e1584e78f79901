//! End-to-end hunt scenarios driven through the public session API.

use ohq_core::{
    COMPLETED_KEY, Clock, HuntSession, PROGRESS_KEY, ProgressStore, ScanReport, StationRegistry,
    completion_token,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

#[derive(Clone, Default)]
struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl ProgressStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SteppingClock {
    now: Rc<Cell<u64>>,
}

impl SteppingClock {
    fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

fn three_station_registry() -> StationRegistry {
    StationRegistry::from_json(
        r#"[
            {"id": "A", "name": "Station A", "code": "OPENHOUSE:A"},
            {"id": "B", "name": "Station B", "code": "OPENHOUSE:B"},
            {"id": "C", "name": "Station C", "code": "OPENHOUSE:C"}
        ]"#,
    )
    .unwrap()
}

#[test]
fn full_hunt_with_duplicates_latches_on_the_final_station() {
    let store = MemoryStore::default();
    let clock = SteppingClock::default();
    clock.now.set(1_700_000_000_000);
    let mut session = HuntSession::load(three_station_registry(), store.clone(), clock.clone());

    assert_eq!(
        session.record_scan("OPENHOUSE:A").unwrap(),
        ScanReport::Recorded {
            station_id: "A".into(),
            completed_all: false
        }
    );
    clock.advance(30_000);
    assert_eq!(
        session.record_scan("openhouse:b").unwrap(),
        ScanReport::Recorded {
            station_id: "B".into(),
            completed_all: false
        }
    );

    // Re-scanning A is a no-op: same count, no timestamp.
    clock.advance(30_000);
    assert_eq!(
        session.record_scan("OPENHOUSE:A").unwrap(),
        ScanReport::Duplicate {
            station_id: "A".into()
        }
    );
    assert_eq!(session.progress().completed_count(), 2);
    assert_eq!(session.progress().completed_at_ms(), None);
    assert!(session.token().is_none());

    clock.advance(30_000);
    let latch_instant = clock.now_ms();
    assert_eq!(
        session.record_scan("OPENHOUSE:C").unwrap(),
        ScanReport::Recorded {
            station_id: "C".into(),
            completed_all: true
        }
    );
    assert_eq!(session.progress().completed_count(), 3);
    assert_eq!(session.progress().completed_at_ms(), Some(latch_instant));
    assert_eq!(
        store.get(COMPLETED_KEY).unwrap().as_deref(),
        Some(latch_instant.to_string().as_str())
    );
    assert_eq!(
        session.token().as_deref(),
        Some(completion_token(latch_instant, session.registry()).as_str())
    );
}

#[test]
fn duplicate_and_garbage_scans_never_touch_the_timestamp_key() {
    let store = MemoryStore::default();
    let clock = SteppingClock::default();
    clock.now.set(5);
    let mut session = HuntSession::load(three_station_registry(), store.clone(), clock.clone());

    for raw in ["OPENHOUSE:A", "OPENHOUSE:B", "OPENHOUSE:C"] {
        session.record_scan(raw).unwrap();
        clock.advance(1);
    }
    let writes_after_completion = store.write_count();
    assert_eq!(store.get(COMPLETED_KEY).unwrap().as_deref(), Some("7"));

    // Everything after the latch is absorbed without store writes.
    for raw in ["OPENHOUSE:A", "OPENHOUSE:C", "OPENHOUSE:ROOFTOP", "", "junk"] {
        let report = session.record_scan(raw).unwrap();
        assert!(!matches!(report, ScanReport::Recorded { .. }), "{raw}");
        clock.advance(1);
    }
    assert_eq!(store.write_count(), writes_after_completion);
    assert_eq!(store.get(COMPLETED_KEY).unwrap().as_deref(), Some("7"));
}

#[test]
fn reset_rearms_the_hunt_for_a_new_run() {
    let store = MemoryStore::default();
    let clock = SteppingClock::default();
    clock.now.set(100);
    let mut session = HuntSession::load(three_station_registry(), store.clone(), clock.clone());

    for raw in ["OPENHOUSE:A", "OPENHOUSE:B", "OPENHOUSE:C"] {
        session.record_scan(raw).unwrap();
    }
    let first_token = session.token().unwrap();

    session.reset().unwrap();
    assert!(store.get(PROGRESS_KEY).unwrap().is_none());
    assert!(store.get(COMPLETED_KEY).unwrap().is_none());
    assert_eq!(session.progress().completed_count(), 0);
    assert!(session.token().is_none());

    // Completing again at a later instant produces a fresh latch and a
    // different token.
    clock.now.set(200);
    for raw in ["OPENHOUSE:C", "OPENHOUSE:A", "OPENHOUSE:B"] {
        session.record_scan(raw).unwrap();
    }
    assert_eq!(session.progress().completed_at_ms(), Some(200));
    assert_ne!(session.token().unwrap(), first_token);
}

#[test]
fn rehydrated_session_resumes_mid_hunt() {
    let store = MemoryStore::default();
    let clock = SteppingClock::default();
    {
        let mut session =
            HuntSession::load(three_station_registry(), store.clone(), clock.clone());
        session.record_scan("OPENHOUSE:B").unwrap();
    }

    // Same device, later page load.
    let clock2 = SteppingClock::default();
    clock2.now.set(999);
    let mut session = HuntSession::load(three_station_registry(), store.clone(), clock2);
    assert!(session.progress().is_done("B"));
    assert_eq!(session.progress().completed_count(), 1);

    session.record_scan("OPENHOUSE:A").unwrap();
    session.record_scan("OPENHOUSE:C").unwrap();
    assert_eq!(session.progress().completed_at_ms(), Some(999));
}

#[test]
fn shipped_station_registry_completes_end_to_end() {
    let registry = StationRegistry::load_from_static();
    assert!(!registry.is_empty());

    let store = MemoryStore::default();
    let clock = SteppingClock::default();
    clock.now.set(1_700_000_000_000);
    let codes: Vec<String> = registry
        .stations()
        .iter()
        .map(|s| s.code.clone())
        .collect();
    let mut session = HuntSession::load(registry, store, clock);
    for (i, code) in codes.iter().enumerate() {
        let report = session.record_scan(code).unwrap();
        let expect_complete = i + 1 == codes.len();
        assert_eq!(
            report,
            ScanReport::Recorded {
                station_id: session.registry().stations()[i].id.clone(),
                completed_all: expect_complete
            }
        );
    }
    assert!(session.progress().is_complete());
    let token = session.token().unwrap();
    assert!(token.starts_with("OHQ-"));
}
