//! Scripted scan scenarios run against the hunt state machine.
//!
//! Each scenario drives a `HuntSession` over an in-memory store and a
//! scripted clock, then checks the invariants the widget relies on:
//! flag isolation, duplicate idempotence, the one-shot completion latch,
//! reset semantics, and token determinism.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use anyhow::{Context, Result, bail, ensure};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

use ohq_core::{
    COMPLETED_KEY, Clock, HuntSession, PROGRESS_KEY, ProgressSnapshot, ProgressStore, ScanReport,
    StationRegistry, completion_token,
};

pub struct ScenarioCtx {
    pub seed: u64,
    pub verbose: bool,
}

pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&ScenarioCtx) -> Result<()>,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "smoke",
        description: "scan every station once in order; latch fires on the last",
        run: run_smoke,
    },
    Scenario {
        name: "idempotence",
        description: "duplicate and garbage scans leave state and store untouched",
        run: run_idempotence,
    },
    Scenario {
        name: "shuffle",
        description: "seeded random scan order with noise converges to the same terminal state",
        run: run_shuffle,
    },
    Scenario {
        name: "reset",
        description: "complete, reset, re-complete; fresh latch and token each run",
        run: run_reset,
    },
];

#[must_use]
pub fn find_scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

#[derive(Clone, Default)]
struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<usize>>,
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

#[derive(Clone)]
struct ScriptedClock {
    now: Rc<Cell<u64>>,
    step: u64,
}

impl ScriptedClock {
    fn starting_at(start: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
            step: 1_000,
        }
    }
}

impl Clock for ScriptedClock {
    fn now_ms(&self) -> u64 {
        // Every read advances the script so each scan lands on a distinct
        // instant, the way real scans do.
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

const SCRIPT_EPOCH_MS: u64 = 1_700_000_000_000;

fn fresh_session(start_ms: u64) -> (HuntSession<MemoryStore, ScriptedClock>, MemoryStore) {
    let store = MemoryStore::default();
    let session = HuntSession::load(
        StationRegistry::load_from_static(),
        store.clone(),
        ScriptedClock::starting_at(start_ms),
    );
    (session, store)
}

fn station_codes(session: &HuntSession<MemoryStore, ScriptedClock>) -> Vec<String> {
    session
        .registry()
        .stations()
        .iter()
        .map(|s| s.code.clone())
        .collect()
}

fn describe_latch(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(i64::try_from(ms).unwrap_or_default())
        .map_or_else(|| format!("{ms} ms"), |dt| dt.to_rfc3339())
}

fn run_smoke(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, store) = fresh_session(SCRIPT_EPOCH_MS);
    let codes = station_codes(&session);
    let total = codes.len();
    ensure!(total > 0, "shipped registry must not be empty");

    for (i, code) in codes.iter().enumerate() {
        let report = session
            .record_scan(code)
            .context("store write must succeed")?;
        let expect_complete = i + 1 == total;
        match report {
            ScanReport::Recorded {
                completed_all, ..
            } => ensure!(
                completed_all == expect_complete,
                "scan {i} reported completed_all={completed_all}, expected {expect_complete}"
            ),
            other => bail!("scan {i} was not recorded: {other:?}"),
        }
        ensure!(
            session.progress().completed_count() == i + 1,
            "count mismatch after scan {i}"
        );
        if expect_complete {
            ensure!(
                session.progress().completed_at_ms().is_some(),
                "latch missing after final scan"
            );
        } else {
            ensure!(
                session.progress().completed_at_ms().is_none(),
                "latch fired early at scan {i}"
            );
        }
    }

    let latch = session
        .progress()
        .completed_at_ms()
        .context("completed hunt must have a latch instant")?;
    let token = session.token().context("completed hunt must have a token")?;
    ensure!(
        token == completion_token(latch, session.registry()),
        "session token must be derived from the latch instant"
    );
    ensure!(
        store.get(COMPLETED_KEY)?.as_deref() == Some(latch.to_string().as_str()),
        "persisted latch disagrees with the in-memory one"
    );
    let persisted = store
        .get(PROGRESS_KEY)?
        .context("completed hunt must persist its map")?;
    let persisted: std::collections::BTreeMap<String, bool> = serde_json::from_str(&persisted)
        .context("persisted map must be a JSON object of id to bool")?;
    ensure!(
        persisted.len() == total && persisted.values().all(|done| *done),
        "persisted map must mirror the completed hunt"
    );
    if ctx.verbose {
        println!("  latched at {} with token {token}", describe_latch(latch));
    }
    Ok(())
}

fn run_idempotence(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, store) = fresh_session(SCRIPT_EPOCH_MS);
    let codes = station_codes(&session);
    let first = codes.first().context("registry must not be empty")?;

    session.record_scan(first)?;
    let snapshot = session.snapshot();
    let writes = store.writes.get();

    // Duplicates and junk must change nothing, in memory or in the store.
    let noise = [
        first.as_str(),
        "OPENHOUSE:ROOFTOP",
        "https://example.com/lunch-menu",
        "",
        "   ",
    ];
    for raw in noise {
        let report = session.record_scan(raw)?;
        ensure!(
            !matches!(report, ScanReport::Recorded { .. }),
            "`{raw}` must not record anything"
        );
    }
    ensure!(session.snapshot() == snapshot, "state drifted on no-op scans");
    ensure!(
        store.writes.get() == writes,
        "no-op scans must not write to the store"
    );

    // Case and whitespace variants of an already-complete code are still
    // duplicates, not new stations.
    let relaxed = format!("  {}  ", first.to_lowercase());
    ensure!(
        matches!(session.record_scan(&relaxed)?, ScanReport::Duplicate { .. }),
        "normalized variant must resolve to the same station"
    );
    if ctx.verbose {
        println!("  {} no-op payloads absorbed", noise.len() + 1);
    }
    Ok(())
}

fn run_shuffle(ctx: &ScenarioCtx) -> Result<()> {
    let run_once = |seed: u64| -> Result<(ProgressSnapshot, Option<String>)> {
        let (mut session, _store) = fresh_session(SCRIPT_EPOCH_MS);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut codes = station_codes(&session);
        codes.shuffle(&mut rng);

        for code in &codes {
            // Noise between every real scan: unregistered payloads and
            // re-scans of codes already applied.
            session.record_scan("OPENHOUSE:BROOM_CLOSET")?;
            session.record_scan(code)?;
            session.record_scan(code)?;
        }
        ensure!(session.progress().is_complete(), "hunt must complete");
        Ok((session.snapshot(), session.token()))
    };

    let (first_snapshot, first_token) = run_once(ctx.seed)?;
    let (second_snapshot, second_token) = run_once(ctx.seed)?;
    ensure!(
        first_snapshot == second_snapshot && first_token == second_token,
        "identical seeds must converge to identical terminal state"
    );

    let (other_snapshot, _) = run_once(ctx.seed.wrapping_add(1))?;
    ensure!(
        other_snapshot.flags == first_snapshot.flags,
        "scan order must not affect the final flags"
    );
    if ctx.verbose {
        println!(
            "  converged with token {}",
            first_token.unwrap_or_default()
        );
    }
    Ok(())
}

fn run_reset(ctx: &ScenarioCtx) -> Result<()> {
    let (mut session, store) = fresh_session(SCRIPT_EPOCH_MS);
    let codes = station_codes(&session);

    for code in &codes {
        session.record_scan(code)?;
    }
    let first_token = session.token().context("first run must produce a token")?;

    session.reset()?;
    ensure!(
        store.get(PROGRESS_KEY)?.is_none() && store.get(COMPLETED_KEY)?.is_none(),
        "reset must erase both persisted keys"
    );
    ensure!(
        session.progress().completed_count() == 0
            && session.progress().completed_at_ms().is_none(),
        "reset must clear the in-memory map and latch"
    );

    // A later second run gets its own latch, and with it a new token.
    for code in &codes {
        session.record_scan(code)?;
    }
    let second_token = session.token().context("second run must produce a token")?;
    ensure!(
        second_token != first_token,
        "re-completion at a later instant must mint a different token"
    );
    if ctx.verbose {
        println!("  tokens: {first_token} then {second_token}");
    }
    Ok(())
}
