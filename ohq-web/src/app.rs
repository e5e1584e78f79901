//! Widget root: wires the detection loop into the hunt session and keeps
//! the rendered snapshot in sync with the state machine.

use std::cell::RefCell;
use std::rc::Rc;

use yew::prelude::*;

use crate::components::{CompletionBanner, ProgressList, Scanner};
use crate::hunt::{self, WebSession};
use ohq_core::{Detection, ScanReport};

fn station_name(session: &WebSession, station_id: &str) -> String {
    session
        .registry()
        .get(station_id)
        .map_or_else(|| station_id.to_string(), |s| s.name.clone())
}

/// Apply one detection to the session and describe the outcome for the
/// status line. Shared by the scanner callback and the console bridge.
fn apply_detection(session: &Rc<RefCell<WebSession>>, detection: &Detection) -> Option<String> {
    let report = session.borrow_mut().record_scan(&detection.text);
    match report {
        Ok(ScanReport::Recorded {
            station_id,
            completed_all,
        }) => {
            let name = station_name(&session.borrow(), &station_id);
            Some(if completed_all {
                format!("Found {name}. That's every station!")
            } else {
                format!("Found {name}!")
            })
        }
        Ok(ScanReport::Duplicate { station_id }) => {
            let name = station_name(&session.borrow(), &station_id);
            Some(format!("{name} is already checked off"))
        }
        Ok(ScanReport::NoMatch) => {
            // Surface the raw payload so staff can diagnose mislabeled
            // codes; scanning simply continues.
            if hunt::looks_like_hunt_payload(&detection.text) {
                Some(format!(
                    "\u{201c}{}\u{201d} is not a station on this hunt",
                    detection.text.trim()
                ))
            } else {
                None
            }
        }
        Err(err) => {
            log::error!("failed to persist scan: {err}");
            // The in-memory map still advanced; the snapshot refresh below
            // keeps the UI truthful even if the store write failed.
            None
        }
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let session = use_mut_ref(hunt::create_web_session);
    let snapshot = use_state(|| session.borrow().snapshot());
    let token = use_state(|| session.borrow().token());
    let status_line = use_state(|| None::<String>);

    let on_detection = {
        let session = session.clone();
        let snapshot = snapshot.clone();
        let token = token.clone();
        let status_line = status_line.clone();
        Callback::from(move |detection: Detection| {
            let line = apply_detection(&session, &detection);
            if line.is_some() {
                status_line.set(line);
            }
            snapshot.set(session.borrow().snapshot());
            token.set(session.borrow().token());
        })
    };

    let on_reset = {
        let session = session.clone();
        let snapshot = snapshot.clone();
        let token = token.clone();
        let status_line = status_line.clone();
        Callback::from(move |()| {
            if let Err(err) = session.borrow_mut().reset() {
                log::error!("failed to clear saved progress: {err}");
            }
            snapshot.set(session.borrow().snapshot());
            token.set(None);
            status_line.set(None);
        })
    };

    {
        let session = session.clone();
        let on_detection = on_detection.clone();
        use_effect_with((), move |()| {
            crate::bridge::install(&session, &on_detection);
            || {}
        });
    }

    let registry = session.borrow().registry().clone();
    let completed = snapshot
        .flags
        .values()
        .filter(|done| **done)
        .count();
    let total = registry.len();

    html! {
        <main class="ohq-app">
            <header class="ohq-header">
                <h1>{ "Open House Quest" }</h1>
                <p class="ohq-tagline">{ "Scan the code at every station to finish the hunt." }</p>
            </header>
            {
                if let Some(token) = (*token).clone() {
                    html! { <CompletionBanner token={AttrValue::from(token)} on_reset={on_reset.clone()} /> }
                } else {
                    html! { <Scanner on_detection={on_detection} /> }
                }
            }
            if let Some(line) = (*status_line).clone() {
                <p class="ohq-status" role="status">{ line }</p>
            }
            <ProgressList registry={registry} snapshot={(*snapshot).clone()} />
            <footer class="ohq-footer">
                <span class="ohq-count">{ format!("{completed} of {total} stations found") }</span>
            </footer>
        </main>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn app_renders_scanner_and_full_station_list() {
        let html = block_on(LocalServerRenderer::<App>::new().render());
        assert!(html.contains("Open House Quest"));
        // Off-wasm the store is empty, so the hunt starts fresh.
        assert!(html.contains("0 of 6 stations found"));
        assert!(html.contains("ohq-video"));
        assert!(!html.contains("Hunt complete"));
    }

    #[test]
    fn detection_pipeline_reports_match_duplicate_and_miss() {
        let session = Rc::new(RefCell::new(hunt::create_web_session()));
        let hit = Detection::new("OPENHOUSE:LIBRARY");
        assert_eq!(
            apply_detection(&session, &hit).as_deref(),
            Some("Found Library!")
        );
        assert_eq!(
            apply_detection(&session, &hit).as_deref(),
            Some("Library is already checked off")
        );
        assert_eq!(
            apply_detection(&session, &Detection::new("OPENHOUSE:ROOFTOP")).as_deref(),
            Some("\u{201c}OPENHOUSE:ROOFTOP\u{201d} is not a station on this hunt")
        );
        assert_eq!(
            apply_detection(&session, &Detection::new("https://example.com")),
            None
        );
        assert_eq!(session.borrow().progress().completed_count(), 1);
    }
}
