use yew::prelude::*;

use ohq_core::{ProgressSnapshot, StationRegistry};

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub registry: StationRegistry,
    pub snapshot: ProgressSnapshot,
}

/// One row per station, in registry order. Hints only show for stations
/// still to be found.
#[function_component(ProgressList)]
pub fn progress_list(props: &Props) -> Html {
    let rows = props.registry.stations().iter().map(|station| {
        let done = props
            .snapshot
            .flags
            .get(&station.id)
            .copied()
            .unwrap_or(false);
        let class = if done { "ohq-station done" } else { "ohq-station" };
        let hint = if done { None } else { station.hint.clone() };
        html! {
            <li {class} key={station.id.clone()}>
                <span class="ohq-station-mark">{ if done { "✓" } else { "○" } }</span>
                <span class="ohq-station-name">{ station.name.clone() }</span>
                if let Some(hint) = hint {
                    <span class="ohq-station-hint">{ hint }</span>
                }
            </li>
        }
    });
    html! {
        <ul class="ohq-progress">
            { for rows }
        </ul>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    fn fixture() -> Props {
        let registry = StationRegistry::from_json(
            r#"[
                {"id": "GYM", "name": "Gymnasium", "code": "OPENHOUSE:GYM", "hint": "By the doors."},
                {"id": "LIBRARY", "name": "Library", "code": "OPENHOUSE:LIBRARY", "hint": "Upstairs."}
            ]"#,
        )
        .unwrap();
        let mut snapshot = ProgressSnapshot::default();
        snapshot.flags.insert("GYM".into(), true);
        snapshot.flags.insert("LIBRARY".into(), false);
        Props { registry, snapshot }
    }

    #[test]
    fn completed_stations_lose_their_hint() {
        let html = block_on(LocalServerRenderer::<ProgressList>::with_props(fixture()).render());
        assert!(html.contains("Gymnasium"));
        assert!(html.contains("Library"));
        assert!(!html.contains("By the doors."));
        assert!(html.contains("Upstairs."));
    }
}
