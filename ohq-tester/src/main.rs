mod scenarios;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use colored::Colorize;

use scenarios::{SCENARIOS, Scenario, ScenarioCtx, find_scenario};

#[derive(Debug, Parser)]
#[command(name = "ohq-tester", version = "0.1.0")]
#[command(about = "Automated QA for the Open House Quest hunt logic")]
struct Args {
    /// Scenarios to run (comma-separated), or "all"
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seed for randomized scenarios
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn selected_scenarios(spec: &str) -> Result<Vec<&'static Scenario>, String> {
    if spec.trim() == "all" {
        return Ok(SCENARIOS.iter().collect());
    }
    spec.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| find_scenario(name).ok_or_else(|| name.to_string()))
        .collect()
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        for scenario in SCENARIOS {
            println!("{:<12} {}", scenario.name.bold(), scenario.description);
        }
        return ExitCode::SUCCESS;
    }

    let selected = match selected_scenarios(&args.scenarios) {
        Ok(selected) if !selected.is_empty() => selected,
        Ok(_) => {
            eprintln!("{}", "no scenarios selected".red());
            return ExitCode::FAILURE;
        }
        Err(unknown) => {
            eprintln!(
                "{} unknown scenario `{unknown}` (try --list-scenarios)",
                "error:".red().bold()
            );
            return ExitCode::FAILURE;
        }
    };

    let ctx = ScenarioCtx {
        seed: args.seed,
        verbose: args.verbose,
    };
    let mut failures = 0_u8;
    for scenario in &selected {
        let started = Instant::now();
        match (scenario.run)(&ctx) {
            Ok(()) => {
                println!(
                    "{} {:<12} ({:.0?})",
                    "PASS".green().bold(),
                    scenario.name,
                    started.elapsed()
                );
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                println!("{} {:<12} {err:#}", "FAIL".red().bold(), scenario.name);
            }
        }
    }

    let passed = selected.len() - usize::from(failures);
    println!("\n{passed} passed, {failures} failed");
    ExitCode::from(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_passes_with_the_default_seed() {
        let ctx = ScenarioCtx {
            seed: 1337,
            verbose: false,
        };
        for scenario in SCENARIOS {
            (scenario.run)(&ctx).unwrap_or_else(|err| {
                panic!("scenario {} failed: {err:#}", scenario.name);
            });
        }
    }

    #[test]
    fn scenario_selection_parses_csv_and_rejects_unknown_names() {
        let names: Vec<&str> = selected_scenarios("smoke, reset")
            .unwrap()
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["smoke", "reset"]);
        assert!(matches!(selected_scenarios("bogus"), Err(name) if name == "bogus"));
        assert_eq!(selected_scenarios("all").unwrap().len(), SCENARIOS.len());
    }
}
