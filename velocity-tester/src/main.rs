mod scenarios;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;

use scenarios::{SCENARIO_NAMES, ScenarioReport, run_scenario};

#[derive(Debug, Parser)]
#[command(name = "velocity-tester", version)]
#[command(about = "Scenario QA for the VelocityX race configuration engine")]
struct Args {
    /// Scenarios to run (comma-separated), or "all"
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Emit the full report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn selected_scenarios(arg: &str) -> Result<Vec<&str>> {
    if arg.trim().eq_ignore_ascii_case("all") {
        return Ok(SCENARIO_NAMES.to_vec());
    }
    let mut selected = Vec::new();
    for raw in arg.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        let Some(&known) = SCENARIO_NAMES.iter().find(|&&s| s == name) else {
            bail!(
                "unknown scenario '{name}' (available: {})",
                SCENARIO_NAMES.join(", ")
            );
        };
        selected.push(known);
    }
    if selected.is_empty() {
        bail!("no scenarios selected");
    }
    Ok(selected)
}

fn print_report(report: &ScenarioReport) {
    let status = if report.passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!(
        "{status} {} ({} checks, {}ms)",
        report.scenario.bold(),
        report.checks.len(),
        report.elapsed_ms
    );
    for check in &report.checks {
        let mark = if check.passed {
            "+".green()
        } else {
            "-".red()
        };
        println!("  {mark} {} — {}", check.label, check.detail.dimmed());
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        for name in SCENARIO_NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let mut reports = Vec::new();
    for name in selected_scenarios(&args.scenarios)? {
        log::info!("running scenario '{name}'");
        let report = run_scenario(name).expect("selected scenarios are known");
        if !args.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        let total = reports.len();
        bail!("{failed} of {total} scenarios failed");
    }
    if !args.json {
        println!("{}", "all scenarios passed".green());
    }
    Ok(())
}
