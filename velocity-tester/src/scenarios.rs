//! Scenario suites exercising the race configuration engine end to end.

use serde::Serialize;
use std::time::Instant;
use velocity_game::constants::{HARD_CAP_TOTAL_CARS, NUMBER_OF_CARS, NUMBER_OF_STAGES};
use velocity_game::{
    CarInstance, CarModel, CarPoolManager, RaceConfigManager, RaceSettings, UnlockProgression,
};

pub const SCENARIO_NAMES: [&str; 5] = ["unlocks", "allocation", "validation", "grid", "stress"];

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub label: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub checks: Vec<CheckResult>,
    pub elapsed_ms: u128,
}

impl ScenarioReport {
    fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            checks: Vec::new(),
            elapsed_ms: 0,
        }
    }

    fn check(&mut self, label: &str, passed: bool, detail: String) {
        self.checks.push(CheckResult {
            label: label.to_string(),
            passed,
            detail,
        });
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}

pub fn run_scenario(name: &str) -> Option<ScenarioReport> {
    let started = Instant::now();
    let mut report = match name {
        "unlocks" => run_unlocks(),
        "allocation" => run_allocation(),
        "validation" => run_validation(),
        "grid" => run_grid(),
        "stress" => run_stress(),
        _ => return None,
    };
    report.elapsed_ms = started.elapsed().as_millis();
    Some(report)
}

fn progression_at(stage: i64) -> UnlockProgression {
    let mut unlocks = UnlockProgression::new();
    unlocks.update(&[7 + stage]);
    unlocks
}

fn run_unlocks() -> ScenarioReport {
    let mut report = ScenarioReport::new("unlocks");

    let fresh = progression_at(0);
    report.check(
        "fresh save opens starter roster",
        fresh.unlocked_cars().len() == 8 && fresh.is_track_unlocked(0),
        format!("{} cars, stage 1 open", fresh.unlocked_cars().len()),
    );

    let mut monotonic = true;
    let mut previous = 0;
    for stage in 0..=18 {
        let cars = progression_at(stage).unlocked_cars().len();
        if cars < previous {
            monotonic = false;
        }
        previous = cars;
    }
    report.check(
        "car unlocks never regress",
        monotonic,
        format!("final roster {previous}/{NUMBER_OF_CARS}"),
    );

    let finished = progression_at(16);
    report.check(
        "campaign completion opens everything",
        finished.unlocked_cars().len() == NUMBER_OF_CARS,
        format!("{} cars unlocked", finished.unlocked_cars().len()),
    );

    report
}

fn small_pool() -> CarPoolManager {
    let models = (0..6)
        .map(|i| {
            CarModel::new(
                &format!("qa_{i}"),
                &format!("QA {i}"),
                [60, 60, 200],
                &format!("models/qa_{i}.rad"),
            )
        })
        .collect();
    CarPoolManager::new(models)
}

fn run_allocation() -> ScenarioReport {
    let mut report = ScenarioReport::new("allocation");

    let mut pool = small_pool();
    match pool.reserve_instances(10, false, false) {
        Ok(allocation) => report.check(
            "starved pool degrades to shortfall",
            allocation.allocated_count() == 6 && allocation.shortfall() == 4,
            format!(
                "allocated {} shortfall {}",
                allocation.allocated_count(),
                allocation.shortfall()
            ),
        ),
        Err(err) => report.check("starved pool degrades to shortfall", false, err.to_string()),
    }

    let mut pool = small_pool();
    match pool.reserve_instances(10, false, true) {
        Ok(allocation) => report.check(
            "duplicates fill the gap",
            allocation.is_complete() && allocation.has_duplicates(),
            format!("allocated {}", allocation.allocated_count()),
        ),
        Err(err) => report.check("duplicates fill the gap", false, err.to_string()),
    }

    let ids = |pool: &mut CarPoolManager| {
        pool.reserve_instances(9, true, true).map(|allocation| {
            allocation
                .cars()
                .iter()
                .map(CarInstance::instance_id)
                .collect::<Vec<_>>()
        })
    };
    let first = ids(&mut small_pool());
    let second = ids(&mut small_pool());
    report.check(
        "allocation replays deterministically",
        first.is_ok() && first == second,
        format!("{} ids compared", first.map_or(0, |v| v.len())),
    );

    let mut pool = small_pool();
    let over_cap = pool.reserve_instances(HARD_CAP_TOTAL_CARS + 8, true, true);
    report.check(
        "hard cap is fatal",
        over_cap.is_err(),
        format!("request {} rejected", HARD_CAP_TOTAL_CARS + 8),
    );

    report
}

fn run_validation() -> ScenarioReport {
    let mut report = ScenarioReport::new("validation");
    let Ok(manager) = RaceConfigManager::with_builtin_campaign() else {
        report.check("builtin campaign loads", false, String::from("load failed"));
        return report;
    };
    report.check(
        "builtin campaign loads",
        manager.catalog().len() == NUMBER_OF_STAGES,
        format!("{} tracks", manager.catalog().len()),
    );

    let track = manager.catalog().get(0).expect("first track exists");
    let clean = RaceSettings::builder().lap_count(3).ai_count(5).build();
    let result = clean.validate(track, manager.pool());
    report.check(
        "clean settings validate",
        result.is_valid() && !result.has_warnings(),
        result.summary(),
    );

    let greedy = RaceSettings::builder().lap_count(3).ai_count(12).build();
    let result = greedy.validate(track, manager.pool());
    report.check(
        "oversized grid is rejected with context",
        !result.is_valid() && result.errors().len() == 1,
        result.summary(),
    );

    let broken = RaceSettings::builder().lap_count(99).ai_count(12).build();
    let result = broken.validate(track, manager.pool());
    report.check(
        "all violations surface together",
        result.errors().len() == 2,
        result.summary(),
    );

    report
}

fn run_grid() -> ScenarioReport {
    let mut report = ScenarioReport::new("grid");
    let Ok(mut manager) = RaceConfigManager::with_builtin_campaign() else {
        report.check("manager construction", false, String::from("load failed"));
        return report;
    };
    manager.update_unlock_progression(&[7 + 16]);

    let applied = manager.select_track(2)
        && manager.apply_settings(&RaceSettings::builder().track_index(2).ai_count(5).build());
    report.check(
        "settings apply on an unlocked track",
        applied,
        manager.current_settings().lap_count().to_string(),
    );

    match manager.create_race_configuration() {
        Ok(config) => {
            let grid = config.to_grid_array();
            report.check(
                "grid projection is players-first",
                grid.len() == config.total_cars()
                    && grid.first() == config.player_cars().first(),
                format!("{grid:?}"),
            );
            report.check(
                "grid fits the engine",
                config.fits_engine_grid(),
                format!("{} cars", config.total_cars()),
            );
        }
        Err(err) => report.check("grid projection is players-first", false, err.to_string()),
    }

    report
}

/// High-AI-count allocation pressure test, timed.
fn run_stress() -> ScenarioReport {
    let mut report = ScenarioReport::new("stress");
    let mut pool = CarPoolManager::with_roster();

    let started = Instant::now();
    match pool.reserve_instances(HARD_CAP_TOTAL_CARS, true, true) {
        Ok(allocation) => {
            let elapsed = started.elapsed();
            report.check(
                "hard-cap allocation completes",
                allocation.allocated_count() + allocation.shortfall() == HARD_CAP_TOTAL_CARS,
                format!(
                    "allocated {} shortfall {} in {}us",
                    allocation.allocated_count(),
                    allocation.shortfall(),
                    elapsed.as_micros()
                ),
            );
            report.check(
                "variants stay within the pool budget",
                pool.variants().len() <= NUMBER_OF_CARS / 2,
                format!("{} variants generated", pool.variants().len()),
            );
        }
        Err(err) => report.check("hard-cap allocation completes", false, err.to_string()),
    }

    report
}
