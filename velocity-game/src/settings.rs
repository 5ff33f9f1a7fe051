//! Race settings: the immutable parameter set for one race, its builder,
//! and validation against track and pool constraints.

use crate::constants::FALLBACK_DEFAULT_LAPS;
use crate::pool::CarPoolManager;
use crate::track::TrackMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// AI difficulty levels affecting speed, aggression, and crash recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Insane,
}

impl AiDifficulty {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Insane => "Insane",
        }
    }

    /// AI top-speed scaling.
    #[must_use]
    pub const fn speed_multiplier(self) -> f32 {
        match self {
            Self::Easy => 0.7,
            Self::Normal => 1.0,
            Self::Hard => 1.3,
            Self::Insane => 1.6,
        }
    }

    /// How much risk the AI takes when overtaking.
    #[must_use]
    pub const fn aggression_factor(self) -> f32 {
        match self {
            Self::Easy => 0.5,
            Self::Normal => 0.75,
            Self::Hard => 1.0,
            Self::Insane => 1.5,
        }
    }

    /// How quickly the AI recovers from crashes.
    #[must_use]
    pub const fn recovery_multiplier(self) -> f32 {
        match self {
            Self::Easy => 1.2,
            Self::Normal => 1.0,
            Self::Hard => 0.8,
            Self::Insane => 0.6,
        }
    }

    /// Next level, cycling back to Easy after Insane.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Easy => Self::Normal,
            Self::Normal => Self::Hard,
            Self::Hard => Self::Insane,
            Self::Insane => Self::Easy,
        }
    }

    /// Previous level, cycling back to Insane before Easy.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::Easy => Self::Insane,
            Self::Normal => Self::Easy,
            Self::Hard => Self::Normal,
            Self::Insane => Self::Hard,
        }
    }
}

/// Outcome of validating race settings. Errors block acceptance; warnings
/// carry remediation hints and never block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub(crate) fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Human-readable one-line summary for logs and status bars.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() && !self.has_warnings() {
            return String::from("Valid configuration");
        }
        let mut parts = Vec::new();
        if !self.errors.is_empty() {
            parts.push(format!("Errors: {}", self.errors.join(", ")));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("Warnings: {}", self.warnings.join(", ")));
        }
        parts.join("; ")
    }
}

/// Immutable parameter set for one race. Built via [`RaceSettingsBuilder`];
/// out-of-range inputs are clamped at build time, while cross-checks against
/// track and pool happen in [`RaceSettings::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSettings {
    track_index: usize,
    selected_cars: BTreeSet<usize>,
    ai_count: usize,
    lap_count: u32,
    difficulty: AiDifficulty,
    human_players: usize,
    generate_variants: bool,
    allow_duplicates: bool,
    performance_mode: bool,
}

impl RaceSettings {
    pub const DEFAULT_AI_COUNT: usize = 6;
    pub const DEFAULT_HUMAN_PLAYERS: usize = 1;

    #[must_use]
    pub fn builder() -> RaceSettingsBuilder {
        RaceSettingsBuilder::default()
    }

    /// Default settings for a track, adopting its default lap count.
    #[must_use]
    pub fn default_for_track(track_index: usize, track: &TrackMetadata) -> Self {
        Self::builder()
            .track_index(track_index)
            .lap_count(track.default_laps())
            .build()
    }

    #[must_use]
    pub const fn track_index(&self) -> usize {
        self.track_index
    }

    #[must_use]
    pub const fn selected_cars(&self) -> &BTreeSet<usize> {
        &self.selected_cars
    }

    #[must_use]
    pub const fn ai_count(&self) -> usize {
        self.ai_count
    }

    #[must_use]
    pub const fn lap_count(&self) -> u32 {
        self.lap_count
    }

    #[must_use]
    pub const fn difficulty(&self) -> AiDifficulty {
        self.difficulty
    }

    #[must_use]
    pub const fn human_players(&self) -> usize {
        self.human_players
    }

    #[must_use]
    pub const fn generate_variants(&self) -> bool {
        self.generate_variants
    }

    #[must_use]
    pub const fn allow_duplicates(&self) -> bool {
        self.allow_duplicates
    }

    #[must_use]
    pub const fn performance_mode(&self) -> bool {
        self.performance_mode
    }

    /// Total grid size: humans plus AI.
    #[must_use]
    pub const fn total_cars(&self) -> usize {
        self.human_players + self.ai_count
    }

    pub(crate) fn with_lap_count(&self, lap_count: u32) -> Self {
        let mut adjusted = self.clone();
        adjusted.lap_count = lap_count.max(1);
        adjusted
    }

    pub(crate) fn with_track_index(&self, track_index: usize) -> Self {
        let mut adjusted = self.clone();
        adjusted.track_index = track_index;
        adjusted
    }

    pub(crate) fn with_ai_count(&self, ai_count: usize) -> Self {
        let mut adjusted = self.clone();
        adjusted.ai_count = ai_count;
        adjusted
    }

    /// Cross-check this configuration against track metadata and pool
    /// capacity. Every rule is evaluated so callers see all violations at
    /// once; the result is always returned, never panicked out of.
    #[must_use]
    pub fn validate(&self, track: &TrackMetadata, pool: &CarPoolManager) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !track.is_valid_lap_count(self.lap_count) {
            result.add_error(format!(
                "Lap count {} is outside track limits ({}-{})",
                self.lap_count,
                track.min_laps(),
                track.max_laps()
            ));
        }

        let total_cars = self.total_cars();
        if total_cars > track.max_concurrent_cars() {
            result.add_error(format!(
                "Total cars {} exceeds track capacity {}",
                total_cars,
                track.max_concurrent_cars()
            ));
        }

        let max_allowed = track
            .max_concurrent_cars()
            .min(pool.capacity_with_policy(self.generate_variants, self.allow_duplicates));
        if total_cars > max_allowed {
            let suggestion = if !self.generate_variants && !self.allow_duplicates {
                String::from("Enable 'Generate Variants' or 'Allow Duplicates'")
            } else {
                format!("Reduce to {max_allowed} total cars")
            };
            result.add_warning(format!(
                "Requested {total_cars} cars but only {max_allowed} available. {suggestion}"
            ));
        }

        result
    }
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone)]
pub struct RaceSettingsBuilder {
    track_index: usize,
    selected_cars: BTreeSet<usize>,
    ai_count: usize,
    lap_count: u32,
    difficulty: AiDifficulty,
    human_players: usize,
    generate_variants: bool,
    allow_duplicates: bool,
    performance_mode: bool,
}

impl Default for RaceSettingsBuilder {
    fn default() -> Self {
        Self {
            track_index: 0,
            selected_cars: BTreeSet::new(),
            ai_count: RaceSettings::DEFAULT_AI_COUNT,
            lap_count: FALLBACK_DEFAULT_LAPS,
            difficulty: AiDifficulty::default(),
            human_players: RaceSettings::DEFAULT_HUMAN_PLAYERS,
            generate_variants: false,
            allow_duplicates: false,
            performance_mode: false,
        }
    }
}

impl RaceSettingsBuilder {
    #[must_use]
    pub const fn track_index(mut self, track_index: usize) -> Self {
        self.track_index = track_index;
        self
    }

    /// Add a player-selected car by roster index.
    #[must_use]
    pub fn select_car(mut self, car_index: usize) -> Self {
        self.selected_cars.insert(car_index);
        self
    }

    #[must_use]
    pub const fn ai_count(mut self, ai_count: usize) -> Self {
        self.ai_count = ai_count;
        self
    }

    #[must_use]
    pub const fn lap_count(mut self, lap_count: u32) -> Self {
        self.lap_count = lap_count;
        self
    }

    #[must_use]
    pub const fn difficulty(mut self, difficulty: AiDifficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub const fn human_players(mut self, human_players: usize) -> Self {
        self.human_players = human_players;
        self
    }

    #[must_use]
    pub const fn generate_variants(mut self, generate_variants: bool) -> Self {
        self.generate_variants = generate_variants;
        self
    }

    #[must_use]
    pub const fn allow_duplicates(mut self, allow_duplicates: bool) -> Self {
        self.allow_duplicates = allow_duplicates;
        self
    }

    #[must_use]
    pub const fn performance_mode(mut self, performance_mode: bool) -> Self {
        self.performance_mode = performance_mode;
        self
    }

    /// Finalize, clamping lap count and player count to their floors and
    /// defaulting the car selection to the first roster slot.
    #[must_use]
    pub fn build(self) -> RaceSettings {
        let mut selected_cars = self.selected_cars;
        if selected_cars.is_empty() {
            selected_cars.insert(0);
        }
        RaceSettings {
            track_index: self.track_index,
            selected_cars,
            ai_count: self.ai_count,
            lap_count: self.lap_count.max(1),
            difficulty: self.difficulty,
            human_players: self.human_players.max(1),
            generate_variants: self.generate_variants,
            allow_duplicates: self.allow_duplicates,
            performance_mode: self.performance_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::CarModel;

    fn open_track() -> TrackMetadata {
        TrackMetadata::new("Test Track", 3, 1, 10, 8)
    }

    fn pool_of(size: usize) -> CarPoolManager {
        let models = (0..size)
            .map(|i| CarModel::new(&format!("m{i}"), &format!("M {i}"), [0, 0, 0], "m.rad"))
            .collect();
        CarPoolManager::new(models)
    }

    #[test]
    fn builder_clamps_floors() {
        let settings = RaceSettings::builder()
            .lap_count(0)
            .human_players(0)
            .build();
        assert_eq!(settings.lap_count(), 1);
        assert_eq!(settings.human_players(), 1);
        assert_eq!(settings.selected_cars().iter().next(), Some(&0));
    }

    #[test]
    fn difficulty_cycles_both_ways() {
        assert_eq!(AiDifficulty::Insane.next(), AiDifficulty::Easy);
        assert_eq!(AiDifficulty::Easy.previous(), AiDifficulty::Insane);
        assert_eq!(AiDifficulty::Normal.next().previous(), AiDifficulty::Normal);
    }

    #[test]
    fn clean_configuration_passes() {
        let settings = RaceSettings::builder().lap_count(3).ai_count(6).build();
        let result = settings.validate(&open_track(), &pool_of(16));
        assert!(result.is_valid());
        assert!(!result.has_warnings());
        assert_eq!(result.summary(), "Valid configuration");
    }

    #[test]
    fn lap_count_out_of_bounds_is_an_error() {
        let settings = RaceSettings::builder().lap_count(12).ai_count(3).build();
        let result = settings.validate(&open_track(), &pool_of(16));
        assert!(!result.is_valid());
        assert!(result.errors()[0].contains("Lap count 12"));
    }

    #[test]
    fn every_violation_is_reported_together() {
        let settings = RaceSettings::builder().lap_count(12).ai_count(10).build();
        let result = settings.validate(&open_track(), &pool_of(16));
        assert_eq!(result.errors().len(), 2);
        assert!(result.summary().starts_with("Errors:"));
    }

    #[test]
    fn pool_shortfall_is_a_warning_not_an_error() {
        let track = TrackMetadata::new("Wide Track", 3, 1, 10, 16);
        let settings = RaceSettings::builder().ai_count(10).build();
        let result = settings.validate(&track, &pool_of(6));
        assert!(result.is_valid());
        assert!(result.has_warnings());
        assert!(result.warnings()[0].contains("Enable 'Generate Variants' or 'Allow Duplicates'"));
    }

    #[test]
    fn warning_suggests_reduction_when_flags_already_set() {
        let track = TrackMetadata::new("Wide Track", 3, 1, 10, 16);
        let settings = RaceSettings::builder()
            .ai_count(14)
            .generate_variants(true)
            .allow_duplicates(true)
            .build();
        let result = settings.validate(&track, &pool_of(4));
        assert!(result.is_valid());
        assert!(result.warnings()[0].contains("Reduce to 12 total cars"));
    }
}
