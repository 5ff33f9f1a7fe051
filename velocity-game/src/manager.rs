//! Race configuration orchestration.
//!
//! [`RaceConfigManager`] is an explicit, caller-constructed context: it
//! holds the catalog, the car pool, the unlock state, and the settings for
//! the race being staged. Callers own the instance and serialize access;
//! there is no global manager and no internal locking.

use crate::constants::NUMBER_OF_PLAYERS;
use crate::pool::{CarAllocation, CarPoolManager, PoolError};
use crate::roster;
use crate::settings::RaceSettings;
use crate::stages::{BuiltinStages, StageDataError};
use crate::track::TrackCatalog;
use crate::unlocks::UnlockProgression;
use serde::{Deserialize, Serialize};

pub struct RaceConfigManager {
    catalog: TrackCatalog,
    pool: CarPoolManager,
    unlocks: UnlockProgression,
    current: RaceSettings,
}

impl RaceConfigManager {
    #[must_use]
    pub fn new(catalog: TrackCatalog, pool: CarPoolManager) -> Self {
        let current = catalog
            .get(0)
            .map_or_else(RaceSettings::default, |track| {
                RaceSettings::default_for_track(0, track)
            });
        Self {
            catalog,
            pool,
            unlocks: UnlockProgression::new(),
            current,
        }
    }

    /// Manager over the built-in campaign and the fixed roster pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in stage data fails to load.
    pub fn with_builtin_campaign() -> Result<Self, StageDataError> {
        let catalog = TrackCatalog::load(&BuiltinStages)?;
        Ok(Self::new(catalog, CarPoolManager::with_roster()))
    }

    #[must_use]
    pub fn current_settings(&self) -> &RaceSettings {
        &self.current
    }

    #[must_use]
    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn pool(&self) -> &CarPoolManager {
        &self.pool
    }

    #[must_use]
    pub fn unlocks(&self) -> &UnlockProgression {
        &self.unlocks
    }

    /// Absorb the engine's raw progression signal.
    pub fn update_unlock_progression(&mut self, signal: &[i64]) {
        self.unlocks.update(signal);
    }

    /// Apply new settings if they validate and reference only unlocked
    /// content. On rejection the current settings are left untouched and
    /// `false` is returned. On acceptance the lap count snaps to the
    /// track's declared default.
    pub fn apply_settings(&mut self, settings: &RaceSettings) -> bool {
        let Some(track) = self.catalog.get(settings.track_index()) else {
            log::warn!(
                "rejecting settings: track index {} is not in the catalog",
                settings.track_index()
            );
            return false;
        };
        if !self.unlocks.is_track_unlocked(settings.track_index()) {
            log::warn!(
                "rejecting settings: track index {} is locked",
                settings.track_index()
            );
            return false;
        }
        for &car in settings.selected_cars() {
            if !self.unlocks.is_car_unlocked(car) {
                log::warn!("rejecting settings: car {} is locked", roster::car_name(car));
                return false;
            }
        }

        let result = settings.validate(track, &self.pool);
        if !result.is_valid() {
            for error in result.errors() {
                log::warn!("rejecting settings: {error}");
            }
            return false;
        }
        for warning in result.warnings() {
            log::debug!("settings accepted with warning: {warning}");
        }

        self.current = if track.specifies_default_laps() {
            settings.with_lap_count(track.default_laps())
        } else {
            settings.clone()
        };
        true
    }

    /// Point the current settings at a track, adopting its declared lap
    /// default and recommended AI count. Fails on unknown or locked tracks.
    pub fn select_track(&mut self, track_index: usize) -> bool {
        if !self.unlocks.is_track_unlocked(track_index) {
            return false;
        }
        let Some(track) = self.catalog.get(track_index) else {
            return false;
        };

        let mut updated = self.current.with_track_index(track_index);
        if track.specifies_default_laps() {
            updated = updated.with_lap_count(track.default_laps());
        }
        updated = updated.with_ai_count(track.recommended_ai_count());
        self.current = updated;
        true
    }

    /// Drop back to default settings on the first track.
    pub fn reset_to_defaults(&mut self) {
        self.current = self
            .catalog
            .get(0)
            .map_or_else(RaceSettings::default, |track| {
                RaceSettings::default_for_track(0, track)
            });
    }

    /// Stage the race: allocate AI cars from the pool and assemble the
    /// final configuration for the engine.
    ///
    /// # Errors
    ///
    /// Returns a pool error if the AI request exceeds the hard cap, which
    /// `apply_settings` validation normally prevents.
    pub fn create_race_configuration(&mut self) -> Result<RaceConfiguration, PoolError> {
        let settings = self.current.clone();
        let allocation = self.pool.reserve_instances(
            settings.ai_count(),
            settings.generate_variants(),
            settings.allow_duplicates(),
        )?;
        Ok(RaceConfiguration::new(settings, allocation))
    }
}

/// Final, ready-to-spawn configuration for one race: the committed
/// settings, the human grid slots, and the allocated AI slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfiguration {
    settings: RaceSettings,
    player_cars: Vec<usize>,
    ai_cars: Vec<usize>,
    allocation: CarAllocation,
}

impl RaceConfiguration {
    fn new(settings: RaceSettings, allocation: CarAllocation) -> Self {
        let player_cars: Vec<usize> = settings.selected_cars().iter().copied().collect();
        let ai_cars: Vec<usize> = allocation
            .cars()
            .iter()
            .filter_map(|instance| {
                let id = instance.model.roster_id();
                let index = roster::index_of(id);
                if index.is_none() {
                    log::debug!("allocated model '{id}' has no roster slot, skipping projection");
                }
                index
            })
            .collect();
        Self {
            settings,
            player_cars,
            ai_cars,
            allocation,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RaceSettings {
        &self.settings
    }

    #[must_use]
    pub fn player_cars(&self) -> &[usize] {
        &self.player_cars
    }

    #[must_use]
    pub fn ai_cars(&self) -> &[usize] {
        &self.ai_cars
    }

    /// Allocation detail behind [`ai_cars`](Self::ai_cars), including
    /// variants, duplicate numbers, and any shortfall.
    #[must_use]
    pub fn allocation(&self) -> &CarAllocation {
        &self.allocation
    }

    #[must_use]
    pub fn total_cars(&self) -> usize {
        self.player_cars.len() + self.ai_cars.len()
    }

    /// Flat car-index projection consumed by the engine spawn path:
    /// player entries first, then AI entries in allocation order.
    #[must_use]
    pub fn to_grid_array(&self) -> Vec<usize> {
        let mut grid = Vec::with_capacity(self.total_cars());
        grid.extend_from_slice(&self.player_cars);
        grid.extend_from_slice(&self.ai_cars);
        grid
    }

    /// Whether the projection fits the engine's configured grid size.
    #[must_use]
    pub fn fits_engine_grid(&self) -> bool {
        self.total_cars() <= NUMBER_OF_PLAYERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AiDifficulty;

    fn campaign_manager() -> RaceConfigManager {
        RaceConfigManager::with_builtin_campaign().unwrap()
    }

    fn open_everything(manager: &mut RaceConfigManager) {
        manager.update_unlock_progression(&[7 + 17]);
    }

    #[test]
    fn fresh_manager_adopts_first_track_defaults() {
        let manager = campaign_manager();
        assert_eq!(manager.current_settings().track_index(), 0);
        // The Introductory Stage declares four laps
        assert_eq!(manager.current_settings().lap_count(), 4);
    }

    #[test]
    fn locked_track_is_rejected() {
        let mut manager = campaign_manager();
        let settings = RaceSettings::builder().track_index(5).build();
        assert!(!manager.apply_settings(&settings));
        assert_eq!(manager.current_settings().track_index(), 0);
    }

    #[test]
    fn locked_car_is_rejected() {
        let mut manager = campaign_manager();
        // boss car 15 needs stage 16; only stage 1 is open
        let settings = RaceSettings::builder().select_car(15).build();
        assert!(!manager.apply_settings(&settings));
    }

    #[test]
    fn invalid_lap_count_is_rejected() {
        let mut manager = campaign_manager();
        let settings = RaceSettings::builder().lap_count(99).build();
        assert!(!manager.apply_settings(&settings));
    }

    #[test]
    fn accepted_settings_snap_to_declared_laps() {
        let mut manager = campaign_manager();
        let settings = RaceSettings::builder()
            .lap_count(7)
            .ai_count(5)
            .difficulty(AiDifficulty::Hard)
            .build();
        assert!(manager.apply_settings(&settings));
        let current = manager.current_settings();
        assert_eq!(current.lap_count(), 4);
        assert_eq!(current.ai_count(), 5);
        assert_eq!(current.difficulty(), AiDifficulty::Hard);
    }

    #[test]
    fn select_track_applies_recommendations() {
        let mut manager = campaign_manager();
        open_everything(&mut manager);
        // Switchback Peak: 11 checkpoints, complex
        assert!(manager.select_track(9));
        let current = manager.current_settings();
        assert_eq!(current.track_index(), 9);
        assert_eq!(current.lap_count(), 4);
        assert_eq!(current.ai_count(), 5);

        assert!(!manager.select_track(99));
    }

    #[test]
    fn configuration_projects_players_before_ai() {
        let mut manager = campaign_manager();
        open_everything(&mut manager);
        let settings = RaceSettings::builder()
            .track_index(0)
            .select_car(2)
            .ai_count(4)
            .build();
        assert!(manager.apply_settings(&settings));

        let config = manager.create_race_configuration().unwrap();
        assert_eq!(config.player_cars(), &[2]);
        assert_eq!(config.ai_cars().len(), 4);
        assert_eq!(config.allocation().shortfall(), 0);

        let grid = config.to_grid_array();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0], 2);
        // AI pass one walks the roster in order
        assert_eq!(&grid[1..], &[0, 1, 2, 3]);
        assert!(config.fits_engine_grid());
    }

    #[test]
    fn oversized_grid_fails_compatibility() {
        let mut manager = campaign_manager();
        open_everything(&mut manager);
        assert!(manager.select_track(16));
        let settings = manager.current_settings().with_ai_count(10);
        assert!(manager.apply_settings(&settings));

        let config = manager.create_race_configuration().unwrap();
        assert_eq!(config.total_cars(), 11);
        assert!(!config.fits_engine_grid());
    }

    #[test]
    fn reset_restores_first_track_defaults() {
        let mut manager = campaign_manager();
        open_everything(&mut manager);
        manager.select_track(3);
        manager.reset_to_defaults();
        assert_eq!(manager.current_settings().track_index(), 0);
        assert_eq!(manager.current_settings().lap_count(), 4);
    }
}
