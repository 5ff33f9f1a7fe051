//! Campaign unlock progression.
//!
//! The engine reports progress as a raw integer vector whose first element
//! counts from a fixed base. Stage progress derived from that signal gates
//! both the track list and the boss half of the car roster: the first eight
//! cars are always available, and each remaining car is the boss of a
//! two-stage block, joining the roster once its block is beaten.

use crate::constants::{
    BOSS_STAGE_SPACING, NUMBER_OF_CARS, STAGE_SIGNAL_OFFSET, STARTER_ROSTER_SIZE,
};
use crate::track::{TrackCatalog, TrackMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockProgression {
    unlocked_stages: u32,
}

impl Default for UnlockProgression {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockProgression {
    /// Fresh progression: first stage open, starter roster only.
    #[must_use]
    pub const fn new() -> Self {
        Self { unlocked_stages: 1 }
    }

    /// Number of stages currently open.
    #[must_use]
    pub const fn unlocked_stages(&self) -> u32 {
        self.unlocked_stages
    }

    /// Absorb a raw progression signal from the engine.
    ///
    /// An empty signal is a no-op. Progress is the first element minus the
    /// signal base, floored at 1, so a fresh save still opens stage one.
    pub fn update(&mut self, signal: &[i64]) {
        let Some(&head) = signal.first() else {
            return;
        };
        let stages = (head - STAGE_SIGNAL_OFFSET).max(1);
        self.unlocked_stages = u32::try_from(stages).unwrap_or(u32::MAX);
    }

    /// Stage threshold a car must reach to unlock, or `None` for the
    /// starter roster (and for indices outside the roster).
    #[must_use]
    pub fn unlock_threshold(car_index: usize) -> Option<u32> {
        if car_index < STARTER_ROSTER_SIZE || car_index >= NUMBER_OF_CARS {
            return None;
        }
        let boss_rank = u32::try_from(car_index - STARTER_ROSTER_SIZE + 1).ok()?;
        Some(boss_rank * BOSS_STAGE_SPACING)
    }

    #[must_use]
    pub fn is_car_unlocked(&self, car_index: usize) -> bool {
        if car_index >= NUMBER_OF_CARS {
            return false;
        }
        match Self::unlock_threshold(car_index) {
            None => true,
            Some(threshold) => self.unlocked_stages >= threshold,
        }
    }

    #[must_use]
    pub fn is_track_unlocked(&self, track_index: usize) -> bool {
        u64::try_from(track_index).is_ok_and(|t| t < u64::from(self.unlocked_stages))
    }

    /// Roster indices of every currently unlocked car.
    #[must_use]
    pub fn unlocked_cars(&self) -> BTreeSet<usize> {
        (0..NUMBER_OF_CARS)
            .filter(|&car| self.is_car_unlocked(car))
            .collect()
    }

    /// Unlocked prefix of the catalog, clamped to catalog size.
    #[must_use]
    pub fn unlocked_tracks<'a>(&self, catalog: &'a TrackCatalog) -> &'a [TrackMetadata] {
        let open = usize::try_from(self.unlocked_stages).unwrap_or(usize::MAX);
        &catalog.tracks()[..open.min(catalog.len())]
    }
}
