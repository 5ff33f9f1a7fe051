//! Fixed car roster and per-car stat tables.
//!
//! The roster and stats are immutable, index-addressed tables; callers get
//! read-only accessors and copies to scale, never the tables themselves.

use crate::constants::NUMBER_OF_CARS;
use crate::pool::{CarModel, StatModifiers};
use crate::settings::AiDifficulty;
use serde::{Deserialize, Serialize};

/// One entry in the fixed roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub color: [u8; 3],
    pub model_file: &'static str,
}

impl CarSpec {
    const fn new(id: &'static str, name: &'static str, color: [u8; 3], file: &'static str) -> Self {
        Self {
            id,
            name,
            color,
            model_file: file,
        }
    }
}

/// The sixteen-car roster. Index order matches the engine's car-select
/// order and the legacy grid projection.
pub const CAR_ROSTER: [CarSpec; NUMBER_OF_CARS] = [
    CarSpec::new("2000tornados", "2000 Tornados", [188, 22, 28], "models/2000tornados.rad"),
    CarSpec::new("formula7", "Formula 7", [232, 106, 16], "models/formula7.rad"),
    CarSpec::new("canyenaro", "Canyenaro", [58, 112, 180], "models/canyenaro.rad"),
    CarSpec::new("lescrab", "Le Scrab", [96, 160, 62], "models/lescrab.rad"),
    CarSpec::new("nimi", "Nimi", [236, 208, 48], "models/nimi.rad"),
    CarSpec::new("maxrevenge", "Max Revenge", [140, 30, 160], "models/maxrevenge.rad"),
    CarSpec::new("leadoxide", "Lead Oxide", [110, 110, 118], "models/leadoxide.rad"),
    CarSpec::new("koolkat", "Kool Kat", [40, 176, 170], "models/koolkat.rad"),
    CarSpec::new("drifter", "Drifter", [206, 70, 132], "models/drifter.rad"),
    CarSpec::new("policecops", "Policecops", [28, 40, 120], "models/policecops.rad"),
    CarSpec::new("mustang", "Mustang", [20, 20, 24], "models/mustang.rad"),
    CarSpec::new("king", "King", [216, 170, 40], "models/king.rad"),
    CarSpec::new("audir8", "Audi R8", [224, 224, 228], "models/audir8.rad"),
    CarSpec::new("masheen", "Masheen", [70, 80, 78], "models/masheen.rad"),
    CarSpec::new("radicalone", "Radical One", [242, 60, 12], "models/radicalone.rad"),
    CarSpec::new("drmonster", "Dr Monstaa", [86, 140, 30], "models/drmonster.rad"),
];

/// Stat row for one car. Acceleration and top speed are staged per gear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarStats {
    pub accel: [f32; 3],
    pub top_speed: [u16; 3],
    pub turning: u8,
    pub grip: f32,
}

const CAR_STATS: [CarStats; NUMBER_OF_CARS] = [
    CarStats { accel: [11.0, 5.0, 3.0], top_speed: [50, 185, 282], turning: 6, grip: 20.0 },
    CarStats { accel: [14.0, 7.0, 5.0], top_speed: [100, 200, 310], turning: 9, grip: 27.0 },
    CarStats { accel: [10.0, 5.0, 3.5], top_speed: [60, 180, 275], turning: 5, grip: 18.0 },
    CarStats { accel: [11.0, 6.0, 3.5], top_speed: [76, 195, 298], turning: 7, grip: 22.0 },
    CarStats { accel: [10.0, 5.0, 3.5], top_speed: [70, 170, 275], turning: 8, grip: 19.0 },
    CarStats { accel: [12.0, 6.0, 3.0], top_speed: [70, 202, 293], turning: 7, grip: 20.0 },
    CarStats { accel: [7.0, 9.0, 4.0], top_speed: [60, 170, 289], turning: 5, grip: 25.0 },
    CarStats { accel: [11.0, 5.0, 3.0], top_speed: [70, 206, 291], turning: 5, grip: 20.0 },
    CarStats { accel: [12.0, 7.0, 4.0], top_speed: [90, 210, 295], turning: 9, grip: 19.0 },
    CarStats { accel: [12.0, 7.0, 3.5], top_speed: [90, 190, 276], turning: 7, grip: 24.0 },
    CarStats { accel: [11.5, 6.5, 3.5], top_speed: [70, 200, 295], turning: 7, grip: 22.5 },
    CarStats { accel: [9.0, 5.0, 3.0], top_speed: [50, 160, 270], turning: 4, grip: 25.0 },
    CarStats { accel: [13.0, 7.0, 4.5], top_speed: [90, 200, 305], turning: 6, grip: 30.0 },
    CarStats { accel: [7.5, 3.5, 3.0], top_speed: [50, 130, 210], turning: 5, grip: 27.0 },
    CarStats { accel: [11.0, 7.5, 4.0], top_speed: [80, 200, 300], turning: 7, grip: 25.0 },
    CarStats { accel: [12.0, 6.0, 3.5], top_speed: [70, 210, 290], turning: 6, grip: 27.0 },
];

impl CarStats {
    /// Stat row with AI difficulty scaling applied to the speed stages.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn scaled_for(&self, difficulty: AiDifficulty) -> Self {
        let mult = difficulty.speed_multiplier();
        let mut scaled = *self;
        for stage in &mut scaled.top_speed {
            *stage = (f32::from(*stage) * mult).round().clamp(0.0, f32::from(u16::MAX)) as u16;
        }
        scaled
    }

    /// Stat row with variant perturbations applied.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_modifiers(&self, mods: &StatModifiers) -> Self {
        let mut out = *self;
        for stage in &mut out.top_speed {
            *stage =
                (f32::from(*stage) * mods.top_speed).round().clamp(0.0, f32::from(u16::MAX)) as u16;
        }
        for stage in &mut out.accel {
            *stage *= mods.acceleration;
        }
        out.grip *= mods.handling;
        out
    }
}

/// Display name for a roster index, or a placeholder when out of range.
#[must_use]
pub fn car_name(index: usize) -> &'static str {
    CAR_ROSTER.get(index).map_or("Unknown Car", |spec| spec.name)
}

/// Stat row for a roster index.
#[must_use]
pub fn stats(index: usize) -> Option<&'static CarStats> {
    CAR_STATS.get(index)
}

/// Roster index for a model id, if the id belongs to the fixed roster.
#[must_use]
pub fn index_of(model_id: &str) -> Option<usize> {
    CAR_ROSTER.iter().position(|spec| spec.id == model_id)
}

/// Materialize the roster as owned pool models.
#[must_use]
pub fn base_models() -> Vec<CarModel> {
    CAR_ROSTER
        .iter()
        .map(|spec| CarModel::new(spec.id, spec.name, spec.color, spec.model_file))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_ids_are_unique() {
        for (i, spec) in CAR_ROSTER.iter().enumerate() {
            assert_eq!(index_of(spec.id), Some(i));
        }
    }

    #[test]
    fn unknown_index_falls_back() {
        assert_eq!(car_name(99), "Unknown Car");
        assert!(stats(99).is_none());
        assert_eq!(index_of("warthog"), None);
    }

    #[test]
    fn difficulty_scaling_raises_top_speed() {
        let base = stats(0).unwrap();
        let hard = base.scaled_for(AiDifficulty::Hard);
        assert!(hard.top_speed[2] > base.top_speed[2]);
        assert!((hard.accel[0] - base.accel[0]).abs() < f32::EPSILON);
    }
}
