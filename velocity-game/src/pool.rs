//! Car pool management: base models, procedural variants, and duplicates.
//!
//! The pool owns the base roster handed to it at construction plus every
//! variant generated during the session. Allocation fills a grid request in
//! four ordered passes (base models, existing variants, new variants,
//! duplicates) and reports anything it could not fill as a shortfall rather
//! than an error. The only fatal condition is a request past the hard cap.

use crate::constants::{
    HARD_CAP_TOTAL_CARS, MAX_DUPLICATES_PER_MODEL, VARIANT_ACCEL_MAX, VARIANT_ACCEL_MIN,
    VARIANT_COLOR_SHIFT, VARIANT_HANDLING_MAX, VARIANT_HANDLING_MIN, VARIANT_POOL_PERCENTAGE,
    VARIANT_TOP_SPEED_MAX, VARIANT_TOP_SPEED_MIN,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use thiserror::Error;
use twox_hash::XxHash64;

/// A base car model with its core attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarModel {
    pub id: String,
    pub name: String,
    pub color: [u8; 3],
    /// Path to the geometry file; variants share their base's file.
    pub model_file: String,
}

impl CarModel {
    #[must_use]
    pub fn new(id: &str, name: &str, color: [u8; 3], model_file: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color,
            model_file: model_file.to_string(),
        }
    }
}

/// Multipliers a variant applies on top of its base model's stats.
/// Ranges are narrow so variants stay close in power to their base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifiers {
    pub top_speed: f32,
    pub handling: f32,
    pub acceleration: f32,
}

impl StatModifiers {
    pub const NEUTRAL: Self = Self {
        top_speed: 1.0,
        handling: 1.0,
        acceleration: 1.0,
    };

    /// Multiplier for a named stat, 1.0 for anything unrecognized.
    #[must_use]
    pub fn lookup(&self, stat: &str) -> f32 {
        match stat {
            "topSpeed" => self.top_speed,
            "handling" => self.handling,
            "acceleration" => self.acceleration,
            _ => 1.0,
        }
    }
}

impl Default for StatModifiers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A procedurally generated variant of a base model: shifted color palette
/// and small stat perturbations, same geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarVariant {
    pub model: CarModel,
    pub base_model_id: String,
    pub mods: StatModifiers,
}

impl CarVariant {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.model.id
    }
}

/// The model behind an allocated instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocatedModel {
    Base(CarModel),
    Variant(CarVariant),
}

impl AllocatedModel {
    #[must_use]
    pub fn model(&self) -> &CarModel {
        match self {
            Self::Base(model) => model,
            Self::Variant(variant) => &variant.model,
        }
    }

    /// Id used for the legacy roster projection. Variants resolve to their
    /// base model since they share its geometry slot.
    #[must_use]
    pub fn roster_id(&self) -> &str {
        match self {
            Self::Base(model) => &model.id,
            Self::Variant(variant) => &variant.base_model_id,
        }
    }

    #[must_use]
    pub const fn is_variant(&self) -> bool {
        matches!(self, Self::Variant(_))
    }
}

/// One car slot handed to the engine for a single race. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarInstance {
    pub model: AllocatedModel,
    pub duplicate: bool,
    /// 1 is the original; duplicates count up from 2.
    pub duplicate_number: u32,
    pub driver_name: String,
}

impl CarInstance {
    fn new(model: AllocatedModel, duplicate: bool, duplicate_number: u32) -> Self {
        let name = &model.model().name;
        let driver_name = if duplicate && duplicate_number > 1 {
            format!("{name} Driver {duplicate_number}")
        } else {
            format!("{name} Driver")
        };
        Self {
            model,
            duplicate,
            duplicate_number,
            driver_name,
        }
    }

    fn original(model: AllocatedModel) -> Self {
        Self::new(model, false, 1)
    }

    /// Identifier unique within one allocation.
    #[must_use]
    pub fn instance_id(&self) -> String {
        let id = &self.model.model().id;
        if self.duplicate && self.duplicate_number > 1 {
            format!("{id}_dup_{}", self.duplicate_number)
        } else {
            id.clone()
        }
    }
}

/// Result of one allocation call: the instances that fit plus the count
/// that did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarAllocation {
    cars: SmallVec<[CarInstance; 8]>,
    shortfall: usize,
}

impl CarAllocation {
    fn new(cars: SmallVec<[CarInstance; 8]>, requested: usize) -> Self {
        let shortfall = requested.saturating_sub(cars.len());
        Self { cars, shortfall }
    }

    #[must_use]
    pub fn cars(&self) -> &[CarInstance] {
        &self.cars
    }

    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.cars.len()
    }

    #[must_use]
    pub const fn shortfall(&self) -> usize {
        self.shortfall
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.shortfall == 0
    }

    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.cars.iter().any(|car| car.duplicate)
    }

    #[must_use]
    pub fn has_variants(&self) -> bool {
        self.cars.iter().any(|car| car.model.is_variant())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("requested {requested} cars exceeds hard cap of {cap}")]
    RequestExceedsHardCap { requested: usize, cap: usize },
}

/// Owns the base models and generated variants, and allocates instances
/// for a race grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarPoolManager {
    base_models: Vec<CarModel>,
    variants: Vec<CarVariant>,
}

impl CarPoolManager {
    #[must_use]
    pub fn new(base_models: Vec<CarModel>) -> Self {
        Self {
            base_models,
            variants: Vec::new(),
        }
    }

    /// Pool backed by the fixed sixteen-car roster.
    #[must_use]
    pub fn with_roster() -> Self {
        Self::new(crate::roster::base_models())
    }

    #[must_use]
    pub fn base_models(&self) -> &[CarModel] {
        &self.base_models
    }

    #[must_use]
    pub fn variants(&self) -> &[CarVariant] {
        &self.variants
    }

    /// Drop every generated variant, restoring the pool to its base roster.
    pub fn clear_variants(&mut self) {
        self.variants.clear();
    }

    /// Unique models currently available: base roster plus live variants.
    #[must_use]
    pub fn available_models(&self) -> usize {
        self.base_models.len() + self.variants.len()
    }

    #[must_use]
    pub const fn max_duplicates_per_model(&self) -> u32 {
        MAX_DUPLICATES_PER_MODEL
    }

    /// Ceiling on total instances, bounded by the hard cap.
    #[must_use]
    pub fn total_instances_allowed(&self) -> usize {
        let with_duplicates = self.available_models() * MAX_DUPLICATES_PER_MODEL as usize;
        HARD_CAP_TOTAL_CARS.min(with_duplicates)
    }

    /// How many variants may still be generated on top of the base pool.
    fn variant_budget(&self) -> usize {
        self.base_models.len() * VARIANT_POOL_PERCENTAGE / 100
    }

    /// Instance ceiling under a specific variant/duplicate policy, bounded
    /// by the hard cap. This is what validation compares against, so its
    /// remediation hints line up with what allocation can actually do.
    #[must_use]
    pub fn capacity_with_policy(&self, allow_variants: bool, allow_duplicates: bool) -> usize {
        let reachable = if allow_duplicates {
            self.available_models() * MAX_DUPLICATES_PER_MODEL as usize
        } else if allow_variants {
            self.available_models() + self.variant_budget()
        } else {
            self.available_models()
        };
        HARD_CAP_TOTAL_CARS.min(reachable)
    }

    /// Whether a request of `requested` total cars can be satisfied under
    /// the given policy flags.
    #[must_use]
    pub fn can_accommodate(
        &self,
        requested: usize,
        allow_variants: bool,
        allow_duplicates: bool,
    ) -> bool {
        if requested > HARD_CAP_TOTAL_CARS {
            return false;
        }
        let available = self.available_models();
        if requested <= available {
            return true;
        }
        if allow_duplicates {
            return requested <= available * MAX_DUPLICATES_PER_MODEL as usize;
        }
        if allow_variants {
            return requested <= available + self.variant_budget();
        }
        false
    }

    /// Allocate `count` instances for a race.
    ///
    /// Passes run in order until the request is filled: each base model
    /// once, each existing variant once (skipping variants whose base was
    /// already placed), newly generated variants while the variant budget
    /// lasts, then duplicates numbered 2 up to the per-model cap. Whatever
    /// remains unfilled is reported as the allocation's shortfall.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::RequestExceedsHardCap`] if `count` is past the
    /// hard cap; no partial allocation is performed in that case.
    pub fn reserve_instances(
        &mut self,
        count: usize,
        allow_variants: bool,
        allow_duplicates: bool,
    ) -> Result<CarAllocation, PoolError> {
        if count > HARD_CAP_TOTAL_CARS {
            return Err(PoolError::RequestExceedsHardCap {
                requested: count,
                cap: HARD_CAP_TOTAL_CARS,
            });
        }

        let mut allocated: SmallVec<[CarInstance; 8]> = SmallVec::new();
        let mut used_model_ids: HashSet<String> = HashSet::new();

        for model in &self.base_models {
            if allocated.len() >= count {
                break;
            }
            allocated.push(CarInstance::original(AllocatedModel::Base(model.clone())));
            used_model_ids.insert(model.id.clone());
        }

        for variant in &self.variants {
            if allocated.len() >= count {
                break;
            }
            if !used_model_ids.contains(&variant.base_model_id) {
                allocated.push(CarInstance::original(AllocatedModel::Variant(
                    variant.clone(),
                )));
                used_model_ids.insert(variant.id().to_string());
            }
        }

        if allocated.len() < count && allow_variants && !self.base_models.is_empty() {
            let budget = self.variant_budget().saturating_sub(self.variants.len());
            let wanted = (count - allocated.len()).min(budget);
            let base_count = self.base_models.len();
            for i in 0..wanted {
                if allocated.len() >= count {
                    break;
                }
                let variant =
                    generate_variant(&self.base_models[i % base_count], self.variants.len() + 1);
                self.variants.push(variant.clone());
                allocated.push(CarInstance::original(AllocatedModel::Variant(variant)));
            }
        }

        if allocated.len() < count && allow_duplicates && !self.base_models.is_empty() {
            let needed = count - allocated.len();
            let base_count = self.base_models.len();
            for i in 0..needed {
                let duplicate_number = u32::try_from(i / base_count).unwrap_or(u32::MAX) + 2;
                if duplicate_number <= MAX_DUPLICATES_PER_MODEL {
                    allocated.push(CarInstance::new(
                        AllocatedModel::Base(self.base_models[i % base_count].clone()),
                        true,
                        duplicate_number,
                    ));
                }
            }
        }

        Ok(CarAllocation::new(allocated, count))
    }
}

/// Seed for a variant's RNG stream: stable hash of the base id offset by
/// the variant number, so the same roster yields the same variant sequence
/// across runs and platforms.
fn variant_seed(base_model_id: &str, variant_number: usize) -> u64 {
    XxHash64::oneshot(0, base_model_id.as_bytes()).wrapping_add(variant_number as u64)
}

/// Derive a variant from a base model. Pure: the same `(base, number)`
/// pair always produces the same colors and modifiers.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_variant(base: &CarModel, variant_number: usize) -> CarVariant {
    let mut rng = ChaCha20Rng::seed_from_u64(variant_seed(&base.id, variant_number));

    let mut color = base.color;
    for channel in &mut color {
        let shift = rng.gen_range(-VARIANT_COLOR_SHIFT..=VARIANT_COLOR_SHIFT);
        *channel = (i32::from(*channel) + shift).clamp(0, 255) as u8;
    }

    let mods = StatModifiers {
        top_speed: rng.gen_range(VARIANT_TOP_SPEED_MIN..=VARIANT_TOP_SPEED_MAX),
        handling: rng.gen_range(VARIANT_HANDLING_MIN..=VARIANT_HANDLING_MAX),
        acceleration: rng.gen_range(VARIANT_ACCEL_MIN..=VARIANT_ACCEL_MAX),
    };

    CarVariant {
        model: CarModel {
            id: format!("{}_variant_{}", base.id, variant_number),
            name: format!("{} Variant {}", base.name, variant_number),
            color,
            model_file: base.model_file.clone(),
        },
        base_model_id: base.id.clone(),
        mods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool(size: usize) -> CarPoolManager {
        let models = (0..size)
            .map(|i| {
                CarModel::new(
                    &format!("car_{i}"),
                    &format!("Car {i}"),
                    [10 * (i as u8 + 1), 128, 200],
                    &format!("models/car_{i}.rad"),
                )
            })
            .collect();
        CarPoolManager::new(models)
    }

    #[test]
    fn capacity_math_respects_hard_cap() {
        let pool = test_pool(16);
        assert_eq!(pool.available_models(), 16);
        assert_eq!(pool.total_instances_allowed(), HARD_CAP_TOTAL_CARS);

        let small = test_pool(4);
        assert_eq!(small.total_instances_allowed(), 12);
    }

    #[test]
    fn can_accommodate_policy_matrix() {
        let pool = test_pool(6);
        assert!(pool.can_accommodate(6, false, false));
        assert!(!pool.can_accommodate(7, false, false));
        // 6 base + 3 variant budget
        assert!(pool.can_accommodate(9, true, false));
        assert!(!pool.can_accommodate(10, true, false));
        // duplicates triple the pool
        assert!(pool.can_accommodate(18, false, true));
        assert!(!pool.can_accommodate(19, false, true));
        assert!(!pool.can_accommodate(HARD_CAP_TOTAL_CARS + 1, true, true));
    }

    #[test]
    fn policy_capacity_tracks_flags() {
        let pool = test_pool(6);
        assert_eq!(pool.capacity_with_policy(false, false), 6);
        assert_eq!(pool.capacity_with_policy(true, false), 9);
        assert_eq!(pool.capacity_with_policy(false, true), 18);
        assert_eq!(pool.capacity_with_policy(true, true), 18);

        let big = test_pool(16);
        assert_eq!(big.capacity_with_policy(true, true), HARD_CAP_TOTAL_CARS);
    }

    #[test]
    fn base_pass_fills_small_requests() {
        let mut pool = test_pool(6);
        let allocation = pool.reserve_instances(4, false, false).unwrap();
        assert_eq!(allocation.allocated_count(), 4);
        assert_eq!(allocation.shortfall(), 0);
        assert!(!allocation.has_duplicates());
        assert!(!allocation.has_variants());
        assert!(pool.variants().is_empty());
    }

    #[test]
    fn exhausted_pool_reports_shortfall() {
        let mut pool = test_pool(6);
        let allocation = pool.reserve_instances(10, false, false).unwrap();
        assert_eq!(allocation.allocated_count(), 6);
        assert_eq!(allocation.shortfall(), 4);
    }

    #[test]
    fn variant_pass_generates_up_to_budget() {
        let mut pool = test_pool(6);
        let allocation = pool.reserve_instances(10, true, false).unwrap();
        // 6 base + floor(6 * 50%) = 9 total
        assert_eq!(allocation.allocated_count(), 9);
        assert_eq!(allocation.shortfall(), 1);
        assert!(allocation.has_variants());
        assert_eq!(pool.variants().len(), 3);
    }

    #[test]
    fn duplicate_pass_cycles_base_models() {
        let mut pool = test_pool(6);
        let allocation = pool.reserve_instances(10, false, true).unwrap();
        assert_eq!(allocation.allocated_count(), 10);
        assert_eq!(allocation.shortfall(), 0);
        assert!(allocation.has_duplicates());

        for instance in &allocation.cars()[6..] {
            assert!(instance.duplicate);
            assert_eq!(instance.duplicate_number, 2);
        }
        let names: Vec<_> = allocation.cars()[6..]
            .iter()
            .map(|c| c.driver_name.as_str())
            .collect();
        assert_eq!(names[0], "Car 0 Driver 2");
    }

    #[test]
    fn duplicates_stop_at_per_model_cap() {
        let mut pool = test_pool(2);
        // 2 base + duplicates 2..=3 per model = 6 reachable
        let allocation = pool.reserve_instances(8, false, true).unwrap();
        assert_eq!(allocation.allocated_count(), 6);
        assert_eq!(allocation.shortfall(), 2);
        let max_dup = allocation
            .cars()
            .iter()
            .map(|c| c.duplicate_number)
            .max()
            .unwrap();
        assert_eq!(max_dup, MAX_DUPLICATES_PER_MODEL);
    }

    #[test]
    fn request_past_hard_cap_is_fatal() {
        let mut pool = test_pool(16);
        let err = pool.reserve_instances(40, true, true).unwrap_err();
        assert_eq!(
            err,
            PoolError::RequestExceedsHardCap {
                requested: 40,
                cap: HARD_CAP_TOTAL_CARS,
            }
        );
        assert!(pool.variants().is_empty());
    }

    #[test]
    fn variant_generation_is_deterministic() {
        let base = CarModel::new("car_a", "Car A", [120, 60, 200], "models/car_a.rad");
        let first = generate_variant(&base, 1);
        let second = generate_variant(&base, 1);
        assert_eq!(first, second);

        let other = generate_variant(&base, 2);
        assert_ne!(first.model.id, other.model.id);
    }

    #[test]
    fn variant_perturbations_stay_in_range() {
        let base = CarModel::new("car_b", "Car B", [0, 128, 255], "models/car_b.rad");
        for number in 1..=8 {
            let variant = generate_variant(&base, number);
            assert!(variant.mods.top_speed >= VARIANT_TOP_SPEED_MIN);
            assert!(variant.mods.top_speed <= VARIANT_TOP_SPEED_MAX);
            assert!(variant.mods.handling >= VARIANT_HANDLING_MIN);
            assert!(variant.mods.handling <= VARIANT_HANDLING_MAX);
            assert!(variant.mods.acceleration >= VARIANT_ACCEL_MIN);
            assert!(variant.mods.acceleration <= VARIANT_ACCEL_MAX);
            for (channel, base_channel) in variant.model.color.iter().zip(base.color) {
                let drift = (i32::from(*channel) - i32::from(base_channel)).abs();
                assert!(drift <= VARIANT_COLOR_SHIFT, "color drifted by {drift}");
            }
        }
    }

    #[test]
    fn allocation_sequence_repeats_for_identical_pool_state() {
        let mut first_pool = test_pool(6);
        let mut second_pool = test_pool(6);
        let first = first_pool.reserve_instances(9, true, true).unwrap();
        let second = second_pool.reserve_instances(9, true, true).unwrap();
        let ids = |a: &CarAllocation| {
            a.cars()
                .iter()
                .map(CarInstance::instance_id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn stat_modifier_lookup_defaults_to_neutral() {
        let mods = StatModifiers {
            top_speed: 1.04,
            handling: 0.97,
            acceleration: 1.01,
        };
        assert!((mods.lookup("topSpeed") - 1.04).abs() < f32::EPSILON);
        assert!((mods.lookup("downforce") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn clear_variants_restores_base_pool() {
        let mut pool = test_pool(6);
        pool.reserve_instances(9, true, false).unwrap();
        assert!(!pool.variants().is_empty());
        pool.clear_variants();
        assert_eq!(pool.available_models(), 6);
    }
}
