//! Centralized engine facts and tuning constants for race configuration.
//!
//! These values define the deterministic math for unlock progression and
//! car pool allocation. Keeping them together ensures that balance can only
//! be adjusted via code changes reviewed in version control.

// Engine facts -------------------------------------------------------------
/// Number of car models in the fixed roster.
pub const NUMBER_OF_CARS: usize = 16;
/// Grid slots the engine can spawn in one race (humans + AI).
pub const NUMBER_OF_PLAYERS: usize = 7;
/// Number of stages in the campaign, including the playground.
pub const NUMBER_OF_STAGES: usize = 17;

// Unlock progression -------------------------------------------------------
/// The raw progression signal counts from this base; stage progress is
/// `signal - STAGE_SIGNAL_OFFSET`, floored at 1.
pub(crate) const STAGE_SIGNAL_OFFSET: i64 = 7;
/// Cars below this roster index are available from the first boot.
pub(crate) const STARTER_ROSTER_SIZE: usize = 8;
/// Each boss car guards this many stages before it joins the roster.
pub(crate) const BOSS_STAGE_SPACING: u32 = 2;

// Car pool -----------------------------------------------------------------
/// Absolute ceiling on allocatable car instances, independent of pool size.
pub const HARD_CAP_TOTAL_CARS: usize = 32;
/// Soft guidance for settings UIs; allocation does not enforce it.
pub const RECOMMENDED_MAX_CARS: usize = 16;
pub(crate) const MAX_DUPLICATES_PER_MODEL: u32 = 3;
/// Only generate up to this percentage of the base pool size as variants.
pub(crate) const VARIANT_POOL_PERCENTAGE: usize = 50;

// Variant tuning -----------------------------------------------------------
pub(crate) const VARIANT_COLOR_SHIFT: i32 = 60;
pub(crate) const VARIANT_TOP_SPEED_MIN: f32 = 0.95;
pub(crate) const VARIANT_TOP_SPEED_MAX: f32 = 1.05;
pub(crate) const VARIANT_HANDLING_MIN: f32 = 0.95;
pub(crate) const VARIANT_HANDLING_MAX: f32 = 1.05;
pub(crate) const VARIANT_ACCEL_MIN: f32 = 0.98;
pub(crate) const VARIANT_ACCEL_MAX: f32 = 1.02;

// Track fallbacks ----------------------------------------------------------
pub(crate) const FALLBACK_DEFAULT_LAPS: u32 = 3;
pub(crate) const FALLBACK_MIN_LAPS: u32 = 1;
pub(crate) const FALLBACK_MAX_LAPS: u32 = 20;
pub(crate) const FALLBACK_MAX_CONCURRENT_CARS: usize = 8;
pub(crate) const FALLBACK_SKY_COLOR: [u8; 3] = [200, 227, 255];
pub(crate) const FALLBACK_GROUND_COLOR: [u8; 3] = [195, 210, 210];

// Recommended AI sizing ----------------------------------------------------
/// Tracks with more checkpoints than this get a reduced AI recommendation.
pub(crate) const COMPLEX_TRACK_CHECKPOINTS: usize = 10;
/// Tracks with fewer checkpoints than this get a raised AI recommendation.
pub(crate) const SIMPLE_TRACK_CHECKPOINTS: usize = 3;
pub(crate) const DEFAULT_RECOMMENDED_AI: usize = 6;
pub(crate) const COMPLEX_TRACK_AI: usize = 5;
pub(crate) const SIMPLE_TRACK_AI: usize = 7;
