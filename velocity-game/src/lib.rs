//! VelocityX Race Configuration Engine
//!
//! Platform-agnostic core logic for staging a race: campaign unlock
//! progression, the car pool with procedural variants and duplicates, and
//! validation of requested race parameters against track and pool limits.
//! This crate has no UI or platform dependencies; rendering, physics, and
//! input live elsewhere and consume the configurations produced here.

pub mod constants;
pub mod manager;
pub mod pool;
pub mod roster;
pub mod settings;
pub mod stages;
pub mod track;
pub mod unlocks;

// Re-export commonly used types
pub use manager::{RaceConfigManager, RaceConfiguration};
pub use pool::{
    AllocatedModel, CarAllocation, CarInstance, CarModel, CarPoolManager, CarVariant, PoolError,
    StatModifiers,
};
pub use roster::{CAR_ROSTER, CarSpec, CarStats};
pub use settings::{AiDifficulty, RaceSettings, RaceSettingsBuilder, ValidationResult};
pub use stages::{BuiltinStages, StageDataError};
pub use track::{TrackCatalog, TrackLimits, TrackMetadata, parse_stage_descriptor};
pub use unlocks::UnlockProgression;

/// Trait for abstracting stage-data loading.
/// Platform-specific implementations should provide this; the built-in
/// campaign ships as [`BuiltinStages`].
pub trait StageSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of stages this source provides.
    fn stage_count(&self) -> usize;

    /// Raw descriptor text for a 1-based stage number.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage data cannot be loaded.
    fn stage_text(&self, stage_number: usize) -> Result<String, Self::Error>;

    /// Per-stage limits sidecar. Sources without one return an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar exists but cannot be parsed.
    fn limits(&self) -> Result<Vec<TrackLimits>, Self::Error>;
}
