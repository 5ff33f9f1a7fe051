//! Built-in campaign stage data.
//!
//! Ships the seventeen campaign descriptors and the limits sidecar as
//! static assets so the engine works without any platform data path.
//! Platforms with modded or external stages provide their own
//! [`StageSource`](crate::StageSource) instead.

use crate::StageSource;
use crate::constants::NUMBER_OF_STAGES;
use crate::track::TrackLimits;
use thiserror::Error;

const STAGE_DATA: [&str; NUMBER_OF_STAGES] = [
    include_str!("../assets/stages/1.txt"),
    include_str!("../assets/stages/2.txt"),
    include_str!("../assets/stages/3.txt"),
    include_str!("../assets/stages/4.txt"),
    include_str!("../assets/stages/5.txt"),
    include_str!("../assets/stages/6.txt"),
    include_str!("../assets/stages/7.txt"),
    include_str!("../assets/stages/8.txt"),
    include_str!("../assets/stages/9.txt"),
    include_str!("../assets/stages/10.txt"),
    include_str!("../assets/stages/11.txt"),
    include_str!("../assets/stages/12.txt"),
    include_str!("../assets/stages/13.txt"),
    include_str!("../assets/stages/14.txt"),
    include_str!("../assets/stages/15.txt"),
    include_str!("../assets/stages/16.txt"),
    include_str!("../assets/stages/17.txt"),
];

const LIMITS_DATA: &str = include_str!("../assets/limits.json");

#[derive(Debug, Error)]
pub enum StageDataError {
    #[error("unknown stage number {number} (built-in campaign has {total})")]
    UnknownStage { number: usize, total: usize },
    #[error("limits sidecar is malformed: {0}")]
    MalformedLimits(#[from] serde_json::Error),
}

/// Stage source backed by the compiled-in campaign assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStages;

impl StageSource for BuiltinStages {
    type Error = StageDataError;

    fn stage_count(&self) -> usize {
        STAGE_DATA.len()
    }

    fn stage_text(&self, stage_number: usize) -> Result<String, Self::Error> {
        let index = stage_number
            .checked_sub(1)
            .filter(|&i| i < STAGE_DATA.len())
            .ok_or(StageDataError::UnknownStage {
                number: stage_number,
                total: STAGE_DATA.len(),
            })?;
        Ok(STAGE_DATA[index].to_string())
    }

    fn limits(&self) -> Result<Vec<TrackLimits>, Self::Error> {
        Ok(serde_json::from_str(LIMITS_DATA)?)
    }
}
