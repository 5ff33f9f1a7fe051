//! Track metadata, stage-descriptor parsing, and the track catalog.
//!
//! Stage descriptors are line-oriented text records (`name(...)`,
//! `nlaps(...)`, `chk(...)`, ...). Lap bounds and the concurrent-car cap
//! are not part of the descriptor format; they come from an optional
//! limits sidecar keyed by stage number, with safe fallbacks for both.

use crate::StageSource;
use crate::constants::{
    COMPLEX_TRACK_AI, COMPLEX_TRACK_CHECKPOINTS, DEFAULT_RECOMMENDED_AI, FALLBACK_DEFAULT_LAPS,
    FALLBACK_GROUND_COLOR, FALLBACK_MAX_CONCURRENT_CARS, FALLBACK_MAX_LAPS, FALLBACK_MIN_LAPS,
    FALLBACK_SKY_COLOR, NUMBER_OF_PLAYERS, SIMPLE_TRACK_AI, SIMPLE_TRACK_CHECKPOINTS,
};
use crate::settings::AiDifficulty;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"name\(([^)]+)\)").expect("static pattern compiles"))
}

fn nlaps_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"nlaps\((\d+)\)").expect("static pattern compiles"))
}

fn sky_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"sky\((\d+),(\d+),(\d+)\)").expect("static pattern compiles"))
}

fn ground_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ground\((\d+),(\d+),(\d+)\)").expect("static pattern compiles"))
}

fn soundtrack_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"soundtrack\(([^)]+)\)").expect("static pattern compiles"))
}

fn checkpoint_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"chk\(([^)]+)\)").expect("static pattern compiles"))
}

/// Per-stage bounds from the limits sidecar. Absent fields fall back to
/// the descriptor value or the engine defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLimits {
    /// 1-based stage number this entry applies to.
    pub stage: usize,
    #[serde(default)]
    pub default_laps: Option<u32>,
    #[serde(default)]
    pub min_laps: Option<u32>,
    #[serde(default)]
    pub max_laps: Option<u32>,
    #[serde(default)]
    pub max_concurrent_cars: Option<usize>,
}

/// Metadata for one race track: display name, lap bounds, car capacity,
/// and the cosmetic fields the settings screens surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    name: String,
    default_laps: u32,
    min_laps: u32,
    max_laps: u32,
    max_concurrent_cars: usize,
    checkpoint_count: usize,
    sky_color: [u8; 3],
    ground_color: [u8; 3],
    soundtrack: String,
    /// True when the lap default came from track data rather than the
    /// engine fallback; only declared defaults override player lap picks.
    declared_laps: bool,
}

impl TrackMetadata {
    /// Build metadata with explicit bounds, normalized so that
    /// `1 <= min <= default <= max` and at least two cars fit.
    #[must_use]
    pub fn new(
        name: &str,
        default_laps: u32,
        min_laps: u32,
        max_laps: u32,
        max_concurrent_cars: usize,
    ) -> Self {
        let min_laps = min_laps.max(1);
        let max_laps = max_laps.max(min_laps);
        Self {
            name: name.to_string(),
            default_laps: default_laps.clamp(min_laps, max_laps),
            min_laps,
            max_laps,
            max_concurrent_cars: max_concurrent_cars.max(2),
            checkpoint_count: 0,
            sky_color: FALLBACK_SKY_COLOR,
            ground_color: FALLBACK_GROUND_COLOR,
            soundtrack: String::new(),
            declared_laps: true,
        }
    }

    /// Fallback metadata for a track whose data is missing or unreadable.
    #[must_use]
    pub fn fallback(name: &str) -> Self {
        let mut track = Self::new(
            name,
            FALLBACK_DEFAULT_LAPS,
            FALLBACK_MIN_LAPS,
            FALLBACK_MAX_LAPS,
            FALLBACK_MAX_CONCURRENT_CARS,
        );
        track.declared_laps = false;
        track
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn default_laps(&self) -> u32 {
        self.default_laps
    }

    #[must_use]
    pub const fn min_laps(&self) -> u32 {
        self.min_laps
    }

    #[must_use]
    pub const fn max_laps(&self) -> u32 {
        self.max_laps
    }

    #[must_use]
    pub const fn max_concurrent_cars(&self) -> usize {
        self.max_concurrent_cars
    }

    #[must_use]
    pub const fn checkpoint_count(&self) -> usize {
        self.checkpoint_count
    }

    #[must_use]
    pub const fn sky_color(&self) -> [u8; 3] {
        self.sky_color
    }

    #[must_use]
    pub const fn ground_color(&self) -> [u8; 3] {
        self.ground_color
    }

    #[must_use]
    pub fn soundtrack(&self) -> &str {
        &self.soundtrack
    }

    #[must_use]
    pub const fn specifies_default_laps(&self) -> bool {
        self.declared_laps
    }

    #[must_use]
    pub const fn is_valid_lap_count(&self, laps: u32) -> bool {
        laps >= self.min_laps && laps <= self.max_laps
    }

    #[must_use]
    pub fn is_valid_car_count(&self, cars: usize) -> bool {
        cars >= 1 && cars <= self.max_concurrent_cars
    }

    #[must_use]
    pub const fn clamp_laps(&self, laps: u32) -> u32 {
        if laps < self.min_laps {
            self.min_laps
        } else if laps > self.max_laps {
            self.max_laps
        } else {
            laps
        }
    }

    #[must_use]
    pub fn clamp_car_count(&self, cars: usize) -> usize {
        cars.clamp(1, self.max_concurrent_cars)
    }

    /// Suggested AI count from checkpoint complexity: busy tracks get
    /// fewer opponents, open ones get more, capped at the engine grid.
    #[must_use]
    pub fn recommended_ai_count(&self) -> usize {
        let recommended = if self.checkpoint_count > COMPLEX_TRACK_CHECKPOINTS {
            COMPLEX_TRACK_AI
        } else if self.checkpoint_count < SIMPLE_TRACK_CHECKPOINTS {
            SIMPLE_TRACK_AI
        } else {
            DEFAULT_RECOMMENDED_AI
        };
        recommended.min(NUMBER_OF_PLAYERS - 1)
    }

    /// Rough difficulty estimate from checkpoint complexity.
    #[must_use]
    pub const fn estimated_difficulty(&self) -> AiDifficulty {
        match self.checkpoint_count {
            0..=3 => AiDifficulty::Easy,
            4..=8 => AiDifficulty::Normal,
            9..=15 => AiDifficulty::Hard,
            _ => AiDifficulty::Insane,
        }
    }
}

fn parse_color(captures: &regex::Captures<'_>) -> Option<[u8; 3]> {
    let r = captures.get(1)?.as_str().parse().ok()?;
    let g = captures.get(2)?.as_str().parse().ok()?;
    let b = captures.get(3)?.as_str().parse().ok()?;
    Some([r, g, b])
}

/// Parse one stage descriptor. Unrecognized lines are skipped and missing
/// fields fall back, so any input yields usable metadata.
#[must_use]
pub fn parse_stage_descriptor(
    fallback_name: &str,
    text: &str,
    limits: Option<&TrackLimits>,
) -> TrackMetadata {
    let mut name: Option<String> = None;
    let mut declared_laps: Option<u32> = None;
    let mut sky_color = FALLBACK_SKY_COLOR;
    let mut ground_color = FALLBACK_GROUND_COLOR;
    let mut soundtrack = String::new();
    let mut checkpoint_count = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(captures) = name_pattern().captures(line) {
            name = Some(captures[1].to_string());
        } else if let Some(captures) = nlaps_pattern().captures(line) {
            declared_laps = captures[1].parse().ok();
        } else if let Some(captures) = sky_pattern().captures(line) {
            if let Some(color) = parse_color(&captures) {
                sky_color = color;
            }
        } else if let Some(captures) = ground_pattern().captures(line) {
            if let Some(color) = parse_color(&captures) {
                ground_color = color;
            }
        } else if let Some(captures) = soundtrack_pattern().captures(line) {
            soundtrack = captures[1].to_string();
        } else if checkpoint_pattern().is_match(line) {
            checkpoint_count += 1;
        }
    }

    if name.is_none() {
        log::debug!("stage descriptor for '{fallback_name}' has no name field, using fallback");
    }

    let sidecar_default = limits.and_then(|l| l.default_laps);
    let default_laps = declared_laps
        .or(sidecar_default)
        .unwrap_or(FALLBACK_DEFAULT_LAPS);
    let min_laps = limits.and_then(|l| l.min_laps).unwrap_or(FALLBACK_MIN_LAPS);
    let max_laps = limits.and_then(|l| l.max_laps).unwrap_or(FALLBACK_MAX_LAPS);
    let max_cars = limits
        .and_then(|l| l.max_concurrent_cars)
        .unwrap_or(FALLBACK_MAX_CONCURRENT_CARS);

    let mut track = TrackMetadata::new(
        name.as_deref().unwrap_or(fallback_name),
        default_laps,
        min_laps,
        max_laps,
        max_cars,
    );
    track.checkpoint_count = checkpoint_count;
    track.sky_color = sky_color;
    track.ground_color = ground_color;
    track.soundtrack = soundtrack;
    track.declared_laps = declared_laps.is_some() || sidecar_default.is_some();
    track
}

/// Ordered collection of every track the engine knows about. Loaded once
/// at startup; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCatalog {
    tracks: Vec<TrackMetadata>,
}

impl TrackCatalog {
    /// Load and parse every stage the source provides.
    ///
    /// # Errors
    ///
    /// Returns the source's error if descriptor text or the limits sidecar
    /// cannot be loaded. Parse problems never error; they fall back.
    pub fn load<S: StageSource>(source: &S) -> Result<Self, S::Error> {
        let limits = source.limits()?;
        let mut tracks = Vec::with_capacity(source.stage_count());
        for stage in 1..=source.stage_count() {
            let text = source.stage_text(stage)?;
            let entry = limits.iter().find(|l| l.stage == stage);
            tracks.push(parse_stage_descriptor(&format!("Stage {stage}"), &text, entry));
        }
        Ok(Self { tracks })
    }

    /// Catalog from pre-built metadata, for tests and custom campaigns.
    #[must_use]
    pub fn from_tracks(tracks: Vec<TrackMetadata>) -> Self {
        Self { tracks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub fn get(&self, track_index: usize) -> Option<&TrackMetadata> {
        self.tracks.get(track_index)
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackMetadata] {
        &self.tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = "\
name(Rust Harbor)
nlaps(5)
sky(90,110,140)
ground(60,58,52)
soundtrack(dockside)
chk(120,0,300)
chk(240,0,340)
chk(400,0,180)
chk(560,0,90)
";

    #[test]
    fn descriptor_fields_are_extracted() {
        let track = parse_stage_descriptor("Stage 9", DESCRIPTOR, None);
        assert_eq!(track.name(), "Rust Harbor");
        assert_eq!(track.default_laps(), 5);
        assert_eq!(track.sky_color(), [90, 110, 140]);
        assert_eq!(track.ground_color(), [60, 58, 52]);
        assert_eq!(track.soundtrack(), "dockside");
        assert_eq!(track.checkpoint_count(), 4);
        assert!(track.specifies_default_laps());
    }

    #[test]
    fn garbage_descriptor_falls_back() {
        let track = parse_stage_descriptor("Stage 3", "set(1,2,3)\nfix(0)\n", None);
        assert_eq!(track.name(), "Stage 3");
        assert_eq!(track.default_laps(), FALLBACK_DEFAULT_LAPS);
        assert_eq!(track.max_concurrent_cars(), FALLBACK_MAX_CONCURRENT_CARS);
        assert!(!track.specifies_default_laps());
    }

    #[test]
    fn sidecar_limits_override_fallbacks() {
        let limits = TrackLimits {
            stage: 9,
            default_laps: None,
            min_laps: Some(2),
            max_laps: Some(12),
            max_concurrent_cars: Some(12),
        };
        let track = parse_stage_descriptor("Stage 9", DESCRIPTOR, Some(&limits));
        assert_eq!(track.min_laps(), 2);
        assert_eq!(track.max_laps(), 12);
        assert_eq!(track.max_concurrent_cars(), 12);
        // descriptor still wins for the default
        assert_eq!(track.default_laps(), 5);
    }

    #[test]
    fn bounds_are_normalized() {
        let track = TrackMetadata::new("Backwards", 50, 0, 0, 0);
        assert_eq!(track.min_laps(), 1);
        assert_eq!(track.max_laps(), 1);
        assert_eq!(track.default_laps(), 1);
        assert_eq!(track.max_concurrent_cars(), 2);
    }

    #[test]
    fn lap_validation_and_clamping() {
        let track = TrackMetadata::new("Clamp", 3, 2, 8, 8);
        assert!(track.is_valid_lap_count(2));
        assert!(track.is_valid_lap_count(8));
        assert!(!track.is_valid_lap_count(1));
        assert!(!track.is_valid_lap_count(9));
        assert_eq!(track.clamp_laps(1), 2);
        assert_eq!(track.clamp_laps(20), 8);
        assert_eq!(track.clamp_car_count(0), 1);
        assert_eq!(track.clamp_car_count(99), 8);
    }

    #[test]
    fn checkpoint_complexity_drives_recommendations() {
        let mut simple = TrackMetadata::fallback("Simple");
        simple.checkpoint_count = 2;
        // raised recommendation still caps at the engine grid
        assert_eq!(simple.recommended_ai_count(), NUMBER_OF_PLAYERS - 1);
        assert_eq!(simple.estimated_difficulty(), AiDifficulty::Easy);

        let mut complex = TrackMetadata::fallback("Complex");
        complex.checkpoint_count = 14;
        assert_eq!(complex.recommended_ai_count(), COMPLEX_TRACK_AI);
        assert_eq!(complex.estimated_difficulty(), AiDifficulty::Hard);

        let mut extreme = TrackMetadata::fallback("Extreme");
        extreme.checkpoint_count = 20;
        assert_eq!(extreme.estimated_difficulty(), AiDifficulty::Insane);
    }
}
