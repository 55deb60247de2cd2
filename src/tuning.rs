//! Game balance
//!
//! Every mini-game reads its constants from here. Defaults match the arcade
//! as shipped; a JSON file can override any subset of them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::state::RampConfig;

/// HoverDisk rally constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverDiskTuning {
    /// Points needed to win a match
    pub max_score: u32,
    /// Launch travel time range, whole seconds (inclusive)
    pub min_travel_secs: u32,
    pub max_travel_secs: u32,
    /// How far past the table a launch aims
    pub launch_distance: f32,
    /// Probability of the high-pitched hit sound
    pub high_sound_chance: f32,
}

impl Default for HoverDiskTuning {
    fn default() -> Self {
        Self {
            max_score: 10,
            min_travel_secs: 20,
            max_travel_secs: 50,
            launch_distance: 100.0,
            high_sound_chance: 0.4,
        }
    }
}

/// MadmanRacing constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MadmanTuning {
    /// Seconds for one enemy drop at difficulty 1
    pub base_time: f32,
    /// Vertical distance the enemy and mid line travel
    pub drop_distance: f32,
    /// Tangent distance of each lane from the center line
    pub lane_offset: f32,
    /// Probability the enemy picks the left lane
    pub left_lane_chance: f32,
    /// Seconds per mid line loop
    pub mid_line_period: f32,
    pub ramp: RampConfig,
}

impl Default for MadmanTuning {
    fn default() -> Self {
        Self {
            base_time: 2.0,
            drop_distance: 3.0,
            lane_offset: 0.5,
            left_lane_chance: 0.4,
            mid_line_period: 0.5,
            ramp: RampConfig::new(0.5, 5.0, 10),
        }
    }
}

/// PlatypusPlatoon constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatypusTuning {
    /// Seconds per animation leg at difficulty 1
    pub base_time: f32,
    pub lives: u32,
    pub ramp: RampConfig,
}

impl Default for PlatypusTuning {
    fn default() -> Self {
        Self {
            base_time: 5.0,
            lives: 5,
            ramp: RampConfig {
                first_every: 1,
                ..RampConfig::new(1.0, 5.0, 10)
            },
        }
    }
}

/// All game balance, one section per mini-game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub hover_disk: HoverDiskTuning,
    pub madman: MadmanTuning,
    pub platypus: PlatypusTuning,
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("parse tuning JSON: {e}"))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read tuning: {e}"))?;
        Self::from_json(&data)
    }

    /// Load a file, falling back to defaults. The second value explains why
    /// the fallback happened.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(tuning) => (tuning, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Human-readable problems that will make a game misbehave
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();

        let hd = &self.hover_disk;
        if hd.max_score == 0 {
            w.push("hover_disk.max_score is 0; every goal ends the match".into());
        }
        if hd.min_travel_secs == 0 {
            w.push("hover_disk.min_travel_secs is 0; launches may arrive instantly".into());
        }
        if hd.min_travel_secs > hd.max_travel_secs {
            w.push(format!(
                "hover_disk travel range inverted ({} > {}); using min for both",
                hd.min_travel_secs, hd.max_travel_secs
            ));
        }
        if !(0.0..=1.0).contains(&hd.high_sound_chance) {
            w.push(format!("hover_disk.high_sound_chance {} outside [0, 1]", hd.high_sound_chance));
        }

        let mm = &self.madman;
        if mm.base_time <= 0.0 {
            w.push(format!("madman.base_time {} must be > 0", mm.base_time));
        }
        if mm.mid_line_period <= 0.0 {
            w.push(format!("madman.mid_line_period {} must be > 0", mm.mid_line_period));
        }
        if !(0.0..=1.0).contains(&mm.left_lane_chance) {
            w.push(format!("madman.left_lane_chance {} outside [0, 1]", mm.left_lane_chance));
        }
        validate_ramp("madman.ramp", &mm.ramp, &mut w);

        let pp = &self.platypus;
        if pp.base_time <= 0.0 {
            w.push(format!("platypus.base_time {} must be > 0", pp.base_time));
        }
        if pp.lives == 0 {
            w.push("platypus.lives is 0; misses never end the game".into());
        }
        validate_ramp("platypus.ramp", &pp.ramp, &mut w);

        w
    }
}

fn validate_ramp(name: &str, ramp: &RampConfig, w: &mut Vec<String>) {
    if ramp.base_level <= 0.0 {
        w.push(format!("{name}.base_level {} must be > 0", ramp.base_level));
    }
    if ramp.max_level < ramp.base_level {
        w.push(format!(
            "{name}.max_level {} below base_level {}; difficulty never rises",
            ramp.max_level, ramp.base_level
        ));
    }
    if ramp.every == 0 || ramp.first_every == 0 {
        w.push(format!("{name} step counts of 0 are treated as 1"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_clean() {
        assert!(Tuning::default().validate().is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "madman": { "base_time": 3.0 } }"#).unwrap();
        assert_eq!(tuning.madman.base_time, 3.0);
        assert_eq!(tuning.madman.lane_offset, 0.5);
        assert_eq!(tuning.hover_disk.max_score, 10);
        assert_eq!(tuning.platypus.ramp.first_every, 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let tuning = Tuning::default();
        let back = Tuning::from_json(&tuning.to_json()).unwrap();
        assert_eq!(back.platypus.lives, 5);
        assert_eq!(back.madman.ramp, tuning.madman.ramp);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Tuning::from_json("{ not json").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let (tuning, err) = Tuning::load_or_default("this/file/does/not/exist.json");
        assert!(err.is_some());
        assert_eq!(tuning.hover_disk.min_travel_secs, 20);
    }

    #[test]
    fn test_validate_detects_warnings() {
        let mut bad = Tuning::default();
        bad.hover_disk.min_travel_secs = 60;
        bad.madman.base_time = 0.0;
        bad.platypus.ramp.max_level = 0.5;
        let warnings = bad.validate();
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert!(warnings.iter().any(|w| w.contains("travel range inverted")));
    }
}
