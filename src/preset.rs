use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timing_mode::{Timings, TimingMode};

pub const MAX_ROUNDS: u32 = 50;

/// How the countdown is disguised when the timer display is hidden.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HideTimerMode {
    Glitch,
    #[default]
    Blackout,
}

impl HideTimerMode {
    pub fn toggle(&self) -> HideTimerMode {
        match self {
            HideTimerMode::Glitch => HideTimerMode::Blackout,
            HideTimerMode::Blackout => HideTimerMode::Glitch,
        }
    }
}

/// A named training configuration. Serialized as camelCase JSON so the
/// presets file and legacy share tokens share one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub rounds: u32,
    pub round_duration: u32,
    pub rest_duration: u32,
    pub timing_mode: TimingMode,
    pub intense_min: u32,
    pub intense_max: u32,
    pub normal_min: u32,
    pub normal_max: u32,
    pub progressive_intensity: bool,
    pub hide_next_switch: bool,
    pub hide_timer: bool,
    pub hide_timer_mode: HideTimerMode,
    pub warmup_duration: u32,
    pub cooldown_duration: u32,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            id: fresh_id(),
            name: "Preset 1".to_string(),
            rounds: 3,
            round_duration: 180,
            rest_duration: 60,
            timing_mode: TimingMode::Balanced,
            intense_min: 15,
            intense_max: 25,
            normal_min: 20,
            normal_max: 35,
            progressive_intensity: false,
            hide_next_switch: false,
            hide_timer: false,
            hide_timer_mode: HideTimerMode::Blackout,
            warmup_duration: 0,
            cooldown_duration: 0,
        }
    }
}

impl Preset {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rounds are clamped on interactive input; decoded tokens keep their
    /// raw value.
    pub fn set_rounds(&mut self, rounds: u32) {
        self.rounds = rounds.clamp(1, MAX_ROUNDS);
    }

    /// Switching to a named mode copies its derived ranges into the preset,
    /// so `Custom` later starts from those values instead of stale ones.
    pub fn set_timing_mode(&mut self, mode: TimingMode) {
        self.timing_mode = mode;
        self.sync_derived_ranges();
    }

    pub fn set_round_duration(&mut self, secs: u32) {
        self.round_duration = secs;
        self.sync_derived_ranges();
    }

    fn sync_derived_ranges(&mut self) {
        if let Some(t) = self.timing_mode.timings(self.round_duration) {
            self.intense_min = t.intense_min;
            self.intense_max = t.intense_max;
            self.normal_min = t.normal_min;
            self.normal_max = t.normal_max;
        }
    }

    /// Resolve into the runtime configuration: non-custom modes replace the
    /// stored ranges with the ones derived from the round duration.
    pub fn config(&self) -> Config {
        let mut config = Config {
            name: self.name.clone(),
            rounds: self.rounds,
            round_duration: self.round_duration,
            rest_duration: self.rest_duration,
            warmup_duration: self.warmup_duration,
            cooldown_duration: self.cooldown_duration,
            timing_mode: self.timing_mode,
            intense_min: self.intense_min,
            intense_max: self.intense_max,
            normal_min: self.normal_min,
            normal_max: self.normal_max,
            progressive_intensity: self.progressive_intensity,
            hide_next_switch: self.hide_next_switch,
            hide_timer: self.hide_timer,
            hide_timer_mode: self.hide_timer_mode,
        };
        if let Some(t) = self.timing_mode.timings(self.round_duration) {
            config.intense_min = t.intense_min;
            config.intense_max = t.intense_max;
            config.normal_min = t.normal_min;
            config.normal_max = t.normal_max;
        }
        config
    }

    /// Field equality ignoring id, used to dedup imported presets.
    pub fn same_settings(&self, other: &Preset) -> bool {
        let a = Preset {
            id: String::new(),
            ..self.clone()
        };
        let b = Preset {
            id: String::new(),
            ..other.clone()
        };
        a == b
    }
}

/// Random lowercase alphanumeric token, unique enough for a local preset list.
fn fresh_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("intense range is inverted: {min}s min over {max}s max")]
    IntenseRangeInverted { min: u32, max: u32 },
    #[error("normal range is inverted: {min}s min over {max}s max")]
    NormalRangeInverted { min: u32, max: u32 },
}

/// A preset with its timing mode resolved to concrete ranges. Derived, never
/// edited on its own; recompute from the preset whenever that changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub name: String,
    pub rounds: u32,
    pub round_duration: u32,
    pub rest_duration: u32,
    pub warmup_duration: u32,
    pub cooldown_duration: u32,
    pub timing_mode: TimingMode,
    pub intense_min: u32,
    pub intense_max: u32,
    pub normal_min: u32,
    pub normal_max: u32,
    pub progressive_intensity: bool,
    pub hide_next_switch: bool,
    pub hide_timer: bool,
    pub hide_timer_mode: HideTimerMode,
}

impl Config {
    /// Reject inverted ranges before a session starts. A uniform draw over
    /// an inverted range has no meaning, and silently swapping the ends
    /// would misreport what the user configured. Crafted share tokens are
    /// the usual source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intense_min > self.intense_max {
            return Err(ConfigError::IntenseRangeInverted {
                min: self.intense_min,
                max: self.intense_max,
            });
        }
        if self.normal_min > self.normal_max {
            return Err(ConfigError::NormalRangeInverted {
                min: self.normal_min,
                max: self.normal_max,
            });
        }
        Ok(())
    }

    /// Effective ranges for a round, with progressive-intensity scaling.
    ///
    /// Later rounds push intense periods longer and squeeze recovery, with
    /// floors so the normal range never collapses.
    pub fn round_timings(&self, round: u32) -> Timings {
        let base = Timings {
            intense_min: self.intense_min,
            intense_max: self.intense_max,
            normal_min: self.normal_min,
            normal_max: self.normal_max,
        };
        if !self.progressive_intensity {
            return base;
        }
        let factor = round.saturating_sub(1) as f64 * 0.12;
        Timings {
            intense_min: scale(base.intense_min, 1.0 + factor),
            intense_max: scale(base.intense_max, 1.0 + factor),
            normal_min: scale(base.normal_min, 1.0 - factor).max(5),
            normal_max: scale(base.normal_max, 1.0 - factor).max(8),
        }
    }
}

fn scale(value: u32, factor: f64) -> u32 {
    // negative products saturate to 0 and the caller's floor takes over
    (value as f64 * factor).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_config() -> Config {
        Preset {
            timing_mode: TimingMode::Custom,
            intense_min: 10,
            intense_max: 20,
            normal_min: 15,
            normal_max: 30,
            ..Preset::default()
        }
        .config()
    }

    #[test]
    fn test_default_preset_values() {
        let p = Preset::default();
        assert_eq!(p.rounds, 3);
        assert_eq!(p.round_duration, 180);
        assert_eq!(p.rest_duration, 60);
        assert_eq!(p.timing_mode, TimingMode::Balanced);
        assert_eq!((p.intense_min, p.intense_max), (15, 25));
        assert_eq!((p.normal_min, p.normal_max), (20, 35));
        assert!(!p.progressive_intensity);
        assert!(!p.hide_next_switch);
        assert!(!p.hide_timer);
        assert_eq!(p.hide_timer_mode, HideTimerMode::Blackout);
        assert_eq!(p.warmup_duration, 0);
        assert_eq!(p.cooldown_duration, 0);
        assert_eq!(p.id.len(), 10);
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = Preset::new("a");
        let b = Preset::new("b");
        assert_ne!(a.id, b.id);
        assert!(a.id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_set_rounds_clamps() {
        let mut p = Preset::default();
        p.set_rounds(0);
        assert_eq!(p.rounds, 1);
        p.set_rounds(200);
        assert_eq!(p.rounds, MAX_ROUNDS);
        p.set_rounds(12);
        assert_eq!(p.rounds, 12);
    }

    #[test]
    fn test_config_resolves_named_mode_ranges() {
        let p = Preset::default(); // balanced, 180s rounds
        let c = p.config();
        assert_eq!((c.intense_min, c.intense_max), (15, 27));
        assert_eq!((c.normal_min, c.normal_max), (21, 39));
    }

    #[test]
    fn test_config_keeps_custom_ranges() {
        let c = custom_config();
        assert_eq!((c.intense_min, c.intense_max), (10, 20));
        assert_eq!((c.normal_min, c.normal_max), (15, 30));
    }

    #[test]
    fn test_config_tracks_round_duration_changes() {
        let mut p = Preset::default();
        p.round_duration = 60;
        let c = p.config();
        // balanced avg = 10
        assert_eq!((c.intense_min, c.intense_max), (5, 9));
        assert_eq!((c.normal_min, c.normal_max), (7, 13));
    }

    #[test]
    fn test_round_timings_without_progressive_is_base() {
        let c = custom_config();
        for round in [1, 2, 5, 10] {
            let t = c.round_timings(round);
            assert_eq!((t.intense_min, t.intense_max), (10, 20));
            assert_eq!((t.normal_min, t.normal_max), (15, 30));
        }
    }

    #[test]
    fn test_round_timings_progressive_round_one_is_base() {
        let mut c = custom_config();
        c.progressive_intensity = true;
        let t = c.round_timings(1);
        assert_eq!((t.intense_min, t.intense_max), (10, 20));
        assert_eq!((t.normal_min, t.normal_max), (15, 30));
    }

    #[test]
    fn test_round_timings_progressive_scaling() {
        let mut c = Preset::default().config(); // 15-27 / 21-39
        c.progressive_intensity = true;
        let t = c.round_timings(3); // factor 0.24
        assert_eq!(t.intense_min, 19); // round(15 * 1.24)
        assert_eq!(t.intense_max, 33); // round(27 * 1.24)
        assert_eq!(t.normal_min, 16); // round(21 * 0.76)
        assert_eq!(t.normal_max, 30); // round(39 * 0.76)
    }

    #[test]
    fn test_round_timings_progressive_floors() {
        let mut c = custom_config();
        c.progressive_intensity = true;
        c.normal_min = 6;
        c.normal_max = 9;
        // factor > 1 drives the scaled values negative; floors take over
        for round in [10, 12, 20, 50] {
            let t = c.round_timings(round);
            assert!(t.normal_min >= 5, "round {round}");
            assert!(t.normal_max >= 8, "round {round}");
        }
        let t = c.round_timings(12);
        assert_eq!((t.normal_min, t.normal_max), (5, 8));
    }

    #[test]
    fn test_validate_accepts_ordered_ranges() {
        assert_eq!(custom_config().validate(), Ok(()));
        assert_eq!(Preset::default().config().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let mut c = custom_config();
        c.intense_min = 30;
        c.intense_max = 10;
        assert_eq!(
            c.validate(),
            Err(ConfigError::IntenseRangeInverted { min: 30, max: 10 })
        );

        let mut c = custom_config();
        c.normal_min = 40;
        c.normal_max = 2;
        let err = c.validate().unwrap_err();
        assert_eq!(err.to_string(), "normal range is inverted: 40s min over 2s max");
    }

    #[test]
    fn test_mode_switch_carries_derived_ranges_into_custom() {
        let mut p = Preset::default();
        p.set_round_duration(60);
        assert_eq!((p.intense_min, p.intense_max), (5, 9));
        assert_eq!((p.normal_min, p.normal_max), (7, 13));

        p.set_timing_mode(TimingMode::Custom);
        // custom edits start from the last derived values
        assert_eq!((p.intense_min, p.intense_max), (5, 9));

        p.set_round_duration(180);
        // custom mode never overwrites hand-set ranges
        assert_eq!((p.intense_min, p.intense_max), (5, 9));

        p.set_timing_mode(TimingMode::Balanced);
        assert_eq!((p.intense_min, p.intense_max), (15, 27));
    }

    #[test]
    fn test_same_settings_ignores_id() {
        let a = Preset::new("work");
        let mut b = a.clone();
        b.id = fresh_id();
        assert!(a.same_settings(&b));
        b.rounds = 5;
        assert!(!a.same_settings(&b));
    }

    #[test]
    fn test_serde_camel_case() {
        let p = Preset::default();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"roundDuration\":180"));
        assert!(json.contains("\"timingMode\":\"balanced\""));
        assert!(json.contains("\"hideTimerMode\":\"blackout\""));
        assert!(json.contains("\"progressiveIntensity\":false"));
        let back: Preset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_serde_missing_fields_take_defaults() {
        let json = r#"{"name":"Sparring","rounds":5,"roundDuration":120,"timingMode":"chaos"}"#;
        let p: Preset = serde_json::from_str(json).unwrap();
        assert_eq!(p.name, "Sparring");
        assert_eq!(p.rounds, 5);
        assert_eq!(p.round_duration, 120);
        assert_eq!(p.timing_mode, TimingMode::Chaos);
        assert_eq!(p.rest_duration, 60);
        assert!(!p.id.is_empty(), "missing id should be generated");
    }
}
