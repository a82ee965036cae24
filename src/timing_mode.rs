use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Min/max second ranges for the two exertion levels inside a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub intense_min: u32,
    pub intense_max: u32,
    pub normal_min: u32,
    pub normal_max: u32,
}

/// Difficulty curve selection. The three named modes derive their period
/// ranges from the round duration; `Custom` uses the preset's own ranges.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    ValueEnum,
    strum_macros::Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    Chaos,
    #[default]
    Balanced,
    Endurance,
    Custom,
}

impl TimingMode {
    /// Derived period ranges for a given round duration, `None` for `Custom`.
    ///
    /// Each mode divides the round into an average sub-period and scales it
    /// by fixed factors, with absolute floors so short rounds stay usable.
    /// These constants define the product's difficulty curves.
    pub fn timings(&self, round_duration: u32) -> Option<Timings> {
        match self {
            TimingMode::Chaos => {
                let avg = round_duration as f64 / 10.0;
                Some(Timings {
                    intense_min: at_least(3, avg * 0.4),
                    intense_max: at_least(5, avg * 0.9),
                    normal_min: at_least(4, avg * 0.6),
                    normal_max: at_least(7, avg * 1.4),
                })
            }
            TimingMode::Balanced => {
                let avg = round_duration as f64 / 6.0;
                Some(Timings {
                    intense_min: at_least(5, avg * 0.5),
                    intense_max: at_least(8, avg * 0.9),
                    normal_min: at_least(6, avg * 0.7),
                    normal_max: at_least(10, avg * 1.3),
                })
            }
            TimingMode::Endurance => {
                let avg = round_duration as f64 / 3.5;
                Some(Timings {
                    intense_min: at_least(8, avg * 0.5),
                    intense_max: at_least(12, avg * 0.9),
                    normal_min: at_least(10, avg * 0.7),
                    normal_max: at_least(15, avg * 1.3),
                })
            }
            TimingMode::Custom => None,
        }
    }

    pub fn all() -> [TimingMode; 4] {
        [
            TimingMode::Chaos,
            TimingMode::Balanced,
            TimingMode::Endurance,
            TimingMode::Custom,
        ]
    }

    /// Cycle through the modes in display order.
    pub fn next(&self) -> TimingMode {
        let all = Self::all();
        let idx = all.iter().position(|m| m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(&self) -> TimingMode {
        let all = Self::all();
        let idx = all.iter().position(|m| m == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }

    /// Token spelling, lowercase.
    pub fn id(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl FromStr for TimingMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chaos" => Ok(TimingMode::Chaos),
            "balanced" => Ok(TimingMode::Balanced),
            "endurance" => Ok(TimingMode::Endurance),
            "custom" => Ok(TimingMode::Custom),
            _ => Err(()),
        }
    }
}

fn at_least(floor: u32, value: f64) -> u32 {
    (value.round() as u32).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chaos_timings_three_minute_round() {
        let t = TimingMode::Chaos.timings(180).unwrap();
        // avg = 18
        assert_eq!(t.intense_min, 7);
        assert_eq!(t.intense_max, 16);
        assert_eq!(t.normal_min, 11);
        assert_eq!(t.normal_max, 25);
    }

    #[test]
    fn test_balanced_timings_three_minute_round() {
        let t = TimingMode::Balanced.timings(180).unwrap();
        // avg = 30
        assert_eq!(t.intense_min, 15);
        assert_eq!(t.intense_max, 27);
        assert_eq!(t.normal_min, 21);
        assert_eq!(t.normal_max, 39);
    }

    #[test]
    fn test_endurance_timings_three_minute_round() {
        let t = TimingMode::Endurance.timings(210).unwrap();
        // avg = 60
        assert_eq!(t.intense_min, 30);
        assert_eq!(t.intense_max, 54);
        assert_eq!(t.normal_min, 42);
        assert_eq!(t.normal_max, 78);
    }

    #[test]
    fn test_floors_dominate_short_rounds() {
        let t = TimingMode::Chaos.timings(10).unwrap();
        assert_eq!(t.intense_min, 3);
        assert_eq!(t.intense_max, 5);
        assert_eq!(t.normal_min, 4);
        assert_eq!(t.normal_max, 7);

        let t = TimingMode::Endurance.timings(0).unwrap();
        assert_eq!(t.intense_min, 8);
        assert_eq!(t.intense_max, 12);
        assert_eq!(t.normal_min, 10);
        assert_eq!(t.normal_max, 15);
    }

    #[test]
    fn test_custom_has_no_derived_timings() {
        assert_eq!(TimingMode::Custom.timings(180), None);
    }

    #[test]
    fn test_ranges_are_ordered() {
        for mode in [TimingMode::Chaos, TimingMode::Balanced, TimingMode::Endurance] {
            for rd in [10, 30, 60, 120, 180, 300, 600, 1800] {
                let t = mode.timings(rd).unwrap();
                assert!(t.intense_min <= t.intense_max, "{mode} rd={rd}");
                assert!(t.normal_min <= t.normal_max, "{mode} rd={rd}");
            }
        }
    }

    #[test]
    fn test_ranges_grow_with_round_duration() {
        // Past the floors, longer rounds never shrink any bound.
        for mode in [TimingMode::Chaos, TimingMode::Balanced, TimingMode::Endurance] {
            let mut prev = mode.timings(120).unwrap();
            for rd in (150..=1200).step_by(30) {
                let t = mode.timings(rd).unwrap();
                assert!(t.intense_min >= prev.intense_min, "{mode} rd={rd}");
                assert!(t.intense_max >= prev.intense_max, "{mode} rd={rd}");
                assert!(t.normal_min >= prev.normal_min, "{mode} rd={rd}");
                assert!(t.normal_max >= prev.normal_max, "{mode} rd={rd}");
                prev = t;
            }
        }
    }

    #[test]
    fn test_from_str_is_lowercase_only() {
        assert_eq!("chaos".parse(), Ok(TimingMode::Chaos));
        assert_eq!("balanced".parse(), Ok(TimingMode::Balanced));
        assert_eq!("endurance".parse(), Ok(TimingMode::Endurance));
        assert_eq!("custom".parse(), Ok(TimingMode::Custom));
        assert_eq!("Chaos".parse::<TimingMode>(), Err(()));
        assert_eq!("turbo".parse::<TimingMode>(), Err(()));
    }

    #[test]
    fn test_display_matches_variant_names() {
        assert_eq!(TimingMode::Chaos.to_string(), "Chaos");
        assert_eq!(TimingMode::Balanced.id(), "balanced");
        for mode in TimingMode::all() {
            assert_eq!(mode.id().parse(), Ok(mode));
        }
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(TimingMode::Custom.next(), TimingMode::Chaos);
        assert_eq!(TimingMode::Chaos.prev(), TimingMode::Custom);
        assert_eq!(TimingMode::Balanced.next(), TimingMode::Endurance);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TimingMode::Endurance).unwrap();
        assert_eq!(json, "\"endurance\"");
        let back: TimingMode = serde_json::from_str("\"chaos\"").unwrap();
        assert_eq!(back, TimingMode::Chaos);
    }
}
