use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Accent palette identifiers. Share tokens carry these in the
/// `@{theme}.{mode}` suffix, so the names are part of the wire format.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, strum_macros::Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Gold,
    Indigo,
    Rose,
    Mono,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, strum_macros::Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn accent(&self, mode: ThemeMode) -> Color {
        match (self, mode) {
            (Theme::Gold, ThemeMode::Dark) => Color::Rgb(0xe2, 0xb7, 0x14),
            (Theme::Gold, ThemeMode::Light) => Color::Rgb(0x9e, 0x7c, 0x0a),
            (Theme::Indigo, ThemeMode::Dark) => Color::Rgb(0x7a, 0xa2, 0xf7),
            (Theme::Indigo, ThemeMode::Light) => Color::Rgb(0x25, 0x63, 0xeb),
            (Theme::Rose, ThemeMode::Dark) => Color::Rgb(0xf4, 0xa0, 0xb0),
            (Theme::Rose, ThemeMode::Light) => Color::Rgb(0xc4, 0x60, 0x70),
            (Theme::Mono, ThemeMode::Dark) => Color::White,
            (Theme::Mono, ThemeMode::Light) => Color::Rgb(0x44, 0x44, 0x44),
        }
    }

    pub fn all() -> [Theme; 4] {
        [Theme::Gold, Theme::Indigo, Theme::Rose, Theme::Mono]
    }

    pub fn next(&self) -> Theme {
        let all = Self::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    /// Token spelling, lowercase.
    pub fn id(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl ThemeMode {
    pub fn toggle(&self) -> ThemeMode {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn id(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gold" => Ok(Theme::Gold),
            "indigo" => Ok(Theme::Indigo),
            "rose" => Ok(Theme::Rose),
            "mono" => Ok(Theme::Mono),
            _ => Err(()),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            _ => Err(()),
        }
    }
}
