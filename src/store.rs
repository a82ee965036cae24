use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::preset::Preset;
use crate::share::DecodedState;
use crate::theme::{Theme, ThemeMode};

/// Everything that survives between runs: the preset list, which one is
/// selected, and the theme.
///
/// Invariant: `presets` is never empty. [`PresetStore::load`] and the editing
/// operations below maintain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredState {
    pub presets: Vec<Preset>,
    pub active_preset_id: String,
    pub theme: Theme,
    pub theme_mode: ThemeMode,
}

impl Default for StoredState {
    fn default() -> Self {
        let preset = Preset::default();
        Self {
            active_preset_id: preset.id.clone(),
            presets: vec![preset],
            theme: Theme::default(),
            theme_mode: ThemeMode::default(),
        }
    }
}

impl StoredState {
    /// Repair whatever came off disk: an empty list gets the default preset,
    /// a dangling active id falls back to the first entry.
    fn normalized(mut self) -> Self {
        if self.presets.is_empty() {
            let preset = Preset::default();
            self.active_preset_id = preset.id.clone();
            self.presets.push(preset);
        } else if !self.presets.iter().any(|p| p.id == self.active_preset_id) {
            self.active_preset_id = self.presets[0].id.clone();
        }
        self
    }

    pub fn active_preset(&self) -> &Preset {
        self.presets
            .iter()
            .find(|p| p.id == self.active_preset_id)
            .unwrap_or(&self.presets[0])
    }

    pub fn active_preset_mut(&mut self) -> &mut Preset {
        let idx = self
            .presets
            .iter()
            .position(|p| p.id == self.active_preset_id)
            .unwrap_or(0);
        &mut self.presets[idx]
    }

    pub fn select(&mut self, id: &str) {
        if self.presets.iter().any(|p| p.id == id) {
            self.active_preset_id = id.to_string();
        }
    }

    /// Case-insensitive name lookup, for selection from the command line.
    /// Returns whether a preset matched.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        let id = self
            .presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id.clone());
        match id {
            Some(id) => {
                self.active_preset_id = id;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        let idx = self
            .presets
            .iter()
            .position(|p| p.id == self.active_preset_id)
            .unwrap_or(0);
        self.active_preset_id = self.presets[(idx + 1) % self.presets.len()].id.clone();
    }

    pub fn select_prev(&mut self) {
        let idx = self
            .presets
            .iter()
            .position(|p| p.id == self.active_preset_id)
            .unwrap_or(0);
        let len = self.presets.len();
        self.active_preset_id = self.presets[(idx + len - 1) % len].id.clone();
    }

    /// Append a fresh preset and select it.
    pub fn add_preset(&mut self) {
        let preset = Preset::new(format!("Preset {}", self.presets.len() + 1));
        self.active_preset_id = preset.id.clone();
        self.presets.push(preset);
    }

    /// Remove a preset, keeping at least one. Deleting the selected preset
    /// moves the selection to the first remaining entry.
    pub fn delete_preset(&mut self, id: &str) {
        if self.presets.len() <= 1 {
            return;
        }
        self.presets.retain(|p| p.id != id);
        if self.active_preset_id == id {
            self.active_preset_id = self.presets[0].id.clone();
        }
    }

    pub fn rename_active(&mut self, name: String) {
        self.active_preset_mut().name = name;
    }

    /// Fold a decoded share token into this state. Presets whose settings
    /// already exist are not duplicated; the token's active selection maps
    /// onto whichever copy survives. Returns how many presets were added.
    pub fn merge_import(&mut self, decoded: DecodedState) -> usize {
        let mut added = 0;
        for preset in decoded.presets {
            let was_active = preset.id == decoded.active_preset_id;
            let id = match self.presets.iter().find(|p| p.same_settings(&preset)) {
                Some(existing) => existing.id.clone(),
                None => {
                    let id = preset.id.clone();
                    self.presets.push(preset);
                    added += 1;
                    id
                }
            };
            if was_active {
                self.active_preset_id = id;
            }
        }
        if let Some((theme, mode)) = decoded.theme {
            self.theme = theme;
            self.theme_mode = mode;
        }
        added
    }
}

pub trait PresetStore {
    fn load(&self) -> StoredState;
    fn save(&self, state: &StoredState) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FilePresetStore {
    path: PathBuf,
}

impl FilePresetStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::presets_path()
            .unwrap_or_else(|| PathBuf::from("cornerbell_presets.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FilePresetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetStore for FilePresetStore {
    fn load(&self) -> StoredState {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(state) = serde_json::from_slice::<StoredState>(&bytes) {
                return state.normalized();
            }
        }
        StoredState::default()
    }

    fn save(&self, state: &StoredState) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(state).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
