use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::{ui::render_history, App, AppState};

/// One full-screen view. Always renders; may claim a key before the
/// global bindings see it.
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
    /// Returns true if the key was consumed here.
    fn on_key(&mut self, _key: KeyEvent, _app: &mut App) -> bool {
        false
    }
}

/// Preset editing, rendered through the App widget
pub struct ConfigScreen;

impl Screen for ConfigScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// The running timer, rendered through the App widget
pub struct TrainingScreen;

impl Screen for TrainingScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Post-session totals, rendered through the App widget
pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Past sessions table, needs mutable access for scroll clamping
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Config => Box::new(ConfigScreen),
        AppState::Training => Box::new(TrainingScreen),
        AppState::Summary => Box::new(SummaryScreen),
        AppState::History => Box::new(HistoryScreen),
    }
}
