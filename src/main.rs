pub mod app_dirs;
pub mod engine;
pub mod history;
pub mod preset;
pub mod runtime;
pub mod share;
pub mod store;
pub mod theme;
pub mod time;
pub mod timing_mode;
pub mod ui;

use crate::engine::{Cue, TimerState};
use crate::history::{HistoryDb, SessionRecord};
use crate::preset::Config;
use crate::runtime::{CueSink, Event, EventPump, NullCueSink, TerminalBell};
use crate::store::{FilePresetStore, PresetStore, StoredState};
use crate::timing_mode::TimingMode;
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 250;
const SUMMARY_DELAY_MS: u64 = 500;
const DURATION_STEP: u32 = 15;
const MAX_DURATION_SECS: u32 = 3600;
const MAX_PERIOD_SECS: u32 = 600;
const HISTORY_LIMIT: u32 = 50;

/// terminal round timer for fight-sport conditioning
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal interval timer for combat-sports conditioning. Rounds alternate randomized intense and normal work periods, with rest in between and optional warm-up and cool-down phases. Presets are shareable as compact tokens and finished sessions land in a local history."
)]
pub struct Cli {
    /// pick the saved preset with this name for the run
    #[clap(short = 'p', long, value_name = "NAME")]
    preset: Option<String>,

    /// number of rounds for this run
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// round length, e.g. "3:00", "90s" or plain minutes
    #[clap(short = 'd', long)]
    round_duration: Option<String>,

    /// rest length between rounds
    #[clap(long)]
    rest_duration: Option<String>,

    /// warm-up length before round one
    #[clap(short = 'w', long)]
    warmup: Option<String>,

    /// cool-down length after the final round
    #[clap(short = 'c', long)]
    cooldown: Option<String>,

    /// difficulty curve for the work periods
    #[clap(short = 'm', long, value_enum)]
    timing_mode: Option<TimingMode>,

    /// force progressive intensity for this run
    #[clap(long)]
    progressive: bool,

    /// merge presets from a share token or URL into the saved set, then exit
    #[clap(long, value_name = "TOKEN")]
    import: Option<String>,

    /// print the share link for the saved presets, then exit
    #[clap(long)]
    export: bool,

    /// start the timer immediately with the active preset
    #[clap(long)]
    start: bool,

    /// silence the terminal bell
    #[clap(long)]
    mute: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Config,
    Training,
    Summary,
    History,
}

/// Rows of the configuration screen, in display order. The custom range
/// rows only exist while the active preset is in custom mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Rounds,
    RoundDuration,
    RestDuration,
    Warmup,
    Cooldown,
    TimingMode,
    IntenseMin,
    IntenseMax,
    NormalMin,
    NormalMax,
    Progressive,
    HideNextSwitch,
    HideTimer,
    TimerMask,
}

/// What the summary screen shows once a session has run to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub preset_name: String,
    pub rounds: u32,
    pub total_intense: u32,
    pub total_normal: u32,
}

impl SessionSummary {
    pub fn total_active(&self) -> u32 {
        self.total_intense + self.total_normal
    }

    pub fn intense_percent(&self) -> u32 {
        let total = self.total_active();
        if total == 0 {
            0
        } else {
            ((self.total_intense as f64 / total as f64) * 100.0).round() as u32
        }
    }

    pub fn normal_percent(&self) -> u32 {
        if self.total_active() == 0 {
            0
        } else {
            100 - self.intense_percent()
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub state: StoredState,
    pub screen: AppState,
    /// Cursor into [`App::fields`].
    pub field: usize,
    pub timer: Option<TimerState>,
    /// Config snapshot the running session was started with. Preset edits
    /// made afterwards only affect the next session.
    pub config: Option<Config>,
    pub summary: Option<SessionSummary>,
    pub history_rows: Vec<(SessionRecord, String)>,
    pub history_scroll: usize,
    /// Rename buffer; `Some` while the name is being edited.
    pub editing: Option<String>,
    pub error: Option<String>,
    /// Live visibility of the next-switch countdown, seeded from the preset
    /// at session start.
    pub hide_switch_live: bool,
    pub dirty: bool,
    pub history_db: Option<HistoryDb>,
    pub csv_path: Option<PathBuf>,
    /// Wall-clock deadline of the next engine tick while running.
    pub next_tick_at: Option<Instant>,
    /// Deadline for the jump to the summary screen after the final bell.
    /// [`App::stop_session`] cancels it.
    pub summary_at: Option<Instant>,
}

impl App {
    pub fn new(state: StoredState) -> Self {
        Self {
            state,
            screen: AppState::Config,
            field: 0,
            timer: None,
            config: None,
            summary: None,
            history_rows: Vec::new(),
            history_scroll: 0,
            editing: None,
            error: None,
            hide_switch_live: false,
            dirty: false,
            history_db: None,
            csv_path: None,
            next_tick_at: None,
            summary_at: None,
        }
    }

    pub fn fields(&self) -> Vec<ConfigField> {
        let mut fields = vec![
            ConfigField::Rounds,
            ConfigField::RoundDuration,
            ConfigField::RestDuration,
            ConfigField::Warmup,
            ConfigField::Cooldown,
            ConfigField::TimingMode,
        ];
        if self.state.active_preset().timing_mode == TimingMode::Custom {
            fields.extend([
                ConfigField::IntenseMin,
                ConfigField::IntenseMax,
                ConfigField::NormalMin,
                ConfigField::NormalMax,
            ]);
        }
        fields.extend([
            ConfigField::Progressive,
            ConfigField::HideNextSwitch,
            ConfigField::HideTimer,
            ConfigField::TimerMask,
        ]);
        fields
    }

    pub fn selected_field(&self) -> ConfigField {
        let fields = self.fields();
        fields[self.field.min(fields.len() - 1)]
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let len = self.fields().len() as i32;
        let current = (self.field as i32).min(len - 1);
        self.field = (current + delta).rem_euclid(len) as usize;
    }

    /// Nudge the selected field. Interactive edits can never produce an
    /// inverted range; only imported tokens can do that.
    pub fn adjust(&mut self, dir: i32) {
        let field = self.selected_field();
        let preset = self.state.active_preset_mut();
        match field {
            ConfigField::Rounds => {
                let rounds = if dir > 0 {
                    preset.rounds + 1
                } else {
                    preset.rounds.saturating_sub(1)
                };
                preset.set_rounds(rounds);
            }
            ConfigField::RoundDuration => {
                let secs = step_duration(preset.round_duration, dir).max(DURATION_STEP);
                preset.set_round_duration(secs);
            }
            ConfigField::RestDuration => {
                preset.rest_duration = step_duration(preset.rest_duration, dir);
            }
            ConfigField::Warmup => {
                preset.warmup_duration = step_duration(preset.warmup_duration, dir);
            }
            ConfigField::Cooldown => {
                preset.cooldown_duration = step_duration(preset.cooldown_duration, dir);
            }
            ConfigField::TimingMode => {
                let mode = if dir > 0 {
                    preset.timing_mode.next()
                } else {
                    preset.timing_mode.prev()
                };
                preset.set_timing_mode(mode);
            }
            ConfigField::IntenseMin => {
                preset.intense_min = if dir > 0 {
                    (preset.intense_min + 1).min(preset.intense_max)
                } else {
                    preset.intense_min.saturating_sub(1).max(1)
                };
            }
            ConfigField::IntenseMax => {
                preset.intense_max = if dir > 0 {
                    (preset.intense_max + 1).min(MAX_PERIOD_SECS)
                } else {
                    preset.intense_max.saturating_sub(1).max(preset.intense_min)
                };
            }
            ConfigField::NormalMin => {
                preset.normal_min = if dir > 0 {
                    (preset.normal_min + 1).min(preset.normal_max)
                } else {
                    preset.normal_min.saturating_sub(1).max(1)
                };
            }
            ConfigField::NormalMax => {
                preset.normal_max = if dir > 0 {
                    (preset.normal_max + 1).min(MAX_PERIOD_SECS)
                } else {
                    preset.normal_max.saturating_sub(1).max(preset.normal_min)
                };
            }
            ConfigField::Progressive => {
                preset.progressive_intensity = !preset.progressive_intensity;
            }
            ConfigField::HideNextSwitch => {
                preset.hide_next_switch = !preset.hide_next_switch;
            }
            ConfigField::HideTimer => {
                preset.hide_timer = !preset.hide_timer;
            }
            ConfigField::TimerMask => {
                preset.hide_timer_mode = preset.hide_timer_mode.toggle();
            }
        }
        self.dirty = true;
        self.error = None;
    }

    /// Resolve the active preset and start the clock. On a validation error
    /// the session does not start and the error shows on the config screen.
    pub fn start_session(&mut self) -> Vec<Cue> {
        let config = self.state.active_preset().config();
        if let Err(err) = config.validate() {
            self.error = Some(err.to_string());
            self.screen = AppState::Config;
            return Vec::new();
        }
        self.error = None;
        let (timer, cues) = engine::start(&config, &mut rand::thread_rng());
        self.hide_switch_live = config.hide_next_switch;
        self.timer = Some(timer);
        self.config = Some(config);
        self.summary = None;
        self.summary_at = None;
        self.screen = AppState::Training;
        self.next_tick_at = Some(Instant::now() + Duration::from_secs(1));
        cues
    }

    /// Run every engine tick that has come due. Ticks are anchored to the
    /// session start rather than to event-loop wakeups, so a stalled
    /// terminal catches up instead of drifting.
    pub fn tick_timer(&mut self) -> Vec<Cue> {
        let mut cues = Vec::new();
        if self.screen != AppState::Training {
            return cues;
        }
        if !self.timer.as_ref().map_or(false, |t| t.is_running) {
            return cues;
        }
        loop {
            let due = match self.next_tick_at {
                Some(due) if Instant::now() >= due => due,
                _ => break,
            };
            cues.extend(self.advance_timer());
            if self.next_tick_at.is_some() {
                self.next_tick_at = Some(due + Duration::from_secs(1));
            }
        }
        cues
    }

    /// One engine tick, wall clock aside.
    pub fn advance_timer(&mut self) -> Vec<Cue> {
        let result = match (&self.timer, &self.config) {
            (Some(timer), Some(config)) => engine::tick(timer, config, &mut rand::thread_rng()),
            _ => return Vec::new(),
        };
        self.timer = Some(result.next);
        if result.completed {
            self.finish_session();
        }
        result.cues
    }

    pub fn toggle_pause(&mut self) {
        if self.summary_at.is_some() {
            return;
        }
        if let Some(timer) = &self.timer {
            let next = engine::toggle_pause(timer);
            if next.is_running {
                // fresh anchor so the paused stretch is not "caught up"
                self.next_tick_at = Some(Instant::now() + Duration::from_secs(1));
            }
            self.timer = Some(next);
        }
    }

    /// Abandon the session, along with any pending summary jump. An
    /// unfinished run is not recorded.
    pub fn stop_session(&mut self) {
        self.timer = None;
        self.config = None;
        self.next_tick_at = None;
        self.summary_at = None;
        self.screen = AppState::Config;
    }

    /// The final bell has rung. Record the session, then hold the last clock
    /// frame briefly before the summary screen takes over.
    fn finish_session(&mut self) {
        let (timer, config) = match (&self.timer, &self.config) {
            (Some(timer), Some(config)) => (timer, config),
            _ => return,
        };
        let summary = SessionSummary {
            preset_name: config.name.clone(),
            rounds: config.rounds,
            total_intense: timer.total_intense_time,
            total_normal: timer.total_normal_time,
        };
        let record = SessionRecord {
            finished_at: Local::now(),
            preset_name: summary.preset_name.clone(),
            rounds: summary.rounds,
            total_intense_secs: summary.total_intense,
            total_normal_secs: summary.total_normal,
        };
        if let Some(db) = &self.history_db {
            let _ = db.record_session(&record);
        }
        if let Some(path) = &self.csv_path {
            let _ = history::append_csv_log(path, &record);
        }
        self.summary = Some(summary);
        self.next_tick_at = None;
        self.summary_at = Some(Instant::now() + Duration::from_millis(SUMMARY_DELAY_MS));
    }

    /// Navigate once the post-bell hold has expired. Returns whether the
    /// screen changed.
    pub fn poll_summary(&mut self) -> bool {
        match self.summary_at {
            Some(due) if Instant::now() >= due => {
                self.summary_at = None;
                self.timer = None;
                self.config = None;
                self.screen = AppState::Summary;
                true
            }
            _ => false,
        }
    }

    pub fn open_history(&mut self) {
        let now = Local::now();
        self.history_rows = match &self.history_db {
            Some(db) => db
                .recent_sessions(HISTORY_LIMIT)
                .unwrap_or_default()
                .into_iter()
                .map(|record| {
                    let age = record.age_label(now);
                    (record, age)
                })
                .collect(),
            None => Vec::new(),
        };
        self.history_scroll = 0;
        self.screen = AppState::History;
    }

    fn open_share_link(&self) {
        if Browser::is_available() {
            let token = share::full_token(
                &self.state.presets,
                &self.state.active_preset_id,
                self.state.theme,
                self.state.theme_mode,
            );
            webbrowser::open(&share::share_url(&token)).unwrap_or_default();
        }
    }
}

fn step_duration(current: u32, dir: i32) -> u32 {
    if dir > 0 {
        (current + DURATION_STEP).min(MAX_DURATION_SECS)
    } else {
        current.saturating_sub(DURATION_STEP)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let store = FilePresetStore::new();

    if let Some(input) = &cli.import {
        if let Err(msg) = run_import(&store, input) {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, msg).exit();
        }
        return Ok(());
    }

    if cli.export {
        run_export(&store);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut state = store.load();
    if let Err(msg) = apply_overrides(&cli, &mut state) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, msg).exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(state);
    app.history_db = HistoryDb::new().ok();
    app.csv_path = Some(history::csv_log_path());

    let mut startup_cues = Vec::new();
    if cli.start {
        startup_cues = app.start_session();
    }

    let result = run_app(&mut terminal, &mut app, &store, cli.mute, startup_cues);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Decode a share token (or a URL carrying one) and fold it into the saved
/// presets.
fn run_import(store: &FilePresetStore, input: &str) -> Result<(), String> {
    let token = share::token_from_input(input.trim());
    let decoded =
        share::decode_state(token).ok_or_else(|| "unrecognized share token".to_string())?;
    let mut state = store.load();
    let added = state.merge_import(decoded);
    store.save(&state).map_err(|e| e.to_string())?;
    if added == 1 {
        println!("imported 1 preset");
    } else {
        println!("imported {} presets", added);
    }
    Ok(())
}

fn run_export(store: &FilePresetStore) {
    let state = store.load();
    let token = share::full_token(
        &state.presets,
        &state.active_preset_id,
        state.theme,
        state.theme_mode,
    );
    println!("{}", share::share_url(&token));
}

/// One-shot session flags rewrite the active preset in memory; they persist
/// only if the user then edits and saves.
fn apply_overrides(cli: &Cli, state: &mut StoredState) -> Result<(), String> {
    if let Some(name) = &cli.preset {
        if !state.select_by_name(name) {
            return Err(format!("no preset named '{}'", name));
        }
    }
    let preset = state.active_preset_mut();
    if let Some(rounds) = cli.rounds {
        preset.set_rounds(rounds);
    }
    if let Some(text) = &cli.round_duration {
        let secs = time::parse_duration(text);
        if secs == 0 {
            return Err(format!("invalid round duration '{}'", text));
        }
        preset.set_round_duration(secs);
    }
    if let Some(text) = &cli.rest_duration {
        preset.rest_duration = time::parse_duration(text);
    }
    if let Some(text) = &cli.warmup {
        preset.warmup_duration = time::parse_duration(text);
    }
    if let Some(text) = &cli.cooldown {
        preset.cooldown_duration = time::parse_duration(text);
    }
    if let Some(mode) = cli.timing_mode {
        preset.set_timing_mode(mode);
    }
    if cli.progressive {
        preset.progressive_intensity = true;
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &FilePresetStore,
    mute: bool,
    startup_cues: Vec<Cue>,
) -> Result<(), Box<dyn Error>> {
    let pump = EventPump::start(Duration::from_millis(TICK_RATE_MS));
    let mut sink: Box<dyn CueSink> = if mute {
        Box::new(NullCueSink::default())
    } else {
        Box::new(TerminalBell)
    };

    for cue in &startup_cues {
        sink.play(*cue);
    }
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match pump.next() {
            Event::Pulse => {
                let cues = app.tick_timer();
                for cue in &cues {
                    sink.play(*cue);
                }
                let navigated = app.poll_summary();
                if navigated || app.screen == AppState::Training || !cues.is_empty() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            Event::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            Event::Key(key) => {
                let flow = handle_key(app, key, sink.as_mut());
                if app.dirty {
                    let _ = store.save(&app.state);
                    app.dirty = false;
                }
                if flow == Flow::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, sink: &mut dyn CueSink) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    if app.editing.is_some() {
        handle_rename_key(app, key);
        return Flow::Continue;
    }

    match app.screen {
        AppState::Config => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Up => app.move_cursor(-1),
            KeyCode::Down => app.move_cursor(1),
            KeyCode::Left => app.adjust(-1),
            KeyCode::Right => app.adjust(1),
            KeyCode::Enter | KeyCode::Char('s') => {
                for cue in app.start_session() {
                    sink.play(cue);
                }
            }
            KeyCode::Tab => {
                app.state.select_next();
                app.dirty = true;
            }
            KeyCode::BackTab => {
                app.state.select_prev();
                app.dirty = true;
            }
            KeyCode::Char('n') => {
                app.state.add_preset();
                app.field = 0;
                app.dirty = true;
            }
            KeyCode::Char('D') => {
                let id = app.state.active_preset_id.clone();
                app.state.delete_preset(&id);
                app.dirty = true;
            }
            KeyCode::Char('e') => {
                app.editing = Some(app.state.active_preset().name.clone());
            }
            KeyCode::Char('t') => {
                app.state.theme = app.state.theme.next();
                app.dirty = true;
            }
            KeyCode::Char('T') => {
                app.state.theme_mode = app.state.theme_mode.toggle();
                app.dirty = true;
            }
            KeyCode::Char('h') => app.open_history(),
            KeyCode::Char('o') => app.open_share_link(),
            _ => {}
        },
        AppState::Training => match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => app.toggle_pause(),
            KeyCode::Char('n') => app.hide_switch_live = !app.hide_switch_live,
            KeyCode::Esc | KeyCode::Char('s') => app.stop_session(),
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        },
        AppState::Summary => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.screen = AppState::Config,
            KeyCode::Char('r') => {
                for cue in app.start_session() {
                    sink.play(cue);
                }
            }
            KeyCode::Char('h') => app.open_history(),
            KeyCode::Char('o') => app.open_share_link(),
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('b') => {
                app.screen = AppState::Config;
            }
            KeyCode::Up => app.history_scroll = app.history_scroll.saturating_sub(1),
            // clamped against the row count in the render pass
            KeyCode::Down => app.history_scroll += 1,
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        },
    }

    Flow::Continue
}

fn handle_rename_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            if let Some(name) = app.editing.take() {
                let name = name.trim().to_string();
                if !name.is_empty() {
                    app.state.rename_active(name);
                    app.dirty = true;
                }
            }
        }
        KeyCode::Esc => {
            app.editing = None;
        }
        KeyCode::Backspace => {
            if let Some(buffer) = &mut app.editing {
                buffer.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buffer) = &mut app.editing {
                buffer.push(c);
            }
        }
        _ => {}
    }
}
