pub mod screen;

use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::engine::{Intensity, Phase, TimerState};
use crate::preset::{Config, HideTimerMode, Preset};
use crate::time::format_clock;
use crate::timing_mode::TimingMode;
use crate::{App, AppState, ConfigField};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Top-level render dispatch for the event loop.
pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_screen(&app.screen).render(app, f);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            AppState::Config => render_config(self, area, buf),
            AppState::Training => render_training(self, area, buf),
            AppState::Summary => render_summary(self, area, buf),
            // rendered through a Frame, see render_history
            AppState::History => {}
        }
    }
}

fn render_config(app: &App, area: Rect, buf: &mut Buffer) {
    let accent = app.state.theme.accent(app.state.theme_mode);
    let accent_bold = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(area);

    let preset = app.state.active_preset();
    let position = app
        .state
        .presets
        .iter()
        .position(|p| p.id == preset.id)
        .unwrap_or(0);

    let name_line = match &app.editing {
        Some(buffer) => Line::from(vec![
            Span::styled("rename: ", dim_style),
            Span::styled(format!("{}▏", buffer), accent_bold),
        ]),
        None => Line::from(vec![
            Span::styled(
                fit_width(&preset.name, chunks[0].width.saturating_sub(8) as usize),
                accent_bold,
            ),
            Span::styled(
                format!("  {}/{}", position + 1, app.state.presets.len()),
                dim_style,
            ),
        ]),
    };
    Paragraph::new(vec![name_line, Line::from("")]).render(chunks[0], buf);

    let fields = app.fields();
    let selected = app.field.min(fields.len() - 1);
    let mut rows: Vec<Line> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let (label, value) = field_text(*field, preset);
            let marker = if i == selected { "› " } else { "  " };
            let style = if i == selected {
                accent_bold
            } else {
                Style::default()
            };
            Line::from(Span::styled(
                format!("{}{:<18}{}", marker, label, value),
                style,
            ))
        })
        .collect();
    if preset.timing_mode != TimingMode::Custom {
        // what the mode works out to for this round length
        let config = preset.config();
        rows.push(Line::from(""));
        rows.push(Line::from(Span::styled(
            format!(
                "  {:<18}intense {}-{}s, normal {}-{}s",
                "derived",
                config.intense_min, config.intense_max, config.normal_min, config.normal_max
            ),
            dim_style,
        )));
    }
    Paragraph::new(rows).render(chunks[1], buf);

    let mut footer = Vec::new();
    match &app.error {
        Some(error) => footer.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ))),
        None => footer.push(Line::from("")),
    }
    footer.push(Line::from(Span::styled(
        "(↑↓) field / (←→) adjust / (enter) start / (esc)ape",
        italic_style,
    )));
    footer.push(Line::from(Span::styled(
        "(tab) preset / (n)ew / (e) rename / (D)elete",
        italic_style,
    )));
    footer.push(Line::from(Span::styled(
        "(t)heme / (T) dark-light / (h)istory / (o) share",
        italic_style,
    )));
    Paragraph::new(footer).render(chunks[2], buf);
}

fn field_text(field: ConfigField, preset: &Preset) -> (&'static str, String) {
    match field {
        ConfigField::Rounds => ("rounds", preset.rounds.to_string()),
        ConfigField::RoundDuration => ("round", format_clock(preset.round_duration)),
        ConfigField::RestDuration => ("rest", format_clock(preset.rest_duration)),
        ConfigField::Warmup => ("warm-up", off_or_clock(preset.warmup_duration)),
        ConfigField::Cooldown => ("cool-down", off_or_clock(preset.cooldown_duration)),
        ConfigField::TimingMode => ("mode", preset.timing_mode.id()),
        ConfigField::IntenseMin => ("intense min", format!("{}s", preset.intense_min)),
        ConfigField::IntenseMax => ("intense max", format!("{}s", preset.intense_max)),
        ConfigField::NormalMin => ("normal min", format!("{}s", preset.normal_min)),
        ConfigField::NormalMax => ("normal max", format!("{}s", preset.normal_max)),
        ConfigField::Progressive => ("progressive", on_off(preset.progressive_intensity)),
        ConfigField::HideNextSwitch => ("hide next switch", on_off(preset.hide_next_switch)),
        ConfigField::HideTimer => ("hide clock", on_off(preset.hide_timer)),
        ConfigField::TimerMask => (
            "mask style",
            match preset.hide_timer_mode {
                HideTimerMode::Glitch => "glitch".to_string(),
                HideTimerMode::Blackout => "blackout".to_string(),
            },
        ),
    }
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

fn off_or_clock(secs: u32) -> String {
    if secs == 0 {
        "off".to_string()
    } else {
        format_clock(secs)
    }
}

fn render_training(app: &App, area: Rect, buf: &mut Buffer) {
    let (timer, config) = match (&app.timer, &app.config) {
        (Some(timer), Some(config)) => (timer, config),
        _ => return,
    };

    let accent = app.state.theme.accent(app.state.theme_mode);
    let accent_bold = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    // the stopped clock after the final bell is an ended session, not a pause
    let ended = app.summary_at.is_some();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(8) / 2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let phase_line = match timer.phase {
        Phase::Warmup => Line::from(Span::styled("WARM-UP", accent_bold)),
        Phase::Cooldown => Line::from(Span::styled("COOL-DOWN", accent_bold)),
        Phase::Training => {
            let round = Span::styled(
                format!("ROUND {}/{}", timer.current_round, config.rounds),
                accent_bold,
            );
            let segment = if timer.is_resting {
                Span::styled("  REST", dim_style)
            } else if timer.intensity == Intensity::Intense {
                Span::styled(
                    "  INTENSE",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled("  NORMAL", Style::default().add_modifier(Modifier::BOLD))
            };
            Line::from(vec![round, segment])
        }
    };
    Paragraph::new(phase_line)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Line::from(Span::styled(
        clock_display(timer, config),
        accent_bold,
    )))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if timer.phase == Phase::Training && !timer.is_resting && !app.hide_switch_live && !ended {
        let eta = timer.time_remaining.saturating_sub(timer.switch_target);
        Paragraph::new(Line::from(Span::styled(
            format!("SWITCH IN ~{}s", eta),
            dim_style,
        )))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    if !timer.is_running && !ended {
        Paragraph::new(Line::from(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    Paragraph::new(Line::from(Span::styled(
        "(space) pause / (n)ext switch / (s)top / (q)uit",
        italic_style,
    )))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);
}

/// The clock is disguised only during active work. Rest, warm-up and
/// cool-down always show real numbers.
fn clock_display(timer: &TimerState, config: &Config) -> String {
    let clock = format_clock(timer.time_remaining);
    if config.hide_timer && timer.phase == Phase::Training && !timer.is_resting {
        masked_clock(&clock, config.hide_timer_mode)
    } else {
        clock
    }
}

/// Disguise the digits of a clock string while keeping its shape. Glitch
/// redraws random digits every frame, blackout holds solid blocks.
fn masked_clock(clock: &str, mode: HideTimerMode) -> String {
    let mut rng = rand::thread_rng();
    clock
        .chars()
        .map(|c| {
            if !c.is_ascii_digit() {
                c
            } else {
                match mode {
                    HideTimerMode::Blackout => '█',
                    HideTimerMode::Glitch => {
                        char::from_digit(rng.gen_range(0..10u32), 10).unwrap_or('0')
                    }
                }
            }
        })
        .collect()
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let summary = match &app.summary {
        Some(summary) => summary,
        None => return,
    };

    let accent = app.state.theme.accent(app.state.theme_mode);
    let accent_bold = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(11) / 2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Line::from(Span::styled("SESSION COMPLETE", accent_bold)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Line::from(Span::styled(
        format!("{}  ({} rounds)", summary.preset_name, summary.rounds),
        dim_style,
    )))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Line::from(format!(
        "active   {}",
        format_clock(summary.total_active())
    )))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Line::from(Span::styled(
        format!(
            "intense  {}  {}%",
            format_clock(summary.total_intense),
            summary.intense_percent()
        ),
        Style::default().fg(Color::Red),
    )))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Line::from(format!(
        "normal   {}  {}%",
        format_clock(summary.total_normal),
        summary.normal_percent()
    )))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    Paragraph::new(vec![Line::from(""), ratio_bar(summary.intense_percent())])
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    Paragraph::new(Line::from(Span::styled(
        "(r)estart / (h)istory / (o) share / (esc) back / (q)uit",
        italic_style,
    )))
    .alignment(Alignment::Center)
    .render(chunks[8], buf);
}

/// A 30-cell intense/normal split bar, intense share on the left.
fn ratio_bar(intense_percent: u32) -> Line<'static> {
    const WIDTH: usize = 30;
    let filled = ((intense_percent as usize * WIDTH + 50) / 100).min(WIDTH);
    Line::from(vec![
        Span::styled("█".repeat(filled), Style::default().fg(Color::Red)),
        Span::styled(
            "░".repeat(WIDTH - filled),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ])
}

pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let accent = app.state.theme.accent(app.state.theme_mode);

    let title = Paragraph::new("Finished sessions, newest first")
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.history_rows.is_empty() {
        let no_data =
            Paragraph::new("No sessions yet.\nFinish a timer run and it will show up here.")
                .block(Block::default().borders(Borders::ALL).title("No Data"))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[1]);
    } else {
        // account for borders and the header row
        let table_height = chunks[1].height.saturating_sub(3) as usize;
        let total_rows = app.history_rows.len();
        let max_scroll = total_rows.saturating_sub(table_height);
        if app.history_scroll > max_scroll {
            app.history_scroll = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("When"),
            Cell::from("Preset"),
            Cell::from("Rounds"),
            Cell::from("Intense"),
            Cell::from("Normal"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = app
            .history_rows
            .iter()
            .skip(app.history_scroll)
            .take(table_height)
            .map(|(record, age)| {
                Row::new(vec![
                    Cell::from(age.clone()),
                    Cell::from(fit_width(&record.preset_name, 23)),
                    Cell::from(record.rounds.to_string()),
                    Cell::from(format_clock(record.total_intense_secs))
                        .style(Style::default().fg(Color::Red)),
                    Cell::from(format_clock(record.total_normal_secs)),
                ])
            })
            .collect();

        let scroll_info = if total_rows > table_height {
            format!(
                " ({}/{} rows)",
                app.history_scroll + visible_rows.len().min(table_height),
                total_rows
            )
        } else {
            String::new()
        };

        let table = Table::new(
            visible_rows,
            &[
                Constraint::Length(16),
                Constraint::Length(24),
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Length(9),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Sessions{}", scroll_info)),
        );

        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("↑/↓ scroll | (b)ack (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}

/// Truncate to a display width, ellipsis included. Width aware so wide
/// glyphs in preset names do not push columns around.
fn fit_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    let budget = max_width.saturating_sub(1);
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
