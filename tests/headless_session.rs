use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cornerbell::engine::{self, Cue, Phase};
use cornerbell::preset::Preset;
use cornerbell::runtime::{strikes, CueSink, Event, EventPump, NullCueSink};
use cornerbell::timing_mode::TimingMode;

// Drives the engine off a scripted pump, no TTY involved. Every pulse is
// treated as a due second, which fast-forwards the session.
#[test]
fn headless_session_runs_to_completion() {
    let mut preset = Preset::default();
    preset.rounds = 2;
    preset.round_duration = 5;
    preset.rest_duration = 2;
    preset.timing_mode = TimingMode::Custom;
    preset.intense_min = 2;
    preset.intense_max = 2;
    preset.normal_min = 2;
    preset.normal_max = 2;
    let config = preset.config();

    let (_tx, rx) = mpsc::channel();
    let pump = EventPump::scripted(rx, Duration::from_millis(2));

    let mut rng = StdRng::seed_from_u64(21);
    let (mut state, start_cues) = engine::start(&config, &mut rng);
    let mut sink = NullCueSink::default();
    for cue in start_cues {
        sink.play(cue);
    }

    let mut completed = false;
    for _ in 0..200u32 {
        match pump.next() {
            Event::Pulse => {
                let result = engine::tick(&state, &config, &mut rng);
                for cue in &result.cues {
                    sink.play(*cue);
                }
                state = result.next;
                if result.completed {
                    completed = true;
                    break;
                }
            }
            Event::Resize => {}
            Event::Key(_) => {}
        }
    }

    assert!(completed, "session should have completed");
    assert_eq!(state.time_remaining, 0);
    assert!(!state.is_running);
    assert_eq!(sink.played.first(), Some(&Cue::RoundStart));
    assert_eq!(sink.played.last(), Some(&Cue::FinalEnd));
    assert_eq!(
        sink.played.iter().filter(|c| **c == Cue::RoundEnd).count(),
        2
    );
}

// A buffered pause key must be delivered before any pulse fires, so the
// clock stays untouched while paused.
#[test]
fn headless_pause_key_freezes_the_clock() {
    let preset = Preset::default();
    let config = preset.config();

    let (tx, rx) = mpsc::channel();
    let pump = EventPump::scripted(rx, Duration::from_millis(2));

    tx.send(Event::Key(KeyEvent::new(
        KeyCode::Char(' '),
        KeyModifiers::NONE,
    )))
    .unwrap();

    let mut rng = StdRng::seed_from_u64(5);
    let (mut state, _) = engine::start(&config, &mut rng);
    assert_eq!(state.phase, Phase::Training);
    let opening_time = state.time_remaining;

    let mut pulse_count = 0;
    for _ in 0..30u32 {
        match pump.next() {
            Event::Key(key) if key.code == KeyCode::Char(' ') => {
                state = engine::toggle_pause(&state);
            }
            Event::Pulse => {
                pulse_count += 1;
                if state.is_running {
                    let result = engine::tick(&state, &config, &mut rng);
                    state = result.next;
                } else {
                    let result = engine::tick(&state, &config, &mut rng);
                    assert_eq!(result.next, state, "paused tick must be a no-op");
                    assert!(result.cues.is_empty());
                    state = result.next;
                }
            }
            _ => {}
        }
    }

    assert!(pulse_count > 0, "pump never pulsed");
    assert!(!state.is_running);
    assert_eq!(state.time_remaining, opening_time);
}

// Bell strike counts are part of the session feel, not just the unit
// tests: boundaries hit hardest.
#[test]
fn headless_cue_strikes_follow_boundaries() {
    assert_eq!(strikes(Cue::RoundStart), 1);
    assert_eq!(strikes(Cue::Intense), 2);
    assert_eq!(strikes(Cue::Normal), 1);
    assert_eq!(strikes(Cue::RoundEnd), 3);
    assert_eq!(strikes(Cue::FinalEnd), 3);
}
