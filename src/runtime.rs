//! Terminal input and bell output for the session loop.
//!
//! The engine clock is anchored to wall-time deadlines inside the app, so
//! the loop never sleeps for a full second: the pump wakes it on every key
//! press and otherwise at a short fixed interval, and the app decides
//! whether an engine tick has come due.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::engine::Cue;

/// What the session loop wakes up to.
#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within the wakeup interval. Not an engine tick;
    /// only an upper bound on how late a due tick can run.
    Pulse,
}

/// Hands out terminal input with a bounded wait.
pub struct EventPump {
    rx: Receiver<Event>,
    wakeup: Duration,
}

impl EventPump {
    /// Pump the real terminal, with keys and resizes forwarded from a
    /// reader thread.
    pub fn start(wakeup: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_terminal_events(tx));
        Self { rx, wakeup }
    }

    /// A pump fed by hand instead of by a terminal.
    pub fn scripted(rx: Receiver<Event>, wakeup: Duration) -> Self {
        Self { rx, wakeup }
    }

    /// The next input event, or [`Event::Pulse`] once the wakeup interval
    /// passes. A dead feed also pulses, so the loop keeps ticking.
    pub fn next(&self) -> Event {
        match self.rx.recv_timeout(self.wakeup) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Event::Pulse,
        }
    }
}

fn forward_terminal_events(tx: Sender<Event>) {
    loop {
        let sent = match event::read() {
            Ok(CtEvent::Key(key)) => tx.send(Event::Key(key)),
            Ok(CtEvent::Resize(_, _)) => tx.send(Event::Resize),
            Ok(_) => Ok(()),
            Err(_) => break,
        };
        if sent.is_err() {
            break;
        }
    }
}

/// Where audio cues land. The engine names cues; a sink makes them audible.
pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

/// Strike counts per cue, following the ring-bell sound design: single
/// strike to open a round, triple at round and session boundaries, double
/// for the jump into intense work.
pub fn strikes(cue: Cue) -> u32 {
    match cue {
        Cue::RoundStart => 1,
        Cue::RoundEnd => 3,
        Cue::FinalEnd => 3,
        Cue::Intense => 2,
        Cue::Normal => 1,
    }
}

/// Rings the terminal bell, one BEL per strike.
pub struct TerminalBell;

impl CueSink for TerminalBell {
    fn play(&mut self, cue: Cue) {
        let mut out = io::stdout();
        for _ in 0..strikes(cue) {
            let _ = out.write_all(b"\x07");
        }
        let _ = out.flush();
    }
}

/// Collects cues instead of playing them; headless runs and tests.
#[derive(Debug, Default)]
pub struct NullCueSink {
    pub played: Vec<Cue>,
}

impl CueSink for NullCueSink {
    fn play(&mut self, cue: Cue) {
        self.played.push(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn test_idle_pump_pulses() {
        let (_tx, rx) = mpsc::channel();
        let pump = EventPump::scripted(rx, Duration::from_millis(1));
        assert_matches!(pump.next(), Event::Pulse);
    }

    #[test]
    fn test_queued_input_preempts_the_pulse() {
        let (tx, rx) = mpsc::channel();
        let pump = EventPump::scripted(rx, Duration::from_secs(60));
        tx.send(Event::Resize).unwrap();
        // must return well before the 60s wakeup
        assert_matches!(pump.next(), Event::Resize);
    }

    #[test]
    fn test_dead_feed_degrades_to_pulses() {
        let (tx, rx) = mpsc::channel();
        tx.send(Event::Resize).unwrap();
        drop(tx);

        let pump = EventPump::scripted(rx, Duration::from_millis(1));
        assert_matches!(pump.next(), Event::Resize);
        assert_matches!(pump.next(), Event::Pulse);
        assert_matches!(pump.next(), Event::Pulse);
    }

    #[test]
    fn null_sink_records_cues() {
        let mut sink = NullCueSink::default();
        sink.play(Cue::RoundStart);
        sink.play(Cue::FinalEnd);
        assert_eq!(sink.played, vec![Cue::RoundStart, Cue::FinalEnd]);
    }

    #[test]
    fn boundary_cues_strike_hardest() {
        assert_eq!(strikes(Cue::RoundEnd), 3);
        assert_eq!(strikes(Cue::FinalEnd), 3);
        assert!(strikes(Cue::Intense) > strikes(Cue::Normal));
    }
}
