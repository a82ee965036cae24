//! The timer state machine. Pure value-to-value transitions: the shell owns
//! the [`TimerState`], calls [`tick`] once per logical second, and performs
//! the side effects named by the returned cues itself.

use rand::Rng;

use crate::preset::Config;

/// Coarse lifecycle stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    Training,
    Cooldown,
}

/// Exertion label for the current segment, drives presentation and the
/// statistics bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Warmup,
    Intense,
    Normal,
    Rest,
    Cooldown,
}

/// Named audio cues. The engine only ever names them; rendering is the
/// caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    RoundStart,
    RoundEnd,
    FinalEnd,
    Intense,
    Normal,
}

/// Working memory of one session. Built by [`start`], advanced by [`tick`],
/// discarded on stop or completion.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    pub phase: Phase,
    /// 1-indexed.
    pub current_round: u32,
    /// Seconds left in the current phase or segment.
    pub time_remaining: u32,
    /// Distinguishes a round's trailing rest from the round itself.
    pub is_resting: bool,
    /// Pause flag; a paused state passes through [`tick`] unchanged.
    pub is_running: bool,
    pub intensity: Intensity,
    /// Length of the current sub-period as it was drawn.
    pub next_switch: u32,
    /// The `time_remaining` value at which the next intensity switch fires.
    /// Never scheduled below 1 while a round is active.
    pub switch_target: u32,
    /// Reserved for a low-time warning that is not triggered yet.
    pub warning_played: bool,
    pub total_intense_time: u32,
    pub total_normal_time: u32,
}

/// Outcome of one tick: the successor state, the cues to sound, and whether
/// the session just finished.
#[derive(Debug, Clone)]
pub struct TickResult {
    pub next: TimerState,
    pub cues: Vec<Cue>,
    pub completed: bool,
}

/// Open a fresh session. With a warm-up configured the clock starts there,
/// silently; otherwise round one opens immediately with its start cue.
pub fn start<R: Rng>(config: &Config, rng: &mut R) -> (TimerState, Vec<Cue>) {
    if config.warmup_duration > 0 {
        let state = TimerState {
            phase: Phase::Warmup,
            current_round: 1,
            time_remaining: config.warmup_duration,
            is_resting: false,
            is_running: true,
            intensity: Intensity::Warmup,
            next_switch: 0,
            switch_target: 0,
            warning_played: false,
            total_intense_time: 0,
            total_normal_time: 0,
        };
        return (state, Vec::new());
    }

    let drawn = draw_period(config, Intensity::Normal, 1, rng);
    let state = TimerState {
        phase: Phase::Training,
        current_round: 1,
        time_remaining: config.round_duration,
        is_resting: false,
        is_running: true,
        intensity: Intensity::Normal,
        next_switch: drawn,
        switch_target: config.round_duration.saturating_sub(drawn).max(1),
        warning_played: false,
        total_intense_time: 0,
        total_normal_time: 0,
    };
    (state, vec![Cue::RoundStart])
}

/// Advance the clock by one logical second.
///
/// A tick either decrements the countdown within the current segment or
/// performs exactly one segment/phase transition, never both. Statistics
/// accumulate only on decrement ticks of an active round segment.
pub fn tick<R: Rng>(prev: &TimerState, config: &Config, rng: &mut R) -> TickResult {
    if !prev.is_running {
        return TickResult {
            next: prev.clone(),
            cues: Vec::new(),
            completed: false,
        };
    }

    match prev.phase {
        Phase::Warmup => tick_warmup(prev, config, rng),
        Phase::Training => tick_training(prev, config, rng),
        Phase::Cooldown => tick_cooldown(prev),
    }
}

/// Flip the pause flag. No timing field is touched; the shell stops
/// delivering ticks while paused.
pub fn toggle_pause(prev: &TimerState) -> TimerState {
    TimerState {
        is_running: !prev.is_running,
        ..prev.clone()
    }
}

/// Length in seconds for the next sub-period of the given intensity,
/// uniformly drawn from the effective (possibly progressively scaled)
/// range for `round`.
///
/// Ranges must be ordered; [`Config::validate`] screens imported values
/// before a session may start.
pub fn draw_period<R: Rng>(
    config: &Config,
    intensity: Intensity,
    round: u32,
    rng: &mut R,
) -> u32 {
    let timings = config.round_timings(round);
    let (min, max) = match intensity {
        Intensity::Intense => (timings.intense_min, timings.intense_max),
        _ => (timings.normal_min, timings.normal_max),
    };
    rng.gen_range(min..=max)
}

fn tick_warmup<R: Rng>(prev: &TimerState, config: &Config, rng: &mut R) -> TickResult {
    if prev.time_remaining > 1 {
        let mut next = prev.clone();
        next.time_remaining -= 1;
        return TickResult {
            next,
            cues: Vec::new(),
            completed: false,
        };
    }

    let (next, cues) = begin_round(prev, config, 1, rng);
    TickResult {
        next,
        cues,
        completed: false,
    }
}

fn tick_cooldown(prev: &TimerState) -> TickResult {
    if prev.time_remaining > 1 {
        let mut next = prev.clone();
        next.time_remaining -= 1;
        return TickResult {
            next,
            cues: Vec::new(),
            completed: false,
        };
    }

    let mut next = prev.clone();
    next.time_remaining = 0;
    next.is_running = false;
    TickResult {
        next,
        cues: vec![Cue::FinalEnd],
        completed: true,
    }
}

fn tick_training<R: Rng>(prev: &TimerState, config: &Config, rng: &mut R) -> TickResult {
    if prev.time_remaining <= 1 {
        if prev.is_resting {
            return end_rest(prev, config, rng);
        }
        return end_active(prev, config);
    }

    let mut next = prev.clone();
    next.time_remaining -= 1;
    let mut cues = Vec::new();

    if !prev.is_resting {
        if next.time_remaining <= prev.switch_target && prev.switch_target > 0 {
            let flipped = match prev.intensity {
                Intensity::Intense => Intensity::Normal,
                _ => Intensity::Intense,
            };
            let drawn = draw_period(config, flipped, prev.current_round, rng);
            next.intensity = flipped;
            next.next_switch = drawn;
            next.switch_target = next.time_remaining.saturating_sub(drawn).max(1);
            next.warning_played = false;
            cues.push(match flipped {
                Intensity::Intense => Cue::Intense,
                _ => Cue::Normal,
            });
        }

        // the elapsed second is credited to whichever intensity now holds
        match next.intensity {
            Intensity::Intense => next.total_intense_time += 1,
            Intensity::Normal => next.total_normal_time += 1,
            _ => {}
        }
    }

    TickResult {
        next,
        cues,
        completed: false,
    }
}

/// Active segment ran out: ring the round bell, then rest or finish.
fn end_active(prev: &TimerState, config: &Config) -> TickResult {
    let cues = vec![Cue::RoundEnd];
    if prev.current_round >= config.rounds {
        return finish_or_cooldown(prev, config, cues);
    }

    let next = TimerState {
        time_remaining: config.rest_duration,
        is_resting: true,
        intensity: Intensity::Rest,
        warning_played: false,
        ..prev.clone()
    };
    TickResult {
        next,
        cues,
        completed: false,
    }
}

/// Rest segment ran out: open the next round. A rest normally only follows
/// a non-final round; if the round count says otherwise, end the session.
fn end_rest<R: Rng>(prev: &TimerState, config: &Config, rng: &mut R) -> TickResult {
    if prev.current_round >= config.rounds {
        return finish_or_cooldown(prev, config, Vec::new());
    }

    let (next, cues) = begin_round(prev, config, prev.current_round + 1, rng);
    TickResult {
        next,
        cues,
        completed: false,
    }
}

/// Final round is done: move into cool-down when one is configured,
/// otherwise stop the clock and signal completion.
fn finish_or_cooldown(prev: &TimerState, config: &Config, mut cues: Vec<Cue>) -> TickResult {
    if config.cooldown_duration > 0 {
        let next = TimerState {
            phase: Phase::Cooldown,
            time_remaining: config.cooldown_duration,
            is_resting: false,
            intensity: Intensity::Cooldown,
            next_switch: 0,
            switch_target: 0,
            warning_played: false,
            ..prev.clone()
        };
        return TickResult {
            next,
            cues,
            completed: false,
        };
    }

    cues.push(Cue::FinalEnd);
    let mut next = prev.clone();
    next.time_remaining = 0;
    next.is_running = false;
    next.is_resting = false;
    TickResult {
        next,
        cues,
        completed: true,
    }
}

fn begin_round<R: Rng>(
    prev: &TimerState,
    config: &Config,
    round: u32,
    rng: &mut R,
) -> (TimerState, Vec<Cue>) {
    let drawn = draw_period(config, Intensity::Normal, round, rng);
    let next = TimerState {
        phase: Phase::Training,
        current_round: round,
        time_remaining: config.round_duration,
        is_resting: false,
        intensity: Intensity::Normal,
        next_switch: drawn,
        switch_target: config.round_duration.saturating_sub(drawn).max(1),
        warning_played: false,
        ..prev.clone()
    };
    (next, vec![Cue::RoundStart])
}
