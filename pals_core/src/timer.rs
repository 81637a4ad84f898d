//! Resuscitation stopwatch: total elapsed time and the 2-minute CPR cycle.
//!
//! [`SessionTimer`] is plain state advanced by [`SessionTimer::tick`]; the
//! wall-clock driver lives in [`crate::live`].

use serde::{Deserialize, Serialize};

/// Length of one CPR cycle before the rhythm/pulse check (seconds)
pub const CYCLE_SECONDS: u32 = 120;

/// Past this many cycle seconds the cycle clock is highlighted
pub const WARNING_AFTER: u32 = 110;

/// Past this many cycle seconds the "check rhythm and pulse" prompt shows
pub const CHECK_AFTER: u32 = 115;

/// How far into the cycle we are
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Compressions,
    /// Rhythm check approaching
    Warning,
    /// Check rhythm and pulse now
    CheckRhythm,
}

/// Result of one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// The counters moved (false while paused)
    pub advanced: bool,
    /// The cycle clock wrapped back to zero on this tick
    pub cycle_completed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimer {
    pub total_seconds: u64,
    pub cycle_seconds: u32,
    pub running: bool,
    pub metronome_on: bool,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one second; no-op while paused
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::default();
        }

        self.total_seconds += 1;
        self.cycle_seconds += 1;

        let cycle_completed = self.cycle_seconds >= CYCLE_SECONDS;
        if cycle_completed {
            self.cycle_seconds = 0;
            tracing::info!(
                "CPR cycle complete at {}; check rhythm",
                format_clock(self.total_seconds)
            );
        }

        TickOutcome {
            advanced: true,
            cycle_completed,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Start if paused, pause if running; returns the new running flag
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    /// Zero both counters and stop; the metronome toggle is left alone
    pub fn reset(&mut self) {
        self.total_seconds = 0;
        self.cycle_seconds = 0;
        self.running = false;
    }

    pub fn toggle_metronome(&mut self) -> bool {
        self.metronome_on = !self.metronome_on;
        self.metronome_on
    }

    /// The metronome only sounds while the session is running
    pub fn metronome_active(&self) -> bool {
        self.metronome_on && self.running
    }

    pub fn phase(&self) -> CyclePhase {
        if self.cycle_seconds > CHECK_AFTER {
            CyclePhase::CheckRhythm
        } else if self.cycle_seconds > WARNING_AFTER {
            CyclePhase::Warning
        } else {
            CyclePhase::Compressions
        }
    }

    /// Fraction of the current cycle elapsed, 0.0..1.0
    pub fn cycle_progress(&self) -> f64 {
        f64::from(self.cycle_seconds) / f64::from(CYCLE_SECONDS)
    }
}

/// `MM:SS`; minutes keep counting past 59
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(timer: &mut SessionTimer, ticks: u32) -> u32 {
        (0..ticks).filter(|_| timer.tick().cycle_completed).count() as u32
    }

    #[test]
    fn test_125_ticks() {
        let mut timer = SessionTimer::new();
        timer.start();
        let wraps = run(&mut timer, 125);
        assert_eq!(timer.total_seconds, 125);
        assert_eq!(timer.cycle_seconds, 5);
        assert_eq!(wraps, 1);
    }

    #[test]
    fn test_wrap_lands_on_zero() {
        let mut timer = SessionTimer::new();
        timer.start();
        run(&mut timer, 119);
        assert_eq!(timer.cycle_seconds, 119);
        let outcome = timer.tick();
        assert!(outcome.cycle_completed);
        assert_eq!(timer.cycle_seconds, 0);
        assert_eq!(timer.total_seconds, 120);
    }

    #[test]
    fn test_pause_freezes_counters() {
        let mut timer = SessionTimer::new();
        timer.start();
        run(&mut timer, 30);

        timer.pause();
        for _ in 0..50 {
            assert_eq!(timer.tick(), TickOutcome::default());
        }
        assert_eq!(timer.total_seconds, 30);
        assert_eq!(timer.cycle_seconds, 30);

        timer.toggle_running();
        run(&mut timer, 10);
        assert_eq!(timer.total_seconds, 40);
        assert_eq!(timer.cycle_seconds, 40);
    }

    #[test]
    fn test_ticks_before_start_do_nothing() {
        let mut timer = SessionTimer::new();
        run(&mut timer, 10);
        assert_eq!(timer, SessionTimer::new());
    }

    #[test]
    fn test_reset_stops_and_zeroes() {
        let mut timer = SessionTimer::new();
        timer.start();
        timer.toggle_metronome();
        run(&mut timer, 200);

        timer.reset();
        assert_eq!(timer.total_seconds, 0);
        assert_eq!(timer.cycle_seconds, 0);
        assert!(!timer.running);
        assert!(timer.metronome_on);
        assert!(!timer.metronome_active());
    }

    #[test]
    fn test_metronome_needs_running() {
        let mut timer = SessionTimer::new();
        assert!(timer.toggle_metronome());
        assert!(!timer.metronome_active());
        timer.start();
        assert!(timer.metronome_active());
        assert!(!timer.toggle_metronome());
        assert!(!timer.metronome_active());
    }

    #[test]
    fn test_phases() {
        let mut timer = SessionTimer::new();
        timer.start();
        run(&mut timer, 110);
        assert_eq!(timer.phase(), CyclePhase::Compressions);
        timer.tick();
        assert_eq!(timer.phase(), CyclePhase::Warning);
        run(&mut timer, 5);
        assert_eq!(timer.cycle_seconds, 116);
        assert_eq!(timer.phase(), CyclePhase::CheckRhythm);
        run(&mut timer, 4);
        assert_eq!(timer.phase(), CyclePhase::Compressions);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(125), "02:05");
        assert_eq!(format_clock(3725), "62:05");
    }
}
