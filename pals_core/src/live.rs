//! Wall-clock driver for [`SessionTimer`].
//!
//! Two periodic callbacks run while the session is live: a 1 s tick and, if
//! enabled, the metronome beat. Pausing or resetting stops both; turning the
//! metronome off stops the beat; dropping the `LiveTimer` stops everything.

use crate::metronome::Metronome;
use crate::scheduler::Periodic;
use crate::timer::SessionTimer;
use crate::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct LiveTimer {
    state: Arc<Mutex<SessionTimer>>,
    metronome: Metronome,
    tick_interval: Duration,
    ticker: Option<Periodic>,
    beats: Option<Periodic>,
}

fn lock(state: &Mutex<SessionTimer>) -> MutexGuard<'_, SessionTimer> {
    // A panicked callback leaves plain counters behind; keep using them.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LiveTimer {
    pub fn new(metronome: Metronome) -> Self {
        Self::with_tick_interval(metronome, TICK_INTERVAL)
    }

    /// Shorter ticks for tests and demos; one tick still counts as one second
    pub fn with_tick_interval(metronome: Metronome, tick_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionTimer::new())),
            metronome,
            tick_interval,
            ticker: None,
            beats: None,
        }
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> SessionTimer {
        lock(&self.state).clone()
    }

    pub fn start(&mut self) -> Result<()> {
        lock(&self.state).start();
        tracing::info!("Resuscitation timer started");
        self.sync_callbacks()
    }

    pub fn pause(&mut self) -> Result<()> {
        lock(&self.state).pause();
        tracing::info!("Resuscitation timer paused");
        self.sync_callbacks()
    }

    pub fn toggle_running(&mut self) -> Result<bool> {
        let running = lock(&self.state).toggle_running();
        self.sync_callbacks()?;
        Ok(running)
    }

    /// Zero the counters and stop both callbacks
    pub fn reset(&mut self) -> Result<()> {
        lock(&self.state).reset();
        tracing::info!("Resuscitation timer reset");
        self.sync_callbacks()
    }

    pub fn toggle_metronome(&mut self) -> Result<bool> {
        let on = lock(&self.state).toggle_metronome();
        tracing::info!("Metronome {}", if on { "on" } else { "off" });
        self.sync_callbacks()?;
        Ok(on)
    }

    /// Whether each background callback is alive: `(tick, metronome)`
    pub fn callbacks_alive(&self) -> (bool, bool) {
        (self.ticker.is_some(), self.beats.is_some())
    }

    /// Start or stop the background callbacks to match the timer flags
    fn sync_callbacks(&mut self) -> Result<()> {
        let (running, metronome_active) = {
            let state = lock(&self.state);
            (state.running, state.metronome_active())
        };

        if running && self.ticker.is_none() {
            let state = Arc::clone(&self.state);
            self.ticker = Some(Periodic::spawn("tick", self.tick_interval, move || {
                lock(&state).tick();
            })?);
        } else if !running {
            if let Some(ticker) = self.ticker.take() {
                ticker.stop();
            }
        }

        if metronome_active && self.beats.is_none() {
            let state = Arc::clone(&self.state);
            let metronome = self.metronome.clone();
            self.beats = Some(Periodic::spawn("metronome", metronome.interval(), move || {
                if lock(&state).metronome_active() {
                    metronome.pulse();
                }
            })?);
        } else if !metronome_active {
            if let Some(beats) = self.beats.take() {
                beats.stop();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metronome::tests::CountingSink;
    use std::sync::atomic::Ordering;
    use std::thread;

    fn fast_timer(sink: Arc<CountingSink>) -> LiveTimer {
        let metronome = Metronome::with_bpm(6000, sink);
        LiveTimer::with_tick_interval(metronome, Duration::from_millis(5))
    }

    #[test]
    fn test_ticks_while_running() {
        let mut timer = fast_timer(Arc::new(CountingSink::default()));
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        timer.pause().unwrap();

        let snapshot = timer.snapshot();
        assert!(snapshot.total_seconds >= 3);
        assert_eq!(timer.callbacks_alive(), (false, false));

        thread::sleep(Duration::from_millis(40));
        assert_eq!(timer.snapshot().total_seconds, snapshot.total_seconds);
    }

    #[test]
    fn test_metronome_only_while_running() {
        let sink = Arc::new(CountingSink::default());
        let mut timer = fast_timer(sink.clone());

        timer.toggle_metronome().unwrap();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(sink.beeps.load(Ordering::SeqCst), 0);
        assert_eq!(timer.callbacks_alive(), (false, false));

        timer.start().unwrap();
        assert_eq!(timer.callbacks_alive(), (true, true));
        thread::sleep(Duration::from_millis(60));
        assert!(sink.beeps.load(Ordering::SeqCst) > 0);

        timer.toggle_metronome().unwrap();
        assert_eq!(timer.callbacks_alive(), (true, false));
        let beeps = sink.beeps.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(sink.beeps.load(Ordering::SeqCst), beeps);
    }

    #[test]
    fn test_reset_stops_everything() {
        let sink = Arc::new(CountingSink::default());
        let mut timer = fast_timer(sink.clone());
        timer.toggle_metronome().unwrap();
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(30));

        timer.reset().unwrap();
        assert_eq!(timer.callbacks_alive(), (false, false));
        let snapshot = timer.snapshot();
        assert_eq!(snapshot.total_seconds, 0);
        assert_eq!(snapshot.cycle_seconds, 0);
        assert!(!snapshot.running);

        let beeps = sink.beeps.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(sink.beeps.load(Ordering::SeqCst), beeps);
        assert_eq!(timer.snapshot().total_seconds, 0);
    }

    #[test]
    fn test_failing_sink_does_not_stop_timer() {
        let sink = Arc::new(CountingSink {
            fail: true,
            ..Default::default()
        });
        let mut timer = fast_timer(sink.clone());
        timer.toggle_metronome().unwrap();
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(60));

        assert!(timer.snapshot().total_seconds > 0);
        assert!(sink.beeps.load(Ordering::SeqCst) > 0);
        assert!(timer.snapshot().running);
    }

    #[test]
    fn test_toggle_running_restarts_ticks() {
        let mut timer = fast_timer(Arc::new(CountingSink::default()));
        assert!(timer.toggle_running().unwrap());
        thread::sleep(Duration::from_millis(30));
        assert!(!timer.toggle_running().unwrap());
        let frozen = timer.snapshot().total_seconds;
        assert!(timer.toggle_running().unwrap());
        thread::sleep(Duration::from_millis(30));
        assert!(timer.snapshot().total_seconds > frozen);
    }
}
