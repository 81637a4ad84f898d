//! Compression-rate metronome.
//!
//! Tone output goes through [`ToneSink`]. A sink that fails is logged and
//! otherwise ignored: a missing audio device must never disturb the timer.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Beats per minute, inside the 100-120/min compression target
pub const METRONOME_BPM: u32 = 110;

/// Interval between beats for a given rate
pub fn beat_interval(bpm: u32) -> Duration {
    Duration::from_secs_f64(60.0 / f64::from(bpm.max(1)))
}

/// Anything that can emit a short tone
pub trait ToneSink: Send + Sync {
    fn beep(&self) -> Result<()>;
}

/// ASCII BEL on stderr; most terminals turn it into a short click
#[derive(Debug, Default)]
pub struct TerminalBell;

impl ToneSink for TerminalBell {
    fn beep(&self) -> Result<()> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// Produces no sound
#[derive(Debug, Default)]
pub struct Silent;

impl ToneSink for Silent {
    fn beep(&self) -> Result<()> {
        Ok(())
    }
}

/// Which sink to build from configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneKind {
    #[default]
    Bell,
    Silent,
}

impl ToneKind {
    pub fn build(&self) -> Arc<dyn ToneSink> {
        match self {
            ToneKind::Bell => Arc::new(TerminalBell),
            ToneKind::Silent => Arc::new(Silent),
        }
    }
}

#[derive(Clone)]
pub struct Metronome {
    bpm: u32,
    sink: Arc<dyn ToneSink>,
}

impl Metronome {
    pub fn new(sink: Arc<dyn ToneSink>) -> Self {
        Self::with_bpm(METRONOME_BPM, sink)
    }

    pub fn with_bpm(bpm: u32, sink: Arc<dyn ToneSink>) -> Self {
        Self { bpm, sink }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn interval(&self) -> Duration {
        beat_interval(self.bpm)
    }

    /// Emit one beat; sink failures are swallowed
    pub fn pulse(&self) {
        if let Err(e) = self.sink.beep() {
            tracing::debug!("Metronome tone unavailable: {}", e);
        }
    }
}

impl std::fmt::Debug for Metronome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metronome").field("bpm", &self.bpm).finish()
    }
}
