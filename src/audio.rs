//! Audio cue player
//!
//! Procedural tones, no sound files. The simulation only names cues; this
//! maps each cue to a short oscillator sweep and tracks mute/resume state.
//! Actual synthesis belongs to the platform backend, which receives [`Tone`]s.

use serde::{Deserialize, Serialize};

use crate::sim::AudioCue;

/// Oscillator shape for a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// A frequency sweep with a decaying gain envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub start_hz: f32,
    pub end_hz: f32,
    pub waveform: Waveform,
    pub duration_s: f32,
    pub gain: f32,
}

/// Sweep length for every cue
const TONE_DURATION_S: f32 = 0.1;
const TONE_GAIN: f32 = 0.1;
/// Exponential ramps cannot reach zero
const MIN_FREQUENCY_HZ: f32 = 0.01;

impl Tone {
    pub fn for_cue(cue: AudioCue) -> Self {
        let (start_hz, end_hz) = match cue {
            AudioCue::Dash => (150.0, 600.0),
            AudioCue::Shoot => (800.0, 300.0),
            AudioCue::Explosion => (100.0, 0.0),
            AudioCue::Pickup => (600.0, 1200.0),
            AudioCue::Plant => (200.0, 400.0),
        };
        let waveform = match cue {
            AudioCue::Explosion => Waveform::Sawtooth,
            AudioCue::Shoot => Waveform::Square,
            _ => Waveform::Sine,
        };
        Self {
            start_hz,
            end_hz: f32::max(end_hz, MIN_FREQUENCY_HZ),
            waveform,
            duration_s: TONE_DURATION_S,
            gain: TONE_GAIN,
        }
    }
}

/// Audio state for the game
#[derive(Debug, Clone)]
pub struct CuePlayer {
    muted: bool,
    /// Browsers keep audio suspended until a user gesture
    resumed: bool,
    master_volume: f32,
}

impl Default for CuePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl CuePlayer {
    pub fn new() -> Self {
        Self {
            muted: false,
            resumed: false,
            master_volume: 1.0,
        }
    }

    /// Mark the output as resumed (after a user gesture)
    pub fn resume(&mut self) {
        if !self.resumed {
            log::debug!("Audio resumed");
        }
        self.resumed = true;
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Tone to play for `cue`, or `None` if audio is muted or still suspended
    pub fn play(&self, cue: AudioCue) -> Option<Tone> {
        if self.muted || !self.resumed || self.master_volume <= 0.0 {
            return None;
        }
        let mut tone = Tone::for_cue(cue);
        tone.gain *= self.master_volume;
        Some(tone)
    }
}
