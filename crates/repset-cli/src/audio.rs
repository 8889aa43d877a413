//! Cue synthesis over the default audio output.
//!
//! Tones are generated as raw sample buffers and handed to rodio.
//! Playback is fire-and-forget: every failure path degrades to
//! silence, the workout never depends on sound succeeding.

use repset_core::{CueKind, CuePlayer};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

const SAMPLE_RATE: u32 = 44_100;
const ENVELOPE_FLOOR: f32 = 0.001;

/// Synthesized cue player bound to the default output device.
///
/// Constructing one is the explicit audio-initialization step; hold it
/// for as long as cues should be audible.
pub struct SynthCuePlayer {
    // The stream stops when dropped; keep it alive with the player.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl SynthCuePlayer {
    /// Open the default output device. Returns `None` when no device
    /// is available; callers fall back to silence.
    pub fn open(volume_pct: u32) -> Option<Self> {
        let (stream, handle) = OutputStream::try_default().ok()?;
        Some(Self {
            _stream: stream,
            handle,
            volume: volume_pct.min(100) as f32 / 100.0,
        })
    }

    fn play_samples(&self, samples: Vec<f32>) {
        if let Ok(sink) = Sink::try_new(&self.handle) {
            sink.set_volume(self.volume);
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
            sink.detach();
        }
    }
}

impl CuePlayer for SynthCuePlayer {
    fn play(&self, kind: CueKind) {
        let samples = match kind {
            // Short high ping.
            CueKind::Beep => ping(1200.0, 0.1, 0.05),
            // Bell chime: 2 kHz fundamental with a fifth above it,
            // sharp attack, exponential decay.
            CueKind::Finish => mix(bell(2000.0, 1.5, 0.3), bell(3000.0, 0.5, 0.1)),
        };
        self.play_samples(samples);
    }
}

/// Sine burst decaying exponentially from `level` over its length.
fn ping(freq: f32, duration: f32, level: f32) -> Vec<f32> {
    let count = (SAMPLE_RATE as f32 * duration) as usize;
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = level * (ENVELOPE_FLOOR / level).powf(t / duration);
            env * (std::f32::consts::TAU * freq * t).sin()
        })
        .collect()
}

/// Sine burst with a 10 ms linear attack to `peak`, then exponential
/// decay to the envelope floor.
fn bell(freq: f32, duration: f32, peak: f32) -> Vec<f32> {
    let count = (SAMPLE_RATE as f32 * duration) as usize;
    let attack = 0.01_f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = if t < attack {
                peak * t / attack
            } else {
                peak * (ENVELOPE_FLOOR / peak).powf((t - attack) / (duration - attack))
            };
            env * (std::f32::consts::TAU * freq * t).sin()
        })
        .collect()
}

/// Sum two buffers; the result is as long as the longer one.
fn mix(mut base: Vec<f32>, overlay: Vec<f32>) -> Vec<f32> {
    if overlay.len() > base.len() {
        base.resize(overlay.len(), 0.0);
    }
    for (slot, sample) in base.iter_mut().zip(overlay) {
        *slot += sample;
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_length_matches_duration() {
        let samples = ping(1200.0, 0.1, 0.05);
        assert_eq!(samples.len(), (SAMPLE_RATE as f32 * 0.1) as usize);
    }

    #[test]
    fn bell_attack_ramps_from_silence() {
        let samples = bell(2000.0, 1.5, 0.3);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().any(|s| s.abs() > 0.1));
        // Decayed to near silence by the end.
        let tail = &samples[samples.len() - 100..];
        assert!(tail.iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn mix_keeps_longer_buffer() {
        let mixed = mix(vec![0.1; 10], vec![0.2; 20]);
        assert_eq!(mixed.len(), 20);
        assert!((mixed[0] - 0.3).abs() < 1e-6);
        assert!((mixed[15] - 0.2).abs() < 1e-6);
    }
}
