//! Beat graph - oscillator pair, channel gains, stereo merge, master gain

use std::f32::consts::TAU;

use thiserror::Error;

use crate::track::Track;

/// Errors building graph nodes.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("frequency {hz} Hz is not renderable at a {sample_rate} Hz sample rate")]
    FrequencyOutOfRange { hz: f32, sample_rate: u32 },
}

/// Fixed per-channel level, kept well below clipping even when both ears
/// collapse onto a mono device.
pub const CHANNEL_GAIN: f32 = 0.4;

/// Master output level when unmuted.
pub const MASTER_GAIN: f32 = 0.8;

/// Phase-accumulator sine oscillator.
#[derive(Debug, Clone)]
pub(crate) struct SineOsc {
    hz: f32,
    phase: f32,
    step: f32,
}

impl SineOsc {
    fn new(hz: f32, sample_rate: u32) -> Result<Self, GraphError> {
        // Anything at or past Nyquist aliases instead of sounding.
        if sample_rate == 0 || hz >= sample_rate as f32 / 2.0 {
            return Err(GraphError::FrequencyOutOfRange { hz, sample_rate });
        }
        Ok(Self {
            hz,
            phase: 0.0,
            step: hz / sample_rate as f32,
        })
    }

    fn frequency(&self) -> f32 {
        self.hz
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let sample = (TAU * self.phase).sin();
        self.phase += self.step;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}

/// The full node chain for one playing track:
/// left oscillator -> left gain -> merge channel 0,
/// right oscillator -> right gain -> merge channel 1,
/// merge -> master gain -> device.
///
/// The merge stage is discrete: each ear keeps its own tone, nothing is
/// cross-mixed, which is what makes the beat binaural rather than a mono
/// amplitude wobble. Both oscillators and both channel gains exist
/// together or not at all; dropping the graph releases every node.
pub struct BeatGraph {
    left: SineOsc,
    right: SineOsc,
    left_gain: f32,
    right_gain: f32,
    master_gain: f32,
}

impl BeatGraph {
    /// Build the whole chain atomically. On failure nothing is retained;
    /// any node already built is released before the error propagates.
    pub fn new(track: &Track, sample_rate: u32, muted: bool) -> Result<Self, GraphError> {
        let left = SineOsc::new(track.left_hz, sample_rate)?;
        let right = SineOsc::new(track.right_hz, sample_rate)?;
        Ok(Self {
            left,
            right,
            left_gain: CHANNEL_GAIN,
            right_gain: CHANNEL_GAIN,
            master_gain: if muted { 0.0 } else { MASTER_GAIN },
        })
    }

    /// Render one interleaved output buffer with the device's channel
    /// layout. Left feeds channel 0 and right channel 1; extra channels
    /// stay silent. A mono device gets the average of both ears - the
    /// beat itself is lost there, but playback keeps working.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frame in data.chunks_mut(channels) {
            let left = self.left.next_sample() * self.left_gain * self.master_gain;
            let right = self.right.next_sample() * self.right_gain * self.master_gain;
            // Mono layouts (and a ragged final chunk) fold both ears.
            if frame.len() < 2 {
                frame[0] = (left + right) * 0.5;
                continue;
            }
            frame[0] = left;
            frame[1] = right;
            for sample in frame.iter_mut().skip(2) {
                *sample = 0.0;
            }
        }
    }

    /// Instant gain switch; oscillator phase is untouched.
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Frequencies of the live pair, `(left, right)`.
    pub fn frequencies(&self) -> (f32, f32) {
        (self.left.frequency(), self.right.frequency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48_000;

    fn test_track() -> Track {
        Track { name: "Test", left_hz: 210.0, right_hz: 220.0 }
    }

    #[test]
    fn test_sine_starts_at_zero_and_stays_bounded() {
        let mut osc = SineOsc::new(440.0, SAMPLE_RATE).expect("valid oscillator");
        let first = osc.next_sample();
        assert!(first.abs() < 1e-6, "sine should start near 0, got {first}");
        for _ in 0..SAMPLE_RATE {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s), "sine out of range: {s}");
        }
    }

    #[test]
    fn test_oscillator_rejects_unrenderable_frequency() {
        assert!(SineOsc::new(24_000.0, SAMPLE_RATE).is_err());
        assert!(SineOsc::new(30_000.0, SAMPLE_RATE).is_err());
        assert!(SineOsc::new(440.0, 0).is_err());
        assert!(SineOsc::new(23_999.0, SAMPLE_RATE).is_ok());
    }

    #[test]
    fn test_graph_reports_track_frequencies() {
        let graph = BeatGraph::new(&test_track(), SAMPLE_RATE, false).expect("graph");
        assert_eq!(graph.frequencies(), (210.0, 220.0));
        assert_eq!(graph.master_gain(), MASTER_GAIN);
    }

    #[test]
    fn test_graph_construction_fails_on_bad_frequency() {
        let track = Track { name: "Test", left_hz: 210.0, right_hz: 30_000.0 };
        assert!(BeatGraph::new(&track, SAMPLE_RATE, false).is_err());
    }

    #[test]
    fn test_stereo_channels_are_discrete() {
        // Very different tones so the two channels cannot coincide.
        let track = Track { name: "Test", left_hz: 210.0, right_hz: 1_000.0 };
        let mut graph = BeatGraph::new(&track, SAMPLE_RATE, false).expect("graph");

        let mut buffer = vec![0.0f32; 512 * 2];
        graph.render(&mut buffer, 2);

        let differing = buffer
            .chunks(2)
            .filter(|frame| (frame[0] - frame[1]).abs() > 1e-4)
            .count();
        assert!(differing > 100, "channels should diverge, {differing} frames differ");

        let peak = buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.01, "output should be audible, peak {peak}");
        assert!(peak <= CHANNEL_GAIN * MASTER_GAIN + 1e-6, "output should not clip, peak {peak}");
    }

    #[test]
    fn test_muted_graph_is_silent_until_unmuted() {
        let mut graph = BeatGraph::new(&test_track(), SAMPLE_RATE, true).expect("graph");
        assert_eq!(graph.master_gain(), 0.0);

        let mut buffer = vec![1.0f32; 256];
        graph.render(&mut buffer, 2);
        assert!(buffer.iter().all(|s| *s == 0.0));

        graph.set_master_gain(MASTER_GAIN);
        graph.render(&mut buffer, 2);
        assert!(buffer.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_mono_render_folds_both_ears() {
        let mut graph = BeatGraph::new(&test_track(), SAMPLE_RATE, false).expect("graph");
        let mut buffer = vec![0.0f32; 256];
        graph.render(&mut buffer, 1);

        let peak = buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.01, "mono output should be audible, peak {peak}");
        assert!(peak <= CHANNEL_GAIN * MASTER_GAIN + 1e-6);
    }

    #[test]
    fn test_extra_channels_stay_silent() {
        let mut graph = BeatGraph::new(&test_track(), SAMPLE_RATE, false).expect("graph");
        let mut buffer = vec![1.0f32; 64 * 4];
        graph.render(&mut buffer, 4);

        for frame in buffer.chunks(4) {
            assert_eq!(frame[2], 0.0);
            assert_eq!(frame[3], 0.0);
        }
    }
}
