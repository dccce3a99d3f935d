//! Bell cue synthesized from a sine oscillator and an amplitude envelope.

use std::f32::consts::TAU;
use std::time::Duration;

use rodio::Source;
use tracing::warn;

use super::output::Output;
use super::AudioCue;

/// Default pitch of the bell, in Hz.
pub const DEFAULT_FREQUENCY: f32 = 830.0;
/// Default peak amplitude.
pub const DEFAULT_PEAK: f32 = 0.5;
/// Default decay from peak to near silence.
pub const DEFAULT_DECAY: Duration = Duration::from_millis(1500);

const SAMPLE_RATE: u32 = 44_100;
const ATTACK: Duration = Duration::from_millis(10);
/// Amplitude the decay ends on.
const FLOOR: f32 = 0.001;

/// A single struck-bell tone: near-instant attack, exponential decay.
///
/// Implements [`rodio::Source`] and ends by itself once the decay is over.
#[derive(Debug, Clone)]
pub struct BellTone {
    frequency: f32,
    peak: f32,
    attack: u64,
    decay: u64,
    index: u64,
}

impl BellTone {
    /// Creates a tone. `peak` is clamped to `(FLOOR, 1.0]`.
    pub fn new(frequency: f32, peak: f32, decay: Duration) -> Self {
        Self {
            frequency,
            peak: peak.clamp(FLOOR * 2.0, 1.0),
            attack: samples(ATTACK),
            decay: samples(decay).max(1),
            index: 0,
        }
    }

    /// Number of samples in the whole tone.
    pub fn len(&self) -> u64 {
        self.attack + self.decay
    }

    /// Whether the tone has no samples at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Envelope gain at sample `index`.
    pub fn envelope(&self, index: u64) -> f32 {
        if index < self.attack {
            return self.peak * index as f32 / self.attack as f32;
        }
        let progress = (index - self.attack) as f32 / self.decay as f32;
        self.peak * (FLOOR / self.peak).powf(progress.min(1.0))
    }
}

fn samples(d: Duration) -> u64 {
    (d.as_secs_f64() * f64::from(SAMPLE_RATE)).round() as u64
}

impl Iterator for BellTone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.len() {
            return None;
        }
        let t = self.index as f32 / SAMPLE_RATE as f32;
        let sample = (TAU * self.frequency * t).sin() * self.envelope(self.index);
        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len().saturating_sub(self.index) as usize;
        (left, Some(left))
    }
}

impl Source for BellTone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.len().saturating_sub(self.index) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.len() as f64 / f64::from(SAMPLE_RATE),
        ))
    }
}

/// Plays a [`BellTone`] at every boundary.
///
/// The output device is opened lazily on the first cue.
pub struct SynthCue {
    frequency: f32,
    peak: f32,
    decay: Duration,
    output: Output,
}

impl SynthCue {
    /// Creates a cue with the given tone parameters.
    pub fn new(frequency: f32, peak: f32, decay: Duration) -> Self {
        Self {
            frequency,
            peak,
            decay,
            output: Output::new("synth"),
        }
    }

    /// The tone this cue plays.
    pub fn tone(&self) -> BellTone {
        BellTone::new(self.frequency, self.peak, self.decay)
    }
}

impl Default for SynthCue {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY, DEFAULT_PEAK, DEFAULT_DECAY)
    }
}

impl AudioCue for SynthCue {
    fn name(&self) -> &'static str {
        "synth"
    }

    fn play_cue(&self) {
        if let Err(err) = self.output.play(Box::new(self.tone())) {
            warn!(error = %err, "bell tone playback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_attack_and_decay() {
        let tone = BellTone::new(DEFAULT_FREQUENCY, DEFAULT_PEAK, DEFAULT_DECAY);
        let attack = samples(ATTACK);

        assert_eq!(tone.envelope(0), 0.0);
        assert!((tone.envelope(attack) - DEFAULT_PEAK).abs() < 1e-6);
        assert!((tone.envelope(tone.len()) - FLOOR).abs() < 1e-6);
    }

    #[test]
    fn test_envelope_decays_monotonically() {
        let tone = BellTone::new(DEFAULT_FREQUENCY, DEFAULT_PEAK, DEFAULT_DECAY);
        let attack = samples(ATTACK);
        let mut last = tone.envelope(attack);
        for i in (attack..tone.len()).step_by(441) {
            let gain = tone.envelope(i);
            assert!(gain <= last, "gain rose at sample {i}");
            last = gain;
        }
    }

    #[test]
    fn test_tone_ends_after_attack_plus_decay() {
        let tone = BellTone::new(DEFAULT_FREQUENCY, DEFAULT_PEAK, DEFAULT_DECAY);
        let expected = samples(ATTACK) + samples(DEFAULT_DECAY);
        assert_eq!(tone.len(), expected);
        assert_eq!(tone.clone().count() as u64, expected);

        let total = tone.total_duration().unwrap();
        assert!((total.as_secs_f64() - 1.51).abs() < 0.001);
    }

    #[test]
    fn test_samples_stay_within_peak() {
        let tone = BellTone::new(DEFAULT_FREQUENCY, 0.8, Duration::from_millis(200));
        assert!(tone.into_iter().all(|s| s.abs() <= 0.8 + 1e-6));
    }

    #[test]
    fn test_peak_is_clamped() {
        let tone = BellTone::new(DEFAULT_FREQUENCY, 4.0, DEFAULT_DECAY);
        assert!(tone.envelope(samples(ATTACK)) <= 1.0);
    }

    #[test]
    fn test_source_shape() {
        let tone = SynthCue::default().tone();
        assert_eq!(tone.channels(), 1);
        assert_eq!(tone.sample_rate(), SAMPLE_RATE);
    }
}
