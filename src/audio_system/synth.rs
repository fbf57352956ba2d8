/// Procedural cue synthesis
///
/// Used for catalog entries without an audio file and as the fallback when
/// an asset cannot be fetched or decoded. Each trigger has a fixed recipe of
/// oscillator tones that is mixed into a mono clip.

use std::f32::consts::TAU;
use std::time::Duration;

use super::cache::DecodedAudio;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Linear ramp at the start of every tone
const ATTACK_MS: u32 = 5;

/// Level the exponential decay reaches at the end of a tone
const DECAY_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample at `phase` in [0, 1)
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// One oscillator voice in a cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub frequency_hz: f32,
    pub start_ms: u32,
    pub duration_ms: u32,
    pub gain: f32,
}

impl Tone {
    pub const fn new(
        waveform: Waveform,
        frequency_hz: f32,
        start_ms: u32,
        duration_ms: u32,
        gain: f32,
    ) -> Self {
        Self {
            waveform,
            frequency_hz,
            start_ms,
            duration_ms,
            gain,
        }
    }

    pub fn end_ms(&self) -> u32 {
        self.start_ms + self.duration_ms
    }
}

use Waveform::{Sawtooth, Sine, Square, Triangle};

const VICTORY: &[Tone] = &[
    Tone::new(Triangle, 523.25, 0, 180, 0.4),
    Tone::new(Triangle, 659.25, 120, 180, 0.4),
    Tone::new(Triangle, 783.99, 240, 180, 0.4),
    Tone::new(Sine, 1046.50, 360, 500, 0.45),
];

const DEFEAT: &[Tone] = &[
    Tone::new(Sawtooth, 392.00, 0, 250, 0.2),
    Tone::new(Sawtooth, 311.13, 200, 250, 0.2),
    Tone::new(Triangle, 261.63, 400, 600, 0.35),
];

const DRAW: &[Tone] = &[
    Tone::new(Sine, 440.00, 0, 200, 0.35),
    Tone::new(Sine, 440.00, 220, 200, 0.35),
];

const BET_CREATED: &[Tone] = &[
    Tone::new(Square, 660.00, 0, 80, 0.15),
    Tone::new(Square, 880.00, 90, 80, 0.15),
];

const BET_ACCEPTED: &[Tone] = &[
    Tone::new(Sine, 587.33, 0, 100, 0.35),
    Tone::new(Sine, 880.00, 110, 160, 0.35),
];

const GAME_START: &[Tone] = &[
    Tone::new(Triangle, 440.00, 0, 120, 0.35),
    Tone::new(Triangle, 554.37, 100, 120, 0.35),
    Tone::new(Triangle, 659.25, 200, 120, 0.35),
    Tone::new(Sine, 880.00, 300, 300, 0.4),
];

const NOTIFICATION: &[Tone] = &[
    Tone::new(Sine, 880.00, 0, 150, 0.3),
    Tone::new(Sine, 1174.66, 160, 200, 0.3),
];

const BALANCE_UPDATE: &[Tone] = &[
    Tone::new(Sine, 1318.51, 0, 60, 0.3),
    Tone::new(Sine, 1760.00, 70, 120, 0.3),
];

const ERROR: &[Tone] = &[
    Tone::new(Square, 220.00, 0, 150, 0.2),
    Tone::new(Square, 196.00, 170, 250, 0.2),
];

const CLICK: &[Tone] = &[Tone::new(Sine, 1000.00, 0, 40, 0.3)];

const HOVER: &[Tone] = &[Tone::new(Sine, 1500.00, 0, 25, 0.15)];

const TIMER_TICK: &[Tone] = &[Tone::new(Square, 2000.00, 0, 20, 0.1)];

/// Blip for triggers without a dedicated recipe
const GENERIC: &[Tone] = &[Tone::new(Sine, 660.00, 0, 120, 0.3)];

fn named_recipe(trigger: &str) -> Option<&'static [Tone]> {
    let tones = match trigger {
        "victory" => VICTORY,
        "defeat" => DEFEAT,
        "draw" => DRAW,
        "bet_created" => BET_CREATED,
        "bet_accepted" => BET_ACCEPTED,
        "game_start" => GAME_START,
        "notification" => NOTIFICATION,
        "balance_update" => BALANCE_UPDATE,
        "error" => ERROR,
        "click" => CLICK,
        "hover" => HOVER,
        "timer_tick" => TIMER_TICK,
        _ => return None,
    };
    Some(tones)
}

/// Tone recipe for `trigger`
pub fn recipe(trigger: &str) -> &'static [Tone] {
    named_recipe(trigger).unwrap_or(GENERIC)
}

pub fn has_recipe(trigger: &str) -> bool {
    named_recipe(trigger).is_some()
}

#[derive(Debug, Clone, Copy)]
pub struct Synthesizer {
    sample_rate: u32,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Synthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
        }
    }

    /// Length of the cue, i.e. the end of its latest voice
    pub fn duration(&self, trigger: &str) -> Duration {
        let end_ms = recipe(trigger).iter().map(Tone::end_ms).max().unwrap_or(0);
        Duration::from_millis(end_ms as u64)
    }

    /// Render the cue for `trigger` at `gain` into a mono clip
    pub fn render(&self, trigger: &str, gain: f32) -> DecodedAudio {
        self.render_tones(recipe(trigger), gain)
    }

    pub fn render_tones(&self, tones: &[Tone], gain: f32) -> DecodedAudio {
        let end_ms = tones.iter().map(Tone::end_ms).max().unwrap_or(0);
        let mut buffer = vec![0.0f32; self.ms_to_samples(end_ms)];

        for tone in tones {
            let start = self.ms_to_samples(tone.start_ms);
            let length = self.ms_to_samples(tone.duration_ms);
            let attack = self.ms_to_samples(ATTACK_MS).min(length).max(1);
            let step = tone.frequency_hz / self.sample_rate as f32;

            let mut phase = 0.0f32;
            for (i, slot) in buffer.iter_mut().skip(start).take(length).enumerate() {
                let envelope = if i < attack {
                    i as f32 / attack as f32
                } else {
                    let progress = (i - attack) as f32 / (length - attack).max(1) as f32;
                    DECAY_FLOOR.powf(progress)
                };

                *slot += tone.waveform.sample(phase) * envelope * tone.gain;
                phase = (phase + step).fract();
            }
        }

        for sample in buffer.iter_mut() {
            *sample = (*sample * gain).clamp(-1.0, 1.0);
        }

        DecodedAudio::new(1, self.sample_rate, buffer)
    }

    fn ms_to_samples(&self, ms: u32) -> usize {
        (ms as u64 * self.sample_rate as u64 / 1000) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fallback_triggers;

    #[test]
    fn test_every_fallback_trigger_has_a_recipe() {
        for trigger in fallback_triggers() {
            assert!(has_recipe(trigger), "no recipe for {}", trigger);
        }
        assert!(!has_recipe("jackpot"));
    }

    #[test]
    fn test_duration_follows_schedule() {
        let synth = Synthesizer::default();
        assert_eq!(synth.duration("victory"), Duration::from_millis(860));
        assert_eq!(synth.duration("click"), Duration::from_millis(40));
        assert_eq!(synth.duration("jackpot"), Duration::from_millis(120));
    }

    #[test]
    fn test_render_length_matches_duration() {
        let synth = Synthesizer::new(8_000);
        let clip = synth.render("victory", 1.0);
        assert_eq!(clip.channels(), 1);
        assert_eq!(clip.sample_rate(), 8_000);
        assert_eq!(clip.samples().len(), 6_880);
        assert_eq!(clip.duration(), synth.duration("victory"));
    }

    #[test]
    fn test_render_stays_in_range() {
        let synth = Synthesizer::default();
        for trigger in fallback_triggers() {
            let clip = synth.render(trigger, 1.0);
            assert!(clip.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
            assert!(clip.samples().iter().any(|s| s.abs() > 0.01), "{} is silent", trigger);
        }
    }

    #[test]
    fn test_envelope_starts_and_ends_quiet() {
        let synth = Synthesizer::default();
        let clip = synth.render("click", 1.0);
        let samples = clip.samples();

        assert_eq!(samples[0], 0.0);
        assert!(samples[samples.len() - 1].abs() < 0.01);
    }

    #[test]
    fn test_zero_gain_is_silent() {
        let clip = Synthesizer::default().render("victory", 0.0);
        assert!(clip.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_waveforms() {
        assert!(Waveform::Sine.sample(0.0).abs() < 1e-6);
        assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
        assert_eq!(Waveform::Square.sample(0.1), 1.0);
        assert_eq!(Waveform::Square.sample(0.9), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
    }
}
