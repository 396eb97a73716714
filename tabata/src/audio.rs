//! Tone cues for session start, phase transitions, and completion.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::warn;

const SAMPLE_RATE: u32 = 44_100;
/// Tone length; played back-to-back this is also the cue cadence.
const TONE_SECS: f32 = 0.2;
const ATTACK_GAIN: f32 = 0.3;
const RELEASE_GAIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueType {
    Beep,
    Glass,
    Ping,
    Submarine,
    Silent,
}

impl CueType {
    pub const ALL: [CueType; 5] = [
        CueType::Beep,
        CueType::Glass,
        CueType::Ping,
        CueType::Submarine,
        CueType::Silent,
    ];

    /// Unrecognized names fall back to the first timbre.
    pub fn from_name(name: &str) -> Self {
        match name {
            "glass" => CueType::Glass,
            "ping" => CueType::Ping,
            "submarine" => CueType::Submarine,
            "silent" => CueType::Silent,
            _ => CueType::Beep,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CueType::Beep => "beep",
            CueType::Glass => "glass",
            CueType::Ping => "ping",
            CueType::Submarine => "submarine",
            CueType::Silent => "silent",
        }
    }

    pub fn frequency(self) -> Option<f32> {
        match self {
            CueType::Beep => Some(1000.0),
            CueType::Glass => Some(2000.0),
            CueType::Ping => Some(1500.0),
            CueType::Submarine => Some(400.0),
            CueType::Silent => None,
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Plays cue tones through the default audio device.
///
/// The device is opened lazily on first use. When no device can be
/// opened the failure is logged once and playback degrades to a no-op;
/// a cue must never take the session down with it.
pub struct CuePlayer {
    stream: Option<(OutputStream, OutputStreamHandle)>,
    failed: bool,
}

impl CuePlayer {
    pub fn new() -> Self {
        Self {
            stream: None,
            failed: false,
        }
    }

    /// Retry a previously failed device open. Called when a session
    /// starts or a preset is applied, mirroring how a suspended audio
    /// context gets another chance on fresh user input.
    pub fn prime(&mut self) {
        self.failed = false;
        let _ = self.ensure_stream();
    }

    fn ensure_stream(&mut self) -> Option<&OutputStreamHandle> {
        if self.stream.is_none() && !self.failed {
            match OutputStream::try_default() {
                Ok(pair) => self.stream = Some(pair),
                Err(e) => {
                    warn!("audio output unavailable, cues disabled: {e}");
                    self.failed = true;
                }
            }
        }
        self.stream.as_ref().map(|(_, handle)| handle)
    }

    /// Queue `count` tones, 200 ms apart, and return immediately.
    pub fn play(&mut self, cue: CueType, count: u32) {
        let Some(frequency) = cue.frequency() else {
            return;
        };
        let Some(handle) = self.ensure_stream() else {
            return;
        };
        match Sink::try_new(handle) {
            Ok(sink) => {
                for _ in 0..count {
                    sink.append(render_tone(frequency));
                }
                sink.detach();
            }
            Err(e) => warn!("cue playback failed: {e}"),
        }
    }
}

impl Default for CuePlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthesize one cue tone: a sine burst with an exponential amplitude
/// decay from 0.3 to 0.01 across its length, so it ends without a click.
fn tone_samples(frequency: f32) -> Vec<f32> {
    let len = (SAMPLE_RATE as f32 * TONE_SECS) as usize;
    let decay = (RELEASE_GAIN / ATTACK_GAIN).ln();
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let envelope = ATTACK_GAIN * (decay * t / TONE_SECS).exp();
            envelope * (std::f32::consts::TAU * frequency * t).sin()
        })
        .collect()
}

fn render_tone(frequency: f32) -> SamplesBuffer<f32> {
    SamplesBuffer::new(1, SAMPLE_RATE, tone_samples(frequency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_name_falls_back_to_beep() {
        assert_eq!(CueType::from_name("beep"), CueType::Beep);
        assert_eq!(CueType::from_name("kazoo"), CueType::Beep);
        assert_eq!(CueType::from_name(""), CueType::Beep);
    }

    #[test]
    fn test_name_round_trip() {
        for cue in CueType::ALL {
            assert_eq!(CueType::from_name(cue.name()), cue);
        }
    }

    #[test]
    fn test_frequency_mapping() {
        assert_eq!(CueType::Beep.frequency(), Some(1000.0));
        assert_eq!(CueType::Glass.frequency(), Some(2000.0));
        assert_eq!(CueType::Ping.frequency(), Some(1500.0));
        assert_eq!(CueType::Submarine.frequency(), Some(400.0));
        assert_eq!(CueType::Silent.frequency(), None);
    }

    #[test]
    fn test_cue_cycling_visits_every_timbre() {
        let mut cue = CueType::Beep;
        for _ in 0..CueType::ALL.len() {
            cue = cue.next();
        }
        assert_eq!(cue, CueType::Beep);
        assert_eq!(CueType::Beep.prev(), CueType::Silent);
    }

    #[test]
    fn test_tone_length_matches_cadence() {
        let samples = tone_samples(1000.0);
        assert_eq!(samples.len(), 8820); // 200 ms at 44.1 kHz
    }

    #[test]
    fn test_tone_envelope_decays_without_clicks() {
        let samples = tone_samples(1000.0);
        let peak = |window: &[f32]| window.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let head = peak(&samples[..samples.len() / 10]);
        let tail = peak(&samples[samples.len() * 9 / 10..]);
        assert!(head <= ATTACK_GAIN + 1e-3);
        assert!(head > 0.2, "head of tone should be near full gain");
        assert!(tail < 0.02, "tail of tone should have decayed to ~0.01");
        assert!(head > tail * 10.0);
    }
}
