//! Core audio data types
//!
//! Structures shared across the pipeline: single stereo frames, decoded
//! clips, raw wave descriptors, and the playback state machine.

use crate::error::{Error, Result};

/// AudioFrame represents a single stereo sample (one frame of audio).
///
/// Used for passing audio data between the mixer and the output device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Create a frame from a mono sample (duplicated to both channels)
    pub fn from_mono(sample: f32) -> Self {
        AudioFrame { left: sample, right: sample }
    }

    /// Create a frame from left and right samples
    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Apply volume scaling to both channels
    pub fn apply_volume(&mut self, volume: f32) {
        self.left *= volume;
        self.right *= volume;
    }

    /// Add another frame to this frame (for mixing)
    pub fn add(&mut self, other: &AudioFrame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Clamp samples to valid range [-1.0, 1.0] to prevent clipping
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(-1.0, 1.0);
        self.right = self.right.clamp(-1.0, 1.0);
    }
}

/// Playback state of a sound voice or the music channel.
///
/// Transitions: Stopped → Playing (play), Playing ⇄ Paused (pause/resume),
/// any → Stopped (stop). Play on an already-playing voice restarts it from
/// the beginning; play on a paused voice resumes at position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not playing; position reset to the start
    Stopped,

    /// Actively producing samples
    Playing,

    /// Suspended; position retained
    Paused,
}

/// Fully decoded audio clip, ready for mixing.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Kept at native sample rate; the mixer converts to the device rate
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// PCM audio samples (interleaved stereo)
    pub samples: Vec<f32>,

    /// Native sample rate of the source
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from interleaved stereo samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert_eq!(samples.len() % 2, 0, "samples must be stereo pairs");
        Self { samples, sample_rate }
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Clip duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Get the audio frame at a specific frame index
    pub fn frame(&self, frame_index: usize) -> Option<AudioFrame> {
        let sample_index = frame_index * 2;
        if sample_index + 1 < self.samples.len() {
            Some(AudioFrame {
                left: self.samples[sample_index],
                right: self.samples[sample_index + 1],
            })
        } else {
            None
        }
    }
}

/// Raw PCM wave descriptor.
///
/// `data` holds packed little-endian sample frames whose layout is described
/// by the other fields. Invariant: `data.len()` is a whole number of frames
/// (`channels * bits_per_sample / 8` bytes each); violations surface as
/// `Error::InvalidWave` when the wave is used, never as panics.
#[derive(Debug, Clone)]
pub struct Wave {
    /// Packed sample data
    pub data: Vec<u8>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Bits per sample: 8 (unsigned), 16 (signed LE), or 32 (float LE)
    pub bits_per_sample: u16,

    /// Channel count: 1 (mono) or 2 (stereo)
    pub channels: u16,
}

impl Wave {
    /// Decode an audio file into a raw wave.
    ///
    /// Any format the decoder supports is accepted; the result is always
    /// 32-bit float stereo at the file's native sample rate.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Wave> {
        let (samples, sample_rate) = crate::audio::decoder::decode_file(path)?;
        Ok(Self::from_samples(&samples, sample_rate))
    }

    /// Build a 32-bit float stereo wave from interleaved samples.
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Wave {
        let mut data = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }

        Wave {
            data,
            sample_rate,
            bits_per_sample: 32,
            channels: 2,
        }
    }

    /// Data size in bytes
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Size of one frame (all channels) in bytes
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Number of sample frames described by the data
    pub fn frame_count(&self) -> usize {
        let bpf = self.bytes_per_frame();
        if bpf == 0 {
            0
        } else {
            self.data.len() / bpf
        }
    }

    /// Wave duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }

    /// Check the descriptor invariants.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bits_per_sample, 8 | 16 | 32) {
            return Err(Error::InvalidWave(format!(
                "unsupported bits per sample: {}",
                self.bits_per_sample
            )));
        }

        if !matches!(self.channels, 1 | 2) {
            return Err(Error::InvalidWave(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }

        if self.sample_rate == 0 {
            return Err(Error::InvalidWave("sample rate is zero".to_string()));
        }

        if self.data.len() % self.bytes_per_frame() != 0 {
            return Err(Error::InvalidWave(format!(
                "data size {} is not a whole number of {}-byte frames",
                self.data.len(),
                self.bytes_per_frame()
            )));
        }

        Ok(())
    }

    /// Convert the raw data into a mixable clip (stereo f32).
    ///
    /// Mono sources are duplicated to both channels.
    pub fn to_clip(&self) -> Result<AudioClip> {
        self.validate()?;

        let frames = self.frame_count();
        let mut samples = Vec::with_capacity(frames * 2);
        let bytes_per_sample = self.bits_per_sample as usize / 8;

        for frame_idx in 0..frames {
            let base = frame_idx * self.bytes_per_frame();

            let mut channel_sample = |ch: usize| -> f32 {
                let offset = base + ch * bytes_per_sample;
                match self.bits_per_sample {
                    8 => (self.data[offset] as i32 - 128) as f32 / 128.0,
                    16 => {
                        let raw = i16::from_le_bytes([self.data[offset], self.data[offset + 1]]);
                        raw as f32 / i16::MAX as f32
                    }
                    _ => f32::from_le_bytes([
                        self.data[offset],
                        self.data[offset + 1],
                        self.data[offset + 2],
                        self.data[offset + 3],
                    ]),
                }
            };

            let left = channel_sample(0);
            let right = if self.channels == 2 { channel_sample(1) } else { left };
            samples.push(left);
            samples.push(right);
        }

        Ok(AudioClip::new(samples, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_zero() {
        let frame = AudioFrame::zero();
        assert_eq!(frame.left, 0.0);
        assert_eq!(frame.right, 0.0);
    }

    #[test]
    fn test_audio_frame_from_mono() {
        let frame = AudioFrame::from_mono(0.5);
        assert_eq!(frame.left, 0.5);
        assert_eq!(frame.right, 0.5);
    }

    #[test]
    fn test_audio_frame_apply_volume() {
        let mut frame = AudioFrame::from_stereo(0.5, -0.5);
        frame.apply_volume(0.5);
        assert_eq!(frame.left, 0.25);
        assert_eq!(frame.right, -0.25);
    }

    #[test]
    fn test_audio_frame_add_and_clamp() {
        let mut frame = AudioFrame::from_stereo(0.8, -0.9);
        frame.add(&AudioFrame::from_stereo(0.8, -0.9));
        frame.clamp();
        assert_eq!(frame.left, 1.0);
        assert_eq!(frame.right, -1.0);
    }

    #[test]
    fn test_clip_duration_and_frame() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let clip = AudioClip::new(samples, 44100);

        assert_eq!(clip.frames(), 2);
        let frame = clip.frame(1).unwrap();
        assert_eq!(frame.left, 0.3);
        assert_eq!(frame.right, 0.4);
        assert!(clip.frame(2).is_none());
    }

    #[test]
    fn test_wave_f32_round_trip() {
        let samples = vec![0.0, 0.25, -0.5, 1.0];
        let wave = Wave::from_samples(&samples, 48000);

        assert_eq!(wave.frame_count(), 2);
        let clip = wave.to_clip().unwrap();
        assert_eq!(clip.samples, samples);
        assert_eq!(clip.sample_rate, 48000);
    }

    #[test]
    fn test_wave_mono_16bit_to_clip() {
        // Two mono frames: full scale and half scale
        let data = [
            i16::MAX.to_le_bytes(),
            (i16::MAX / 2).to_le_bytes(),
        ]
        .concat();

        let wave = Wave {
            data,
            sample_rate: 22050,
            bits_per_sample: 16,
            channels: 1,
        };

        let clip = wave.to_clip().unwrap();
        assert_eq!(clip.frames(), 2);
        // Mono duplicated to both channels
        assert_eq!(clip.samples[0], clip.samples[1]);
        assert!((clip.samples[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wave_validate_rejects_partial_frame() {
        let wave = Wave {
            data: vec![0u8; 5],
            sample_rate: 44100,
            bits_per_sample: 16,
            channels: 2,
        };
        assert!(wave.validate().is_err());
    }

    #[test]
    fn test_wave_validate_rejects_bad_bits() {
        let wave = Wave {
            data: vec![0u8; 4],
            sample_rate: 44100,
            bits_per_sample: 24,
            channels: 2,
        };
        assert!(wave.validate().is_err());
    }

    #[test]
    fn test_wave_duration() {
        let wave = Wave {
            data: vec![0u8; 44100 * 4], // 1 second of 16-bit stereo
            sample_rate: 44100,
            bits_per_sample: 16,
            channels: 2,
        };
        assert!((wave.duration_seconds() - 1.0).abs() < 1e-6);
    }
}
