//! Software mixer
//!
//! Produces the final output one frame at a time: the sum of every playing
//! sound voice plus the music channel. Runs inside the device callback
//! behind a mutex, so everything here must be allocation-free and quick.
//!
//! The music channel is the consumer half of an SPSC ring buffer. The
//! producer half lives with the music stream, which refills it from the
//! decoder on `update` calls outside the audio thread.

use crate::audio::types::{AudioFrame, PlaybackState};
use crate::sound::SoundBank;
use ringbuf::traits::{Consumer, Observer};
use ringbuf::HeapCons;

/// Consumer side of a streaming music track.
///
/// Holds only what the audio thread needs: the ring to pull samples from,
/// volume, and playback state. Decode-side state stays in `MusicStream`.
pub struct MusicChannel {
    /// Device-rate interleaved stereo samples from the stream's producer
    consumer: HeapCons<f32>,

    state: PlaybackState,
    volume: f32,

    /// Output frames consumed so far, for progress reporting
    frames_consumed: u64,

    /// Callback ticks where the ring was empty while playing
    underruns: u64,
}

impl MusicChannel {
    pub fn new(consumer: HeapCons<f32>) -> Self {
        Self {
            consumer,
            state: PlaybackState::Stopped,
            volume: 1.0,
            frames_consumed: 0,
            underruns: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn frames_consumed(&self) -> u64 {
        self.frames_consumed
    }

    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    /// Samples currently buffered in the ring.
    pub fn buffered_samples(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Ring fill level, 0.0 (empty) to 1.0 (full).
    pub fn fill_level(&self) -> f32 {
        self.consumer.occupied_len() as f32 / self.consumer.capacity().get() as f32
    }

    /// Drop everything buffered in the ring. Used on stop and seek so stale
    /// audio does not play after a restart.
    pub fn clear(&mut self) {
        self.consumer.clear();
    }

    /// Reset progress accounting for a restart.
    pub fn reset_position(&mut self) {
        self.frames_consumed = 0;
    }

    /// Pull one frame from the ring.
    ///
    /// Returns silence when paused or stopped. An empty ring while playing
    /// also yields silence and counts an underrun; the stream recovers as
    /// soon as the producer catches up.
    pub(crate) fn next_frame(&mut self) -> AudioFrame {
        if self.state != PlaybackState::Playing {
            return AudioFrame::zero();
        }

        let mut samples = [0.0f32; 2];
        let popped = self.consumer.pop_slice(&mut samples);

        if popped < 2 {
            self.underruns += 1;
            return AudioFrame::zero();
        }

        self.frames_consumed += 1;

        let mut frame = AudioFrame::from_stereo(samples[0], samples[1]);
        frame.apply_volume(self.volume);
        frame
    }
}

/// Mixes sound voices and the music channel into single output frames.
pub struct Mixer {
    bank: SoundBank,
    music: Option<MusicChannel>,

    /// Output device sample rate; voices convert their clip rate to this
    output_rate: u32,
}

impl Mixer {
    pub fn new(output_rate: u32) -> Self {
        Self {
            bank: SoundBank::new(),
            music: None,
            output_rate,
        }
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn bank(&self) -> &SoundBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut SoundBank {
        &mut self.bank
    }

    /// Install the music channel, replacing any previous one.
    pub fn set_music(&mut self, channel: MusicChannel) {
        self.music = Some(channel);
    }

    /// Remove the music channel, silencing music immediately.
    pub fn take_music(&mut self) -> Option<MusicChannel> {
        self.music.take()
    }

    pub fn music(&self) -> Option<&MusicChannel> {
        self.music.as_ref()
    }

    pub fn music_mut(&mut self) -> Option<&mut MusicChannel> {
        self.music.as_mut()
    }

    /// Produce the next output frame.
    ///
    /// Called from the audio callback. Clipping protection happens at the
    /// output stage, not here, so intermediate sums may exceed ±1.0.
    pub fn next_frame(&mut self) -> AudioFrame {
        let mut frame = self.bank.mix_frame(self.output_rate);

        if let Some(music) = self.music.as_mut() {
            frame.add(&music.next_frame());
        }

        frame
    }
}
