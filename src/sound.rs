//! Loaded sound storage and per-sound voices
//!
//! Sounds are fully decoded clips held in a slot arena and addressed by
//! generational [`Sound`] handles. A handle that outlives its sound (or was
//! never valid) is simply ignored by every operation, so callers can hold
//! handles without worrying about use-after-unload.
//!
//! Each sound owns exactly one voice: playing a sound that is already
//! playing restarts it from the beginning rather than layering a second
//! copy.

use crate::audio::types::{AudioClip, AudioFrame, PlaybackState};
use tracing::debug;

/// Lowest pitch accepted; zero would freeze the cursor forever.
const MIN_PITCH: f32 = 0.001;

/// Handle to a loaded sound.
///
/// Copyable and cheap; remains safe to use after the sound is unloaded
/// (operations on a stale handle do nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sound {
    index: u32,
    generation: u32,
}

impl Sound {
    /// Handle that never refers to a loaded sound.
    pub const INVALID: Sound = Sound {
        index: u32::MAX,
        generation: 0,
    };
}

/// Playback state of one sound's voice.
struct Voice {
    clip: AudioClip,
    state: PlaybackState,

    /// Fractional frame position into the clip
    cursor: f64,

    volume: f32,
    pitch: f32,
}

impl Voice {
    fn new(clip: AudioClip) -> Self {
        Self {
            clip,
            state: PlaybackState::Stopped,
            cursor: 0.0,
            volume: 1.0,
            pitch: 1.0,
        }
    }

    /// Produce the next output frame and advance the cursor.
    ///
    /// The cursor steps by `pitch * clip_rate / output_rate`, which folds
    /// sample-rate conversion and pitch shift into one linear-interpolation
    /// read. Reaching the end of the clip stops the voice.
    fn next_frame(&mut self, output_rate: u32) -> AudioFrame {
        if self.state != PlaybackState::Playing {
            return AudioFrame::zero();
        }

        let index = self.cursor as usize;
        let frac = (self.cursor - index as f64) as f32;

        let current = match self.clip.frame(index) {
            Some(frame) => frame,
            None => {
                self.state = PlaybackState::Stopped;
                self.cursor = 0.0;
                return AudioFrame::zero();
            }
        };
        let next = self.clip.frame(index + 1).unwrap_or(current);

        let mut frame = AudioFrame {
            left: current.left + (next.left - current.left) * frac,
            right: current.right + (next.right - current.right) * frac,
        };
        frame.apply_volume(self.volume);

        let step = self.pitch as f64 * self.clip.sample_rate as f64 / output_rate as f64;
        self.cursor += step;

        if self.cursor >= self.clip.frames() as f64 {
            self.state = PlaybackState::Stopped;
            self.cursor = 0.0;
        }

        frame
    }
}

struct Slot {
    generation: u32,
    voice: Option<Voice>,
}

/// Arena of loaded sounds.
///
/// Slots are reused after unload; the generation counter in each slot is
/// bumped on removal so handles to the old occupant stop matching.
pub struct SoundBank {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a decoded clip and return its handle.
    pub fn insert(&mut self, clip: AudioClip) -> Sound {
        debug!(
            "Loading sound: {} frames at {} Hz",
            clip.frames(),
            clip.sample_rate
        );

        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.voice = Some(Voice::new(clip));
                Sound {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    voice: Some(Voice::new(clip)),
                });
                Sound {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Unload a sound. Returns false for a stale or invalid handle.
    pub fn remove(&mut self, sound: Sound) -> bool {
        match self.slot_mut(sound) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.voice = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(sound.index);
                true
            }
            None => false,
        }
    }

    /// Whether the handle refers to a currently loaded sound.
    pub fn contains(&self, sound: Sound) -> bool {
        self.slots
            .get(sound.index as usize)
            .map(|slot| slot.generation == sound.generation && slot.voice.is_some())
            .unwrap_or(false)
    }

    /// Number of loaded sounds.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.voice.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the sound.
    ///
    /// Stopped sounds start from the beginning, paused sounds resume at
    /// their position, and playing sounds restart from the beginning.
    pub fn play(&mut self, sound: Sound) {
        if let Some(voice) = self.voice_mut(sound) {
            match voice.state {
                PlaybackState::Stopped | PlaybackState::Playing => {
                    voice.cursor = 0.0;
                    voice.state = PlaybackState::Playing;
                }
                PlaybackState::Paused => {
                    voice.state = PlaybackState::Playing;
                }
            }
        }
    }

    /// Pause a playing sound, keeping its position.
    pub fn pause(&mut self, sound: Sound) {
        if let Some(voice) = self.voice_mut(sound) {
            if voice.state == PlaybackState::Playing {
                voice.state = PlaybackState::Paused;
            }
        }
    }

    /// Resume a paused sound at its position.
    pub fn resume(&mut self, sound: Sound) {
        if let Some(voice) = self.voice_mut(sound) {
            if voice.state == PlaybackState::Paused {
                voice.state = PlaybackState::Playing;
            }
        }
    }

    /// Stop the sound and rewind it.
    pub fn stop(&mut self, sound: Sound) {
        if let Some(voice) = self.voice_mut(sound) {
            voice.state = PlaybackState::Stopped;
            voice.cursor = 0.0;
        }
    }

    pub fn is_playing(&self, sound: Sound) -> bool {
        self.voice(sound)
            .map(|v| v.state == PlaybackState::Playing)
            .unwrap_or(false)
    }

    pub fn state(&self, sound: Sound) -> PlaybackState {
        self.voice(sound)
            .map(|v| v.state)
            .unwrap_or(PlaybackState::Stopped)
    }

    /// Per-sound volume, clamped to 0.0 ..= 1.0.
    pub fn set_volume(&mut self, sound: Sound, volume: f32) {
        if let Some(voice) = self.voice_mut(sound) {
            voice.volume = volume.clamp(0.0, 1.0);
        }
    }

    /// Per-sound pitch multiplier (1.0 = native speed).
    pub fn set_pitch(&mut self, sound: Sound, pitch: f32) {
        if let Some(voice) = self.voice_mut(sound) {
            voice.pitch = pitch.max(MIN_PITCH);
        }
    }

    /// Sum one output frame from every playing voice.
    pub fn mix_frame(&mut self, output_rate: u32) -> AudioFrame {
        let mut mixed = AudioFrame::zero();

        for slot in &mut self.slots {
            if let Some(voice) = slot.voice.as_mut() {
                if voice.state == PlaybackState::Playing {
                    mixed.add(&voice.next_frame(output_rate));
                }
            }
        }

        mixed
    }

    fn slot_mut(&mut self, sound: Sound) -> Option<usize> {
        let index = sound.index as usize;
        let slot = self.slots.get(index)?;
        if slot.generation == sound.generation && slot.voice.is_some() {
            Some(index)
        } else {
            None
        }
    }

    fn voice(&self, sound: Sound) -> Option<&Voice> {
        let slot = self.slots.get(sound.index as usize)?;
        if slot.generation == sound.generation {
            slot.voice.as_ref()
        } else {
            None
        }
    }

    fn voice_mut(&mut self, sound: Sound) -> Option<&mut Voice> {
        let slot = self.slots.get_mut(sound.index as usize)?;
        if slot.generation == sound.generation {
            slot.voice.as_mut()
        } else {
            None
        }
    }
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_clip(value: f32, frames: usize, rate: u32) -> AudioClip {
        AudioClip::new(vec![value; frames * 2], rate)
    }

    #[test]
    fn test_insert_and_contains() {
        let mut bank = SoundBank::new();
        let sound = bank.insert(constant_clip(0.5, 10, 44100));

        assert!(bank.contains(sound));
        assert_eq!(bank.len(), 1);
        assert!(!bank.contains(Sound::INVALID));
    }

    #[test]
    fn test_stale_handle_after_remove() {
        let mut bank = SoundBank::new();
        let first = bank.insert(constant_clip(0.5, 10, 44100));
        assert!(bank.remove(first));

        // Slot is reused, but the old handle must not resolve to it
        let second = bank.insert(constant_clip(0.25, 10, 44100));
        assert!(!bank.contains(first));
        assert!(bank.contains(second));

        // Operations on the stale handle are no-ops
        bank.play(first);
        assert!(!bank.is_playing(first));
        assert!(!bank.is_playing(second));
        assert!(!bank.remove(first));
    }

    #[test]
    fn test_play_produces_frames_then_stops() {
        let mut bank = SoundBank::new();
        let sound = bank.insert(constant_clip(0.5, 4, 44100));

        bank.play(sound);
        assert!(bank.is_playing(sound));

        for _ in 0..4 {
            let frame = bank.mix_frame(44100);
            assert!((frame.left - 0.5).abs() < 1e-6);
        }

        // Clip exhausted: voice stops and outputs silence
        assert!(!bank.is_playing(sound));
        let frame = bank.mix_frame(44100);
        assert_eq!(frame.left, 0.0);
    }

    #[test]
    fn test_pause_resume_keeps_position() {
        let mut bank = SoundBank::new();
        // Ramp 0, 1, 2, 3 in the left channel
        let clip = AudioClip::new(vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0], 44100);
        let sound = bank.insert(clip);

        bank.play(sound);
        bank.mix_frame(44100); // consume frame 0
        bank.pause(sound);
        assert_eq!(bank.state(sound), PlaybackState::Paused);

        // Paused voice contributes silence
        assert_eq!(bank.mix_frame(44100).left, 0.0);

        bank.resume(sound);
        let frame = bank.mix_frame(44100);
        assert!((frame.left - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_play_on_paused_resumes() {
        let mut bank = SoundBank::new();
        let clip = AudioClip::new(vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0], 44100);
        let sound = bank.insert(clip);

        bank.play(sound);
        bank.mix_frame(44100);
        bank.pause(sound);

        // Play on a paused sound resumes rather than restarting
        bank.play(sound);
        let frame = bank.mix_frame(44100);
        assert!((frame.left - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_play_on_playing_restarts() {
        let mut bank = SoundBank::new();
        let clip = AudioClip::new(vec![7.0, 0.0, 1.0, 0.0, 2.0, 0.0], 44100);
        let sound = bank.insert(clip);

        bank.play(sound);
        bank.mix_frame(44100);
        bank.mix_frame(44100);

        bank.play(sound);
        let frame = bank.mix_frame(44100);
        assert!((frame.left - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_mix_sums_concurrent_sounds() {
        let mut bank = SoundBank::new();
        let a = bank.insert(constant_clip(0.25, 8, 44100));
        let b = bank.insert(constant_clip(0.5, 8, 44100));

        bank.play(a);
        bank.play(b);

        let frame = bank.mix_frame(44100);
        assert!((frame.left - 0.75).abs() < 1e-6);
        assert!((frame.right - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_volume_scales_output() {
        let mut bank = SoundBank::new();
        let sound = bank.insert(constant_clip(0.8, 8, 44100));

        bank.set_volume(sound, 0.5);
        bank.play(sound);

        let frame = bank.mix_frame(44100);
        assert!((frame.left - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_volume_and_pitch_setters_clamp() {
        let mut bank = SoundBank::new();
        let sound = bank.insert(constant_clip(1.0, 8, 44100));

        bank.set_volume(sound, 2.0);
        bank.play(sound);
        let frame = bank.mix_frame(44100);
        assert!(frame.left <= 1.0);

        bank.set_volume(sound, -1.0);
        let frame = bank.mix_frame(44100);
        assert_eq!(frame.left, 0.0);

        // Zero pitch must not freeze the voice forever
        bank.set_pitch(sound, 0.0);
        bank.stop(sound);
        bank.play(sound);
        let before = bank.mix_frame(44100);
        let _ = before;
        assert!(bank.is_playing(sound));
    }

    #[test]
    fn test_pitch_double_finishes_in_half_the_frames() {
        let mut bank = SoundBank::new();
        let sound = bank.insert(constant_clip(0.5, 100, 44100));

        bank.set_pitch(sound, 2.0);
        bank.play(sound);

        let mut produced = 0;
        while bank.is_playing(sound) {
            bank.mix_frame(44100);
            produced += 1;
            assert!(produced < 200, "voice failed to finish");
        }

        assert_eq!(produced, 50);
    }

    #[test]
    fn test_rate_conversion_stretches_playback() {
        let mut bank = SoundBank::new();
        // 100 frames of 22.05 kHz audio played on a 44.1 kHz device
        let sound = bank.insert(constant_clip(0.5, 100, 22050));

        bank.play(sound);

        let mut produced = 0;
        while bank.is_playing(sound) {
            bank.mix_frame(44100);
            produced += 1;
            assert!(produced < 400, "voice failed to finish");
        }

        assert_eq!(produced, 200);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut bank = SoundBank::new();
        let clip = AudioClip::new(vec![9.0, 0.0, 1.0, 0.0], 44100);
        let sound = bank.insert(clip);

        bank.play(sound);
        bank.mix_frame(44100);
        bank.stop(sound);
        assert_eq!(bank.state(sound), PlaybackState::Stopped);

        bank.play(sound);
        let frame = bank.mix_frame(44100);
        assert!((frame.left - 9.0).abs() < 1e-6);
    }
}
