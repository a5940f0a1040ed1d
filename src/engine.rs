//! Audio engine facade
//!
//! [`AudioDevice`] ties the pieces together: it owns the output stream, the
//! shared mixer, and the optional music stream, and exposes the whole
//! public playback API. One device may exist per process; a second `init`
//! while one is alive fails rather than fighting over the hardware.

use crate::audio::output::AudioOutput;
use crate::audio::types::{PlaybackState, Wave};
use crate::config::AudioConfig;
use crate::error::{Error, Result};
use crate::mixer::Mixer;
use crate::music::MusicStream;
use crate::resource;
use crate::sound::Sound;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Process-wide flag: set while an [`AudioDevice`] is alive.
static DEVICE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Handle to the initialized audio engine.
///
/// Dropping the device stops playback, unloads every sound, and releases
/// the output stream.
pub struct AudioDevice {
    output: AudioOutput,

    /// Shared with the output callback
    mixer: Arc<Mutex<Mixer>>,

    /// Decode side of the current music track, if one is open
    music: Option<MusicStream>,

    /// Loop setting applied to the current and future music streams
    music_looping: bool,

    config: AudioConfig,
}

impl AudioDevice {
    /// Initialize the audio device and start the output stream.
    ///
    /// Fails if another `AudioDevice` is alive in this process, if the
    /// configuration is invalid, or if the output device cannot be opened.
    pub fn init(config: AudioConfig) -> Result<AudioDevice> {
        config.validate()?;

        if DEVICE_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::InvalidState(
                "audio device is already initialized".to_string(),
            ));
        }

        match Self::open(config) {
            Ok(device) => Ok(device),
            Err(e) => {
                DEVICE_ACTIVE.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn open(config: AudioConfig) -> Result<AudioDevice> {
        let mut output = AudioOutput::new(config.device.clone(), config.buffer_size)?;

        let mixer = Arc::new(Mutex::new(Mixer::new(output.sample_rate())));

        let callback_mixer = Arc::clone(&mixer);
        output.start(move || callback_mixer.lock().unwrap().next_frame())?;

        info!(
            "Audio device initialized: {} at {} Hz",
            output.device_name(),
            output.sample_rate()
        );

        Ok(AudioDevice {
            output,
            mixer,
            music: None,
            music_looping: false,
            config,
        })
    }

    /// Close the device explicitly. Equivalent to dropping it.
    pub fn close(self) {
        drop(self);
    }

    /// Whether an audio device is currently initialized in this process.
    pub fn is_ready() -> bool {
        DEVICE_ACTIVE.load(Ordering::SeqCst)
    }

    /// List available output device names.
    pub fn list_devices() -> Result<Vec<String>> {
        AudioOutput::list_devices()
    }

    /// Name of the opened output device.
    pub fn device_name(&self) -> String {
        self.output.device_name()
    }

    /// Output sample rate everything is mixed at.
    pub fn sample_rate(&self) -> u32 {
        self.output.sample_rate()
    }

    /// Set master volume (0.0 to 1.0), applied after mixing.
    pub fn set_master_volume(&self, volume: f32) {
        self.output.set_volume(volume);
    }

    pub fn master_volume(&self) -> f32 {
        self.output.volume()
    }

    // --- Sounds ---

    /// Load a sound effect from an audio file, fully decoded into memory.
    pub fn load_sound<P: AsRef<Path>>(&mut self, path: P) -> Result<Sound> {
        let wave = Wave::load(path)?;
        self.load_sound_from_wave(&wave)
    }

    /// Load a sound effect from raw wave data.
    pub fn load_sound_from_wave(&mut self, wave: &Wave) -> Result<Sound> {
        let clip = wave.to_clip()?;
        Ok(self.mixer.lock().unwrap().bank_mut().insert(clip))
    }

    /// Load a sound effect from an rRES resource container by id.
    pub fn load_sound_from_resource<P: AsRef<Path>>(
        &mut self,
        path: P,
        resource_id: u16,
    ) -> Result<Sound> {
        let wave = resource::load_wave_from_file(path, resource_id)?;
        self.load_sound_from_wave(&wave)
    }

    /// Unload a sound, freeing its samples. Safe on a stale handle.
    pub fn unload_sound(&mut self, sound: Sound) -> bool {
        self.mixer.lock().unwrap().bank_mut().remove(sound)
    }

    /// Whether the handle refers to a loaded sound.
    pub fn is_sound_valid(&self, sound: Sound) -> bool {
        self.mixer.lock().unwrap().bank().contains(sound)
    }

    /// Number of currently loaded sounds.
    pub fn sound_count(&self) -> usize {
        self.mixer.lock().unwrap().bank().len()
    }

    /// Play a sound. Restarts from the beginning if already playing;
    /// resumes if paused.
    pub fn play_sound(&mut self, sound: Sound) {
        self.mixer.lock().unwrap().bank_mut().play(sound);
    }

    /// Pause a playing sound, keeping its position.
    pub fn pause_sound(&mut self, sound: Sound) {
        self.mixer.lock().unwrap().bank_mut().pause(sound);
    }

    /// Resume a paused sound.
    pub fn resume_sound(&mut self, sound: Sound) {
        self.mixer.lock().unwrap().bank_mut().resume(sound);
    }

    /// Stop a sound and rewind it to the beginning.
    pub fn stop_sound(&mut self, sound: Sound) {
        self.mixer.lock().unwrap().bank_mut().stop(sound);
    }

    pub fn is_sound_playing(&self, sound: Sound) -> bool {
        self.mixer.lock().unwrap().bank().is_playing(sound)
    }

    pub fn sound_state(&self, sound: Sound) -> PlaybackState {
        self.mixer.lock().unwrap().bank().state(sound)
    }

    /// Set a sound's volume, clamped to 0.0 ..= 1.0 (1.0 = as decoded).
    pub fn set_sound_volume(&mut self, sound: Sound, volume: f32) {
        self.mixer.lock().unwrap().bank_mut().set_volume(sound, volume);
    }

    /// Set a sound's pitch multiplier (1.0 = native speed and pitch).
    pub fn set_sound_pitch(&mut self, sound: Sound, pitch: f32) {
        self.mixer.lock().unwrap().bank_mut().set_pitch(sound, pitch);
    }

    // --- Music streaming ---

    /// Open a music file and start streaming it.
    ///
    /// Replaces any music already playing. The ring buffer is prefilled
    /// before playback starts, so audio begins on the next callback.
    pub fn play_music_stream<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        // Tear down the previous track first
        self.stop_music_stream();

        let (mut stream, mut channel) = MusicStream::open(
            path,
            self.output.sample_rate(),
            self.config.stream_buffer_frames,
            self.config.stream_chunk_frames,
        )?;

        stream.set_looping(self.music_looping);
        stream.update()?;

        channel.set_state(PlaybackState::Playing);
        self.mixer.lock().unwrap().set_music(channel);
        self.music = Some(stream);

        Ok(())
    }

    /// Keep the music ring buffer filled. Call this regularly (for example
    /// once per game-loop frame); a starved ring plays silence until the
    /// next call catches up.
    ///
    /// Also retires the stream once a non-looping track has fully played
    /// out, flipping `is_music_playing` to false.
    pub fn update_music_stream(&mut self) -> Result<()> {
        let stream = match self.music.as_mut() {
            Some(stream) => stream,
            None => return Ok(()),
        };

        stream.update()?;

        if stream.exhausted() {
            let mut mixer = self.mixer.lock().unwrap();
            if let Some(channel) = mixer.music_mut() {
                if channel.state() == PlaybackState::Playing && channel.buffered_samples() < 2 {
                    info!("Music stream finished");
                    channel.set_state(PlaybackState::Stopped);
                }
            }
        }

        Ok(())
    }

    /// Stop music playback and close the stream.
    ///
    /// Releases the decoder, the resampler, and the ring buffer; there is
    /// no resume from stop. Start the track again with
    /// [`play_music_stream`](AudioDevice::play_music_stream).
    pub fn stop_music_stream(&mut self) {
        if self.music.take().is_some() {
            info!("Music stream closed");
        }
        self.mixer.lock().unwrap().take_music();
    }

    /// Pause music, keeping buffered audio and position.
    pub fn pause_music_stream(&mut self) {
        let mut mixer = self.mixer.lock().unwrap();
        if let Some(channel) = mixer.music_mut() {
            if channel.state() == PlaybackState::Playing {
                channel.set_state(PlaybackState::Paused);
            }
        }
    }

    /// Resume paused music.
    pub fn resume_music_stream(&mut self) {
        let mut mixer = self.mixer.lock().unwrap();
        if let Some(channel) = mixer.music_mut() {
            if channel.state() == PlaybackState::Paused {
                channel.set_state(PlaybackState::Playing);
            }
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.mixer
            .lock()
            .unwrap()
            .music()
            .map(|c| c.state() == PlaybackState::Playing)
            .unwrap_or(false)
    }

    /// Set music volume (independent of sound and master volume).
    pub fn set_music_volume(&mut self, volume: f32) {
        if let Some(channel) = self.mixer.lock().unwrap().music_mut() {
            channel.set_volume(volume);
        }
    }

    /// Enable or disable looping for the current and future music streams.
    pub fn set_music_loop(&mut self, looping: bool) {
        self.music_looping = looping;
        if let Some(stream) = self.music.as_mut() {
            stream.set_looping(looping);
        }
    }

    /// Length of the current music track in seconds, if known.
    pub fn music_time_length(&self) -> Option<f32> {
        self.music.as_ref().and_then(|s| s.duration_seconds())
    }

    /// Seconds of the current track played so far.
    ///
    /// Counts audio actually consumed by the mixer, so it lags slightly
    /// behind decode progress. Wraps around on looping tracks.
    pub fn music_time_played(&self) -> f32 {
        let consumed = match self.mixer.lock().unwrap().music() {
            Some(channel) => channel.frames_consumed(),
            None => return 0.0,
        };

        let seconds = consumed as f32 / self.output.sample_rate() as f32;

        match self.music_time_length() {
            Some(length) if length > 0.0 => {
                if self.music_looping {
                    seconds % length
                } else {
                    seconds.min(length)
                }
            }
            _ => seconds,
        }
    }

    /// Music ring buffer fill level, 0.0 to 1.0. A level near zero means
    /// `update_music_stream` is not being called often enough.
    pub fn music_buffer_level(&self) -> f32 {
        self.mixer
            .lock()
            .unwrap()
            .music()
            .map(|c| c.fill_level())
            .unwrap_or(0.0)
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        info!("Closing audio device");

        // Stop the callback before tearing down mixer state
        if let Err(e) = self.output.stop() {
            warn!("Error stopping audio output: {}", e);
        }

        self.music = None;
        {
            let mut mixer = self.mixer.lock().unwrap();
            mixer.take_music();
        }

        DEVICE_ACTIVE.store(false, Ordering::SeqCst);
    }
}
