//! chime: a small game audio engine
//!
//! Decodes audio files with symphonia, mixes them in software, and plays
//! the result through cpal. Two kinds of playback are supported:
//!
//! - **Sounds**: short effects decoded fully into memory and triggered by
//!   [`Sound`] handles. Any number can play at once; each sound has its own
//!   volume and pitch.
//! - **Music**: long tracks streamed incrementally through a ring buffer,
//!   so a few minutes of audio never sits decoded in memory. The caller
//!   pumps [`AudioDevice::update_music_stream`] to keep the buffer filled.
//!
//! # Example
//!
//! ```no_run
//! use chime::{AudioConfig, AudioDevice};
//!
//! fn main() -> chime::Result<()> {
//!     let mut audio = AudioDevice::init(AudioConfig::default())?;
//!
//!     let jump = audio.load_sound("assets/jump.wav")?;
//!     audio.play_music_stream("assets/theme.ogg")?;
//!
//!     loop {
//!         audio.update_music_stream()?;
//!
//!         if player_jumped() {
//!             audio.play_sound(jump);
//!         }
//!         # break;
//!     }
//!     Ok(())
//! }
//! # fn player_jumped() -> bool { false }
//! ```

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod music;
pub mod resource;
pub mod sound;

pub use audio::types::{AudioClip, AudioFrame, PlaybackState, Wave};
pub use config::AudioConfig;
pub use engine::AudioDevice;
pub use error::{Error, Result};
pub use sound::Sound;
