//! Engine configuration
//!
//! Covers the bootstrap settings the engine needs before it can open a
//! device: which output to use, the device buffer size, and how much music
//! is buffered between `update_music_stream` calls.
//!
//! All fields have built-in defaults, so `AudioConfig::default()` is enough
//! for typical use. A TOML file with the same field names can override them.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Audio engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Output device name (None = system default device)
    #[serde(default)]
    pub device: Option<String>,

    /// Device buffer size in frames (None = device default)
    #[serde(default)]
    pub buffer_size: Option<u32>,

    /// Music ring buffer capacity in frames.
    ///
    /// About 0.37 s at 44.1 kHz by default. Larger values tolerate a slower
    /// `update_music_stream` cadence at the cost of latency on stop/pause.
    #[serde(default = "default_stream_buffer_frames")]
    pub stream_buffer_frames: usize,

    /// Frames decoded per refill chunk while streaming music.
    #[serde(default = "default_stream_chunk_frames")]
    pub stream_chunk_frames: usize,
}

fn default_stream_buffer_frames() -> usize {
    16384
}

fn default_stream_chunk_frames() -> usize {
    4096
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            buffer_size: None,
            stream_buffer_frames: default_stream_buffer_frames(),
            stream_chunk_frames: default_stream_chunk_frames(),
        }
    }
}

impl AudioConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields fall back to the built-in defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;

        let config: AudioConfig = toml::from_str(&text).map_err(|e| {
            Error::Config(format!(
                "Failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the streaming tuning values are usable.
    ///
    /// The ring must hold at least two chunks, otherwise a single refill can
    /// never complete and the stream starves immediately.
    pub fn validate(&self) -> Result<()> {
        if self.stream_chunk_frames == 0 {
            return Err(Error::Config(
                "stream_chunk_frames must be non-zero".to_string(),
            ));
        }

        if self.stream_buffer_frames < self.stream_chunk_frames * 2 {
            return Err(Error::Config(format!(
                "stream_buffer_frames ({}) must be at least twice stream_chunk_frames ({})",
                self.stream_buffer_frames, self.stream_chunk_frames
            )));
        }

        Ok(())
    }
}
