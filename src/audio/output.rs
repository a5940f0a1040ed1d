//! Audio output using cpal
//!
//! Opens the output device and runs the playback stream. The stream
//! callback pulls one [`AudioFrame`] per output frame from the mixer and
//! applies master volume; everything upstream of that callback is the
//! mixer's business.

use crate::audio::types::AudioFrame;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Preferred output rate when the device supports it.
pub const PREFERRED_SAMPLE_RATE: u32 = 44100;

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    volume: Arc<Mutex<f32>>,
    /// Set by the stream error callback; surfaces through `has_error`
    error_flag: Arc<AtomicBool>,
}

impl AudioOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::Device(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    /// - `buffer_size`: Optional buffer size in frames (None = device default)
    ///
    /// # Fallback Behavior
    /// If the requested device is not found, the default device is used
    /// instead.
    pub fn new(device_name: Option<String>, buffer_size: Option<u32>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name.as_ref() {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::Device(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!(
                        "Requested device '{}' not found, falling back to default device",
                        name
                    );

                    host.default_output_device().ok_or_else(|| {
                        Error::Device(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::Device("No default output device found".to_string()))?
        };

        let (mut config, sample_format) = Self::get_best_config(&device)?;

        if let Some(size) = buffer_size {
            config.buffer_size = cpal::BufferSize::Fixed(size);
            debug!("Using requested buffer size: {} frames", size);
        }

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}, buffer_size={:?}",
            config.sample_rate.0, config.channels, sample_format, config.buffer_size
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            volume: Arc::new(Mutex::new(1.0)),
            error_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the best supported configuration for playback.
    ///
    /// Prefers 44.1kHz, stereo, f32 samples (matching the mixer's internal
    /// format); falls back to the device default otherwise.
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::Device(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs.find(|config| {
            config.channels() == 2
                && config.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
                && config.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config
                .with_sample_rate(cpal::SampleRate(PREFERRED_SAMPLE_RATE))
                .config();
            return Ok((config, sample_format));
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::Device(format!("Failed to get default config: {}", e)))?;

        let sample_format = supported_config.sample_format();
        let config = supported_config.config();
        Ok((config, sample_format))
    }

    /// Start audio playback with a frame callback.
    ///
    /// The callback is invoked on the audio thread once per output frame and
    /// must not block; return [`AudioFrame::zero`] for silence. Master
    /// volume and clipping protection are applied here.
    pub fn start<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut() -> AudioFrame + Send + 'static,
    {
        info!("Starting audio stream");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32, F>(callback)?,
            SampleFormat::I16 => self.build_stream::<i16, F>(callback)?,
            SampleFormat::U16 => self.build_stream::<u16, F>(callback)?,
            sample_format => {
                return Err(Error::Device(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::Device(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);

        info!("Audio stream started successfully");
        Ok(())
    }

    /// Build the output stream for a concrete sample type.
    fn build_stream<T, F>(&self, mut callback: F) -> Result<Stream>
    where
        T: Sample + SizedSample + FromSample<f32>,
        F: FnMut() -> AudioFrame + Send + 'static,
    {
        let channels = self.config.channels as usize;
        let volume = Arc::clone(&self.volume);
        let error_flag = Arc::clone(&self.error_flag);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let current_volume = *volume.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let mut audio_frame = callback();
                        audio_frame.apply_volume(current_volume);
                        audio_frame.clamp();

                        frame[0] = T::from_sample(audio_frame.left);
                        if channels > 1 {
                            frame[1] = T::from_sample(audio_frame.right);
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = T::from_sample(0.0f32);
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_flag.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::Device(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    /// Stop audio playback and drop the stream.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::Device(format!("Failed to pause stream: {}", e)))?;
            drop(stream);
        }

        Ok(())
    }

    /// Set master volume (0.0 = silent, 1.0 = full). Out-of-range values clamp.
    pub fn set_volume(&self, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        *self.volume.lock().unwrap() = clamped;
        debug!("Master volume set to {:.2}", clamped);
    }

    /// Current master volume.
    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    /// Device name.
    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Output channel count.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Whether the stream error callback has fired.
    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        // Ensure stream is stopped on drop
        let _ = self.stop();
    }
}
