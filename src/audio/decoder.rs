//! Audio decoding using symphonia
//!
//! Decodes compressed and container audio formats (MP3, FLAC, AAC, Vorbis,
//! WAV) to PCM samples. Two entry points: [`AudioDecoder`] for incremental
//! chunk decoding (music streaming) and [`decode_file`] for loading an
//! entire file into memory (sound effects).
//!
//! All output is interleaved stereo f32 at the source's native sample rate.
//! Mono sources are duplicated to both channels; sources with more than two
//! channels keep the front left/right pair.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder as SymphoniaDecoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Incremental audio decoder.
///
/// Wraps a symphonia format reader and codec, handing out one decoded
/// packet's worth of samples per call.
pub struct AudioDecoder {
    /// Symphonia format reader
    format: Box<dyn FormatReader>,

    /// Symphonia decoder
    decoder: Box<dyn SymphoniaDecoder>,

    /// Track being decoded
    track_id: u32,

    /// Native sample rate of the audio file
    sample_rate: u32,

    /// Number of channels in the audio file
    channels: usize,

    /// Total frames, when the container reports it
    total_frames: Option<u64>,
}

impl AudioDecoder {
    /// Open an audio file and prepare its default track for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // The extension helps the probe pick the right format reader
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to probe {}: {}", path.display(), e)))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode(format!("No audio track found in {}", path.display())))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        let total_frames = codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        debug!(
            "Opened {}: sample_rate={}, channels={}",
            path.display(),
            sample_rate,
            channels
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            total_frames,
        })
    }

    /// Native sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Native channel count
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Total frame count, if the container reports it
    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// Track duration in seconds, if known
    pub fn duration_seconds(&self) -> Option<f32> {
        self.total_frames
            .map(|frames| frames as f32 / self.sample_rate as f32)
    }

    /// Decode the next packet into interleaved stereo f32 samples.
    ///
    /// Returns `None` at end of stream. Corrupt packets are skipped with a
    /// warning rather than aborting the whole stream.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    return Ok(None);
                }
            };

            // Skip packets for other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut samples = Vec::new();
                    convert_to_stereo_f32(&decoded, &mut samples);
                    return Ok(Some(samples));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decode failed: {}", e)));
                }
            }
        }
    }
}

/// Decode an entire audio file to interleaved stereo f32 samples.
///
/// Returns the samples and the file's native sample rate.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let mut decoder = AudioDecoder::open(path)?;

    let mut samples = match decoder.total_frames() {
        Some(frames) => Vec::with_capacity(frames as usize * 2),
        None => Vec::new(),
    };

    while let Some(chunk) = decoder.next_chunk()? {
        samples.extend_from_slice(&chunk);
    }

    debug!(
        "Decoded {} frames at {} Hz",
        samples.len() / 2,
        decoder.sample_rate()
    );

    Ok((samples, decoder.sample_rate()))
}

/// Convert a decoded symphonia buffer to interleaved stereo f32.
///
/// Normalizes every source sample format to the [-1.0, 1.0] range.
fn convert_to_stereo_f32(decoded: &AudioBufferRef, output: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_stereo(buf, output, |s| s),
        AudioBufferRef::F64(buf) => extend_stereo(buf, output, |s| s as f32),
        AudioBufferRef::S32(buf) => extend_stereo(buf, output, |s| s as f32 / i32::MAX as f32),
        AudioBufferRef::S16(buf) => extend_stereo(buf, output, |s| s as f32 / i16::MAX as f32),
        AudioBufferRef::S8(buf) => extend_stereo(buf, output, |s| s as f32 / i8::MAX as f32),
        AudioBufferRef::U32(buf) => {
            extend_stereo(buf, output, |s| (s as i64 - 2_147_483_648) as f32 / 2_147_483_648.0)
        }
        AudioBufferRef::U16(buf) => {
            extend_stereo(buf, output, |s| (s as i32 - 32768) as f32 / 32768.0)
        }
        AudioBufferRef::U8(buf) => extend_stereo(buf, output, |s| (s as i32 - 128) as f32 / 128.0),
        AudioBufferRef::S24(buf) => {
            extend_stereo(buf, output, |s| s.inner() as f32 / 8_388_608.0)
        }
        AudioBufferRef::U24(buf) => {
            extend_stereo(buf, output, |s| (s.inner() as i32 - 8_388_608) as f32 / 8_388_608.0)
        }
    }
}

/// Interleave a planar buffer into stereo, converting samples with `conv`.
fn extend_stereo<S, F>(buf: &AudioBuffer<S>, output: &mut Vec<f32>, conv: F)
where
    S: Sample,
    F: Fn(S) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    output.reserve(frames * 2);

    if channels == 1 {
        let mono = buf.chan(0);
        for frame_idx in 0..frames {
            let sample = conv(mono[frame_idx]);
            output.push(sample);
            output.push(sample);
        }
    } else {
        let left = buf.chan(0);
        let right = buf.chan(1);
        for frame_idx in 0..frames {
            output.push(conv(left[frame_idx]));
            output.push(conv(right[frame_idx]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_nonexistent_file() {
        let result = AudioDecoder::open("/nonexistent/file.mp3");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_wav_fixture() {
        // 0.1 s of 440 Hz mono at 22.05 kHz, written with hound
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..2205 {
            let t = i as f32 / 22050.0;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, rate) = decode_file(&path).unwrap();
        assert_eq!(rate, 22050);
        // Mono duplicated to stereo
        assert_eq!(samples.len(), 2205 * 2);
        assert_eq!(samples[0], samples[1]);
    }

    #[test]
    fn test_chunked_decode_matches_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..1000 {
            writer.write_sample(((i * 37) % 1000 - 500) as i16).unwrap();
            writer.write_sample(((i * 53) % 1000 - 500) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let (whole, _) = decode_file(&path).unwrap();

        let mut decoder = AudioDecoder::open(&path).unwrap();
        let mut chunked = Vec::new();
        while let Some(chunk) = decoder.next_chunk().unwrap() {
            chunked.extend_from_slice(&chunk);
        }

        assert_eq!(whole, chunked);
        assert_eq!(decoder.channels(), 2);
    }
}
