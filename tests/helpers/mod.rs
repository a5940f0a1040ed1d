//! Shared helpers for integration tests: WAV fixture generation.

#![allow(dead_code)]

use std::path::PathBuf;

/// Write a 16-bit sine wave WAV and return its path.
pub fn write_sine_wav(
    dir: &tempfile::TempDir,
    name: &str,
    frames: u32,
    sample_rate: u32,
    channels: u16,
) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
        let value = (sample * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();

    path
}

/// Write a stereo WAV whose left channel counts up by frame index, so
/// consumed audio reveals its position. The right channel stays zero.
pub fn write_ramp_wav(
    dir: &tempfile::TempDir,
    name: &str,
    frames: u32,
    sample_rate: u32,
) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        writer.write_sample((i % 1000) as i16).unwrap();
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    path
}
