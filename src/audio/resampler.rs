//! Streaming resampler using rubato
//!
//! Converts decoded music to the device sample rate before it enters the
//! ring buffer. Sound effects never come through here; their rate conversion
//! happens in the mixer's per-voice cursor.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Stateful stereo resampler for the music path.
///
/// rubato wants fixed-size input chunks, while the decoder produces whatever
/// each packet holds. Input accumulates in `pending` until a full chunk is
/// available; [`flush`](StreamResampler::flush) drains the tail at end of
/// stream with a partial process call.
pub struct StreamResampler {
    /// None when input and output rates match (passthrough)
    inner: Option<FastFixedIn<f32>>,

    /// Frames per rubato process call
    chunk_frames: usize,

    /// Interleaved input awaiting a full chunk
    pending: Vec<f32>,
}

impl StreamResampler {
    /// Create a resampler from `input_rate` to `output_rate`.
    pub fn new(input_rate: u32, output_rate: u32, chunk_frames: usize) -> Result<Self> {
        let inner = if input_rate == output_rate {
            None
        } else {
            debug!("Resampling music from {}Hz to {}Hz", input_rate, output_rate);

            let resampler = FastFixedIn::<f32>::new(
                output_rate as f64 / input_rate as f64,
                1.0,
                PolynomialDegree::Septic,
                chunk_frames,
                2,
            )
            .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

            Some(resampler)
        };

        Ok(Self {
            inner,
            chunk_frames,
            pending: Vec::new(),
        })
    }

    /// Feed interleaved stereo samples; returns whatever complete chunks produce.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let resampler = match self.inner.as_mut() {
            Some(r) => r,
            None => return Ok(input.to_vec()),
        };

        self.pending.extend_from_slice(input);

        let mut output = Vec::new();
        let chunk_samples = self.chunk_frames * 2;

        while self.pending.len() >= chunk_samples {
            let chunk: Vec<f32> = self.pending.drain(..chunk_samples).collect();
            let planar = deinterleave(&chunk);

            let resampled = resampler
                .process(&planar, None)
                .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

            interleave_into(&resampled, &mut output);
        }

        Ok(output)
    }

    /// Drain buffered input at end of stream.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let resampler = match self.inner.as_mut() {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let planar = deinterleave(&self.pending);
        self.pending.clear();

        let resampled = resampler
            .process_partial(Some(&planar), None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        let mut output = Vec::new();
        interleave_into(&resampled, &mut output);
        Ok(output)
    }
}

/// Convert interleaved stereo samples to planar format.
///
/// Input:  [L, R, L, R, ...]
/// Output: [[L, L, ...], [R, R, ...]]
fn deinterleave(samples: &[f32]) -> [Vec<f32>; 2] {
    let frames = samples.len() / 2;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);

    for frame in samples.chunks_exact(2) {
        left.push(frame[0]);
        right.push(frame[1]);
    }

    [left, right]
}

/// Append planar stereo samples to an interleaved output vector.
fn interleave_into(planar: &[Vec<f32>], output: &mut Vec<f32>) {
    if planar.len() < 2 {
        return;
    }

    let frames = planar[0].len().min(planar[1].len());
    output.reserve(frames * 2);

    for frame_idx in 0..frames {
        output.push(planar[0][frame_idx]);
        output.push(planar[1][frame_idx]);
    }
}
