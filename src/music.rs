//! Streaming music
//!
//! Music is decoded incrementally instead of being loaded whole. The stream
//! owns the decoder, the resampler, and the producer half of the ring
//! buffer; the matching [`MusicChannel`] consumer half is installed in the
//! mixer. The caller must pump [`MusicStream::update`] regularly (once per
//! frame in a game loop is plenty) to keep the ring from running dry.

use crate::audio::decoder::AudioDecoder;
use crate::audio::resampler::StreamResampler;
use crate::error::Result;
use crate::mixer::MusicChannel;
use ringbuf::traits::{Observer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decode side of a streaming music track.
pub struct MusicStream {
    /// Source path, kept for loop restarts
    path: PathBuf,

    decoder: AudioDecoder,
    resampler: StreamResampler,

    /// Producer half of the ring shared with the mixer's music channel
    producer: HeapProd<f32>,

    /// Resampled samples that did not fit in the ring yet
    leftover: Vec<f32>,

    device_rate: u32,
    chunk_frames: usize,

    looping: bool,

    /// Decoder reached end of stream and the resampler tail was flushed
    finished: bool,
}

impl MusicStream {
    /// Open a music file for streaming.
    ///
    /// Returns the stream and the consumer channel to hand to the mixer.
    /// `buffer_frames` sizes the ring; `chunk_frames` is the refill
    /// granularity (both in device-rate stereo frames).
    pub fn open<P: AsRef<Path>>(
        path: P,
        device_rate: u32,
        buffer_frames: usize,
        chunk_frames: usize,
    ) -> Result<(MusicStream, MusicChannel)> {
        let path = path.as_ref().to_path_buf();
        let decoder = AudioDecoder::open(&path)?;

        let resampler = StreamResampler::new(decoder.sample_rate(), device_rate, chunk_frames)?;

        let ring = HeapRb::<f32>::new(buffer_frames * 2);
        let (producer, consumer) = ring.split();

        info!(
            "Opened music stream {}: {} Hz, {:.1} s buffer",
            path.display(),
            decoder.sample_rate(),
            buffer_frames as f32 / device_rate as f32
        );

        let stream = MusicStream {
            path,
            decoder,
            resampler,
            producer,
            leftover: Vec::new(),
            device_rate,
            chunk_frames,
            looping: false,
            finished: false,
        };

        Ok((stream, MusicChannel::new(consumer)))
    }

    /// Track length in seconds, if the container reports it.
    pub fn duration_seconds(&self) -> Option<f32> {
        self.decoder.duration_seconds()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable seamless looping at end of stream.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Whether the source is fully decoded and everything produced has been
    /// pushed into the ring. The mixer may still be draining buffered audio.
    pub fn exhausted(&self) -> bool {
        self.finished && self.leftover.is_empty()
    }

    /// Refill the ring buffer from the decoder.
    ///
    /// Decodes and resamples until the ring is full or the source ends.
    /// With looping enabled, end of stream restarts decoding from the top,
    /// so the loop seam passes through the ring without a gap.
    pub fn update(&mut self) -> Result<()> {
        loop {
            if !self.drain_leftover() {
                return Ok(());
            }

            if self.finished {
                if !self.looping {
                    return Ok(());
                }
                self.rewind()?;
            }

            // Stop decoding ahead once less than a chunk of space remains
            if self.producer.vacant_len() < self.chunk_frames * 2 {
                return Ok(());
            }

            match self.decoder.next_chunk()? {
                Some(chunk) => {
                    let resampled = self.resampler.process(&chunk)?;
                    self.leftover.extend_from_slice(&resampled);
                }
                None => {
                    let tail = self.resampler.flush()?;
                    self.leftover.extend_from_slice(&tail);
                    self.finished = true;
                    debug!("Music stream {} reached end of file", self.path.display());
                }
            }
        }
    }

    /// Restart decoding from the beginning of the file for the loop seam.
    fn rewind(&mut self) -> Result<()> {
        self.decoder = AudioDecoder::open(&self.path)?;
        self.resampler =
            StreamResampler::new(self.decoder.sample_rate(), self.device_rate, self.chunk_frames)?;
        self.finished = false;
        Ok(())
    }

    /// Push pending samples into the ring. Returns true once the leftover
    /// buffer is empty, false if the ring filled up first.
    fn drain_leftover(&mut self) -> bool {
        if self.leftover.is_empty() {
            return true;
        }

        let pushed = self.producer.push_slice(&self.leftover);
        self.leftover.drain(..pushed);
        self.leftover.is_empty()
    }
}
