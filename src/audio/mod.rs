//! Audio pipeline building blocks: decoding, resampling, device output,
//! and the shared data types they exchange.

pub mod decoder;
pub mod output;
pub mod resampler;
pub mod types;
