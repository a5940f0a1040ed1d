//! rRES resource container parsing
//!
//! A .rres file bundles game assets behind numeric ids. Layout (all
//! little-endian):
//!
//! ```text
//! file header:  "rRES" magic, version u8, reserved u8, entry count u16
//! entry header: id u16, type u8, compression u8, size u32, source size u32
//! ```
//!
//! Each entry is followed by a type-specific parameter block and `size`
//! bytes of payload. Sound entries (type 1) carry a 6-byte parameter block:
//! sample rate u16, bits per sample u16, channels u8, one reserved byte.
//!
//! Only uncompressed sound entries are extracted; compressed entries are
//! reported as errors, and entries of other types are skipped over.

use crate::audio::types::Wave;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

const RES_MAGIC: &[u8; 4] = b"rRES";

/// Resource entry types that can appear in a container.
const RES_TYPE_IMAGE: u8 = 0;
const RES_TYPE_SOUND: u8 = 1;
const RES_TYPE_MODEL: u8 = 2;
const RES_TYPE_TEXT: u8 = 3;
const RES_TYPE_RAW: u8 = 4;

/// Parameter block size per entry type, skipped when scanning past an entry.
fn param_block_size(entry_type: u8) -> usize {
    match entry_type {
        RES_TYPE_IMAGE => 6,
        RES_TYPE_SOUND => 6,
        RES_TYPE_MODEL => 5,
        RES_TYPE_TEXT | RES_TYPE_RAW => 0,
        _ => 0,
    }
}

/// Sequential little-endian reader over the container bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::Resource(format!(
                "truncated container: needed {} bytes at offset {}, {} remain",
                count,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Extract a sound resource from a .rres container file.
pub fn load_wave_from_file<P: AsRef<Path>>(path: P, resource_id: u16) -> Result<Wave> {
    let data = std::fs::read(path.as_ref())?;
    load_wave(&data, resource_id)
}

/// Extract a sound resource from container bytes.
pub fn load_wave(data: &[u8], resource_id: u16) -> Result<Wave> {
    let mut reader = Reader::new(data);

    let magic = reader.take(4)?;
    if magic != RES_MAGIC {
        return Err(Error::Resource("not an rRES container".to_string()));
    }

    let version = reader.read_u8()?;
    let _reserved = reader.read_u8()?;
    let count = reader.read_u16()?;

    debug!("rRES container: version {}, {} entries", version, count);

    for _ in 0..count {
        let id = reader.read_u16()?;
        let entry_type = reader.read_u8()?;
        let compression = reader.read_u8()?;
        let size = reader.read_u32()? as usize;
        let _source_size = reader.read_u32()?;

        if id != resource_id {
            reader.skip(param_block_size(entry_type) + size)?;
            continue;
        }

        if entry_type != RES_TYPE_SOUND {
            return Err(Error::Resource(format!(
                "resource {} has type {} (expected sound)",
                resource_id, entry_type
            )));
        }

        if compression != 0 {
            return Err(Error::Resource(format!(
                "resource {} is compressed (method {}), which is not supported",
                resource_id, compression
            )));
        }

        let sample_rate = reader.read_u16()? as u32;
        let bits_per_sample = reader.read_u16()?;
        let channels = reader.read_u8()? as u16;
        let _reserved = reader.read_u8()?;

        let payload = reader.take(size)?;

        let wave = Wave {
            data: payload.to_vec(),
            sample_rate,
            bits_per_sample,
            channels,
        };
        wave.validate().map_err(|e| {
            Error::Resource(format!("resource {} has invalid sound data: {}", resource_id, e))
        })?;

        debug!(
            "Loaded sound resource {}: {} Hz, {} bit, {} channel(s), {} bytes",
            resource_id, sample_rate, bits_per_sample, channels, size
        );

        return Ok(wave);
    }

    Err(Error::Resource(format!(
        "resource {} not found in container",
        resource_id
    )))
}
