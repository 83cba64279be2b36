//! Format sniffing: plain container or compressed envelope.
//!
//! There is no magic number. The first little-endian `u32` of a plain
//! container is its total size. When that value disagrees with the real
//! file length, the same field is read as a compression header instead:
//!
//! ```text
//! bits 0..8   pass count (masked with PASSES_MASK; 1 or 2)
//! bits 8..32  decompressed size
//! ```

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::error::{ResourceError, Result, StreamContext};

/// Pass count bits of the compression header.
pub const PASSES_MASK: u32 = 0x7F;
/// Largest compressed file the decompressor accepts.
pub const MAX_COMPRESSED_SIZE: u64 = 0xFF_FFFF;
pub const MIN_PASSES: u8 = 1;
pub const MAX_PASSES: u8 = 2;

/// What the leading size field says about the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Uncompressed container; `size` equals the file length.
    Plain { size: u32 },
    /// Compressed; decompress with `passes` to get `decompressed_size` bytes.
    Compressed { passes: u8, decompressed_size: u32 },
}

impl Envelope {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Envelope::Compressed { .. })
    }
}

/// The size field reinterpreted as a compression descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionHeader {
    pub passes:            u8,
    pub decompressed_size: u32,
}

impl CompressionHeader {
    pub fn unpack(field: u32) -> Self {
        Self {
            passes:            (field & PASSES_MASK) as u8,
            decompressed_size: field >> 8,
        }
    }

    /// Inverse of [`unpack`](Self::unpack). `decompressed_size` must fit 24 bits.
    pub fn pack(&self) -> u32 {
        (self.decompressed_size << 8) | (self.passes as u32 & PASSES_MASK)
    }
}

/// Decide how to treat a file whose first field is `reported` and whose
/// real length is `file_len`.
pub fn sniff(reported: u32, file_len: u64) -> Result<Envelope> {
    if reported as u64 == file_len {
        debug!(size = reported, "plain container, size confirmed");
        return Ok(Envelope::Plain { size: reported });
    }

    let header = CompressionHeader::unpack(reported);
    let valid = (MIN_PASSES..=MAX_PASSES).contains(&header.passes)
        && file_len <= MAX_COMPRESSED_SIZE
        && file_len < header.decompressed_size as u64;

    if !valid {
        return Err(ResourceError::InvalidCompressionHeader {
            reported,
            actual: file_len,
        });
    }

    debug!(
        passes = header.passes,
        decompressed_size = header.decompressed_size,
        compressed_size = file_len,
        "compressed envelope"
    );
    Ok(Envelope::Compressed {
        passes:            header.passes,
        decompressed_size: header.decompressed_size,
    })
}

/// Sniff a seekable stream. Leaves the stream positioned at offset 0.
pub fn detect<R: Read + Seek>(reader: &mut R) -> Result<(Envelope, u64)> {
    let file_len = reader.seek(SeekFrom::End(0)).reading("header")?;
    reader.seek(SeekFrom::Start(0)).reading("header")?;
    let reported = reader.read_u32::<LittleEndian>().reading("header")?;
    reader.seek(SeekFrom::Start(0)).reading("header")?;
    Ok((sniff(reported, file_len)?, file_len))
}
