//! Table-of-contents entries and the 4-byte resource identifier.
//!
//! On disk the table of contents is stored as all identifiers first, then
//! all offsets:
//!
//! ```text
//! [ id 0 (4 B) | id 1 (4 B) | ... | off 0 (LE u32) | off 1 (LE u32) | ... ]
//! ```
//!
//! Offsets are relative to the base offset, the position immediately after
//! the last TOC offset.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Bytes per identifier.
pub const ID_LEN: usize = 4;
/// Bytes per TOC entry (identifier + offset).
pub const TOC_ENTRY_SIZE: usize = ID_LEN + 4;
/// Size field + record count.
pub const HEADER_SIZE: usize = 6;

// ── ResourceId ────────────────────────────────────────────────────────────────

/// A record identifier, exactly four bytes, NUL-padded when shorter.
///
/// Bytes after the first NUL are never significant: every constructor,
/// including [`ResourceId::read`], zeroes them. Two on-disk ids that agree
/// up to their first NUL are the same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId([u8; ID_LEN]);

impl ResourceId {
    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self::from_slice(&bytes)
    }

    /// Canonicalize a name: keep the first four bytes, pad with NUL.
    pub fn new(name: &str) -> Self {
        Self::from_slice(name.as_bytes())
    }

    fn from_slice(src: &[u8]) -> Self {
        let mut bytes = [0u8; ID_LEN];
        for (dst, &b) in bytes.iter_mut().zip(src.iter().take_while(|&&b| b != 0)) {
            *dst = b;
        }
        Self(bytes)
    }

    /// Parse the form [`Display`](fmt::Display) produces: `\\` for a
    /// backslash, `\xNN` for any other byte outside printable ASCII.
    /// Unescaped non-ASCII characters contribute their UTF-8 bytes.
    pub fn parse_escaped(s: &str) -> Result<Self, String> {
        let bad_escape = || format!("bad escape in resource id \"{s}\"");
        let mut bytes = Vec::with_capacity(ID_LEN);
        let mut rest = s.as_bytes();
        while let Some((&b, tail)) = rest.split_first() {
            if b != b'\\' {
                bytes.push(b);
                rest = tail;
                continue;
            }
            match tail {
                [b'\\', tail @ ..] => {
                    bytes.push(b'\\');
                    rest = tail;
                }
                [b'x', hi, lo, tail @ ..] => {
                    let byte = hex::decode([*hi, *lo]).map_err(|_| bad_escape())?;
                    bytes.extend_from_slice(&byte);
                    rest = tail;
                }
                _ => return Err(bad_escape()),
            }
        }
        if bytes.first().map_or(true, |&b| b == 0) {
            return Err("resource id must not be empty".to_owned());
        }
        Ok(Self::from_slice(&bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// The identifier up to (not including) the first NUL.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(ID_LEN);
        &self.0[..end]
    }

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; ID_LEN];
        reader.read_exact(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.trimmed() {
            match b {
                b'\\' => f.write_str("\\\\")?,
                _ if b.is_ascii_graphic() || b == b' ' => write!(f, "{}", b as char)?,
                _ => write!(f, "\\x{b:02x}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId(\"{self}\")")
    }
}

impl From<&str> for ResourceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_escaped(s)
    }
}

// Stored as the display string in registry files.
impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::parse_escaped(&name).map_err(serde::de::Error::custom)
    }
}

// ── TocEntry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    pub id:     ResourceId,
    /// Offset from the base offset.
    pub offset: u32,
}

/// Read `count` entries: all identifiers, then all offsets.
pub fn read_toc<R: Read + ?Sized>(reader: &mut R, count: u16) -> io::Result<Vec<TocEntry>> {
    let mut ids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        ids.push(ResourceId::read(reader)?);
    }
    let mut entries = Vec::with_capacity(count as usize);
    for id in ids {
        let offset = reader.read_u32::<LittleEndian>()?;
        entries.push(TocEntry { id, offset });
    }
    Ok(entries)
}

/// Write the identifier half of the table.
pub fn write_toc_ids<W: Write + ?Sized>(writer: &mut W, ids: &[ResourceId]) -> io::Result<()> {
    for id in ids {
        id.write(writer)?;
    }
    Ok(())
}

/// Write `count` zeroed offset slots, to be backpatched.
pub fn write_toc_placeholders<W: Write + ?Sized>(writer: &mut W, count: usize) -> io::Result<()> {
    for _ in 0..count {
        writer.write_u32::<LittleEndian>(0)?;
    }
    Ok(())
}
