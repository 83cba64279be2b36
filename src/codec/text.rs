use std::borrow::Cow;
use std::io::{self, Read, Write};

use tracing::warn;

/// A NUL-terminated string record. Bytes are kept as stored (DOS code page).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextResource {
    bytes: Vec<u8>,
}

impl TextResource {
    /// Interior NUL bytes would end the string early on re-read; they are
    /// dropped with a warning. Use [`TextResource::try_new`] to reject them.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        let before = bytes.len();
        bytes.retain(|&b| b != 0);
        if bytes.len() != before {
            warn!(dropped = before - bytes.len(), "dropped NUL bytes from text resource");
        }
        Self { bytes }
    }

    pub fn try_new(bytes: impl Into<Vec<u8>>) -> io::Result<Self> {
        let bytes = bytes.into();
        if let Some(at) = bytes.iter().position(|&b| b == 0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("text resource contains a NUL byte at {at}"),
            ));
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn set_text(&mut self, text: &str) {
        *self = Self::new(text.as_bytes());
    }

    pub fn encoded_len(&self) -> usize {
        self.bytes.len() + 1
    }

    pub fn read(reader: &mut dyn Read) -> io::Result<Self> {
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            reader.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
        }
        Ok(Self { bytes })
    }

    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.bytes)?;
        writer.write_all(&[0])
    }
}

impl From<&str> for TextResource {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}
