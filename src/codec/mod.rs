//! Record codecs: one per type tag, selected through [`get_codec`].
//!
//! A codec reads a record starting at the stream's current position and
//! decides for itself how many bytes belong to it. Writing appends the
//! record at the current position.

use std::io::{self, Read, Write};

mod bitmap;
mod text;

pub use bitmap::{BitmapResource, BITMAP_HEADER_SIZE};
pub use text::TextResource;

// ── TypeTag ───────────────────────────────────────────────────────────────────

/// Declared type of a record, as named in the type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Text,
    Bitmap,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Text   => "text",
            TypeTag::Bitmap => "bitmap",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "text"   => Some(TypeTag::Text),
            "bitmap" => Some(TypeTag::Bitmap),
            _        => None,
        }
    }
}

// ── Resource ──────────────────────────────────────────────────────────────────

/// A typed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Text(TextResource),
    Bitmap(BitmapResource),
}

impl Resource {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Resource::Text(_)   => TypeTag::Text,
            Resource::Bitmap(_) => TypeTag::Bitmap,
        }
    }

    /// Bytes the record occupies once written.
    pub fn encoded_len(&self) -> usize {
        match self {
            Resource::Text(t)   => t.encoded_len(),
            Resource::Bitmap(b) => b.encoded_len(),
        }
    }

    /// Encode through the record's own codec.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        get_codec(self.type_tag()).write(self, &mut out)?;
        Ok(out)
    }
}

impl From<TextResource> for Resource {
    fn from(t: TextResource) -> Self {
        Resource::Text(t)
    }
}

impl From<BitmapResource> for Resource {
    fn from(b: BitmapResource) -> Self {
        Resource::Bitmap(b)
    }
}

// ── Codec trait ───────────────────────────────────────────────────────────────

pub trait RecordCodec: Send + Sync {
    fn type_tag(&self) -> TypeTag;
    fn read(&self, reader: &mut dyn Read) -> io::Result<Resource>;
    fn write(&self, resource: &Resource, writer: &mut dyn Write) -> io::Result<()>;
}

pub struct TextCodec;
impl RecordCodec for TextCodec {
    fn type_tag(&self) -> TypeTag { TypeTag::Text }

    fn read(&self, reader: &mut dyn Read) -> io::Result<Resource> {
        TextResource::read(reader).map(Resource::Text)
    }

    fn write(&self, resource: &Resource, writer: &mut dyn Write) -> io::Result<()> {
        match resource {
            Resource::Text(t) => t.write(writer),
            other => Err(mismatch(self.type_tag(), other)),
        }
    }
}

pub struct BitmapCodec;
impl RecordCodec for BitmapCodec {
    fn type_tag(&self) -> TypeTag { TypeTag::Bitmap }

    fn read(&self, reader: &mut dyn Read) -> io::Result<Resource> {
        BitmapResource::read(reader).map(Resource::Bitmap)
    }

    fn write(&self, resource: &Resource, writer: &mut dyn Write) -> io::Result<()> {
        match resource {
            Resource::Bitmap(b) => b.write(writer),
            other => Err(mismatch(self.type_tag(), other)),
        }
    }
}

fn mismatch(codec: TypeTag, resource: &Resource) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} codec cannot write a {} record", codec.name(), resource.type_tag().name()),
    )
}

// ── Factory ───────────────────────────────────────────────────────────────────

pub fn get_codec(tag: TypeTag) -> Box<dyn RecordCodec> {
    match tag {
        TypeTag::Text   => Box::new(TextCodec),
        TypeTag::Bitmap => Box::new(BitmapCodec),
    }
}
