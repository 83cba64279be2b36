use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Header bytes preceding the pixel data.
pub const BITMAP_HEADER_SIZE: usize = 16;

/// An 8-bit indexed bitmap record.
///
/// Layout (little-endian):
///
/// | Field      | Size |
/// |------------|------|
/// | width      | 2    |
/// | height     | 2    |
/// | unknown1   | 4    |
/// | x          | 2    |
/// | y          | 2    |
/// | unknown2   | 4    |
/// | pixels     | width * height |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapResource {
    pub width:    u16,
    pub height:   u16,
    pub x:        u16,
    pub y:        u16,
    /// Opaque header bytes, preserved on write.
    pub unknown1: [u8; 4],
    pub unknown2: [u8; 4],
    pixels:       Vec<u8>,
}

impl BitmapResource {
    /// Fails when `pixels` is not exactly `width * height` bytes.
    pub fn new(width: u16, height: u16, pixels: Vec<u8>) -> io::Result<Self> {
        check_dimensions(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            x: 0,
            y: 0,
            unknown1: [0; 4],
            unknown2: [0; 4],
            pixels,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn set_pixels(&mut self, width: u16, height: u16, pixels: Vec<u8>) -> io::Result<()> {
        check_dimensions(width, height, pixels.len())?;
        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn encoded_len(&self) -> usize {
        BITMAP_HEADER_SIZE + self.pixels.len()
    }

    pub fn read(reader: &mut dyn Read) -> io::Result<Self> {
        let width = reader.read_u16::<LittleEndian>()?;
        let height = reader.read_u16::<LittleEndian>()?;
        let mut unknown1 = [0u8; 4];
        reader.read_exact(&mut unknown1)?;
        let x = reader.read_u16::<LittleEndian>()?;
        let y = reader.read_u16::<LittleEndian>()?;
        let mut unknown2 = [0u8; 4];
        reader.read_exact(&mut unknown2)?;

        let len = width as usize * height as usize;
        let mut pixels = Vec::new();
        (&mut *reader).take(len as u64).read_to_end(&mut pixels)?;
        if pixels.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("bitmap {width}x{height} ends after {} of {len} pixel bytes", pixels.len()),
            ));
        }

        Ok(Self { width, height, x, y, unknown1, unknown2, pixels })
    }

    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.width)?;
        writer.write_u16::<LittleEndian>(self.height)?;
        writer.write_all(&self.unknown1)?;
        writer.write_u16::<LittleEndian>(self.x)?;
        writer.write_u16::<LittleEndian>(self.y)?;
        writer.write_all(&self.unknown2)?;
        writer.write_all(&self.pixels)
    }
}

fn check_dimensions(width: u16, height: u16, len: usize) -> io::Result<()> {
    let expected = width as usize * height as usize;
    if len != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("bitmap {width}x{height} needs {expected} pixel bytes, got {len}"),
        ));
    }
    Ok(())
}
