//! Call contract for the external decompressor.
//!
//! The decompressor receives the whole compressed file (including the
//! leading compression header) and the pass count from that header, and
//! returns the decompressed container or a diagnostic message. Its
//! internals live outside this crate.

/// A multi-pass decompressor.
pub trait Decompressor {
    fn decompress(&self, data: &[u8], passes: u8) -> Result<Vec<u8>, String>;
}

impl<F> Decompressor for F
where
    F: Fn(&[u8], u8) -> Result<Vec<u8>, String>,
{
    fn decompress(&self, data: &[u8], passes: u8) -> Result<Vec<u8>, String> {
        self(data, passes)
    }
}

/// Message reported when a compressed file is opened without a decompressor.
pub const NO_DECOMPRESSOR: &str = "no decompressor configured for compressed resource files";
