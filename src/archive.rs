//! High-level [`ResourceFile`] API.
//!
//! ```no_run
//! use stunres::archive::ResourceFile;
//! use stunres::codec::{Resource, TextResource};
//! use stunres::io_stream::ResourceReader;
//! use stunres::registry::TypeMap;
//!
//! let mut types = TypeMap::new();
//! types.insert("gnam", "text");
//!
//! let reader = ResourceReader::new(&types);
//! let mut res = ResourceFile::open("game.res", &reader)?;
//! res.resources_mut().replace(&"gnam".into(), Resource::Text(TextResource::from("Stunts")))?;
//! res.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::io_stream::{self, ResourceReader};
use crate::resource_set::ResourceSet;
use crate::toc::TocEntry;

// ── ResourceInfo ──────────────────────────────────────────────────────────────

/// Per-record descriptor returned by [`ResourceFile::list`].
#[derive(Debug, Clone)]
pub struct ResourceInfo {
    pub id:          String,
    pub kind:        &'static str,
    /// Offset from the base offset as last loaded or saved; `None` for
    /// records added since.
    pub offset:      Option<u32>,
    pub encoded_len: usize,
}

// ── ResourceFile ──────────────────────────────────────────────────────────────

pub struct ResourceFile {
    path:      PathBuf,
    envelope:  Envelope,
    file_size: u64,
    toc:       Vec<TocEntry>,
    resources: ResourceSet,
}

impl ResourceFile {
    pub fn open<P: AsRef<Path>>(path: P, reader: &ResourceReader<'_>) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let parsed = reader.open_file(&path)?;
        Ok(Self {
            path,
            envelope:  parsed.envelope,
            file_size: parsed.file_size,
            toc:       parsed.toc,
            resources: parsed.resources,
        })
    }

    /// A new, empty file that will be written to `path` on save.
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path:      path.as_ref().to_owned(),
            envelope:  Envelope::Plain { size: 0 },
            file_size: 0,
            toc:       Vec::new(),
            resources: ResourceSet::new(),
        }
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    pub fn path(&self) -> &Path { &self.path }

    /// Envelope the file had when loaded.
    pub fn envelope(&self) -> Envelope { self.envelope }

    /// Size on disk when loaded (compressed size for compressed files).
    pub fn file_size(&self) -> u64 { self.file_size }

    pub fn resources(&self) -> &ResourceSet { &self.resources }

    pub fn resources_mut(&mut self) -> &mut ResourceSet { &mut self.resources }

    pub fn into_resources(self) -> ResourceSet { self.resources }

    pub fn list(&self) -> Vec<ResourceInfo> {
        self.resources
            .iter()
            .map(|(id, r)| ResourceInfo {
                id:          id.to_string(),
                kind:        r.type_tag().name(),
                offset:      self.toc.iter().find(|e| e.id == *id).map(|e| e.offset),
                encoded_len: r.encoded_len(),
            })
            .collect()
    }

    // ── Write ────────────────────────────────────────────────────────────────

    /// Overwrite the file this was loaded from. Compressed files are saved
    /// uncompressed.
    pub fn save(&mut self) -> Result<u64> {
        let path = self.path.clone();
        self.save_as(path)
    }

    /// Write to `path` and make it the file's new location.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let size = io_stream::write_file(path, &self.resources)?;
        info!(path = %path.display(), size, "saved resource file");

        self.path = path.to_owned();
        self.envelope = Envelope::Plain { size: size as u32 };
        self.file_size = size;

        // Records are laid out back to back in id order.
        let mut offset = 0u32;
        self.toc = self
            .resources
            .iter()
            .map(|(id, r)| {
                let entry = TocEntry { id: *id, offset };
                offset += r.encoded_len() as u32;
                entry
            })
            .collect();
        Ok(size)
    }
}
