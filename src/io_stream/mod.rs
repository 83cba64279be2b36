//! Container reader and writer.
//!
//! # Reader
//! [`ResourceReader`] sniffs the leading size field, unwraps a compressed
//! envelope through the configured [`Decompressor`], then parses the table
//! of contents and hands every record to the codec its type tag selects.
//! Records come back as a [`ResourceSet`] in table-of-contents order. Any
//! failure discards everything read so far.
//!
//! # Writer
//! [`ResourceWriter`] writes a zero size field, the record count, the ids
//! and zeroed offset slots, then appends each record and backpatches its
//! slot. The size field is patched last.
//!
//! All integers are little-endian.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, info, warn};

use crate::codec::{get_codec, TypeTag};
use crate::decompress::{Decompressor, NO_DECOMPRESSOR};
use crate::envelope::{self, Envelope};
use crate::error::{classify, Direction, ResourceError, Result, StreamContext};
use crate::registry::TypeRegistry;
use crate::resource_set::{ResourceMap, ResourceSet};
use crate::toc::{self, ResourceId, TocEntry};

// ── Reader ───────────────────────────────────────────────────────────────────

/// Parsed container plus what was learned about its on-disk form.
#[derive(Debug)]
pub struct ParsedContainer {
    pub envelope:  Envelope,
    /// Length of the input before any decompression.
    pub file_size: u64,
    pub toc:       Vec<TocEntry>,
    pub resources: ResourceSet,
}

pub struct ResourceReader<'a> {
    registry:     &'a dyn TypeRegistry,
    decompressor: Option<&'a dyn Decompressor>,
}

impl<'a> ResourceReader<'a> {
    pub fn new(registry: &'a dyn TypeRegistry) -> Self {
        Self { registry, decompressor: None }
    }

    pub fn with_decompressor(mut self, decompressor: &'a dyn Decompressor) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<ResourceSet> {
        self.open_file(path).map(|c| c.resources)
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> Result<ResourceSet> {
        self.read_from(Cursor::new(bytes)).map(|c| c.resources)
    }

    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedContainer> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ResourceError::IoOpenFailure {
            path: path.to_owned(),
            direction: Direction::Reading,
            source,
        })?;
        debug!(path = %path.display(), "opened resource file");
        self.read_from(BufReader::new(file))
    }

    /// Sniff, decompress if needed, and parse.
    pub fn read_from<R: Read + Seek>(&self, mut reader: R) -> Result<ParsedContainer> {
        let (envelope, file_size) = envelope::detect(&mut reader)?;

        let (toc, resources) = match envelope {
            Envelope::Plain { .. } => self.parse_container(&mut reader, file_size)?,
            Envelope::Compressed { passes, decompressed_size } => {
                let data = self.decompress(&mut reader, file_size, passes)?;
                if data.len() as u64 != decompressed_size as u64 {
                    return Err(ResourceError::SizeMismatch {
                        reported: decompressed_size as u64,
                        actual:   data.len() as u64,
                    });
                }
                let len = data.len() as u64;
                self.parse_container(&mut Cursor::new(data), len)?
            }
        };

        Ok(ParsedContainer { envelope, file_size, toc, resources })
    }

    fn decompress<R: Read>(&self, reader: &mut R, file_size: u64, passes: u8) -> Result<Vec<u8>> {
        let decompressor = self.decompressor.ok_or_else(|| ResourceError::DecompressionFailure {
            message: NO_DECOMPRESSOR.to_owned(),
        })?;

        let mut compressed = Vec::new();
        compressed
            .try_reserve_exact(file_size as usize)
            .map_err(|_| ResourceError::AllocationFailure { bytes: file_size })?;
        reader
            .take(file_size)
            .read_to_end(&mut compressed)
            .reading("compressed data")?;
        if compressed.len() as u64 != file_size {
            return Err(ResourceError::TruncatedStream {
                what:      "compressed data".to_owned(),
                direction: Direction::Reading,
            });
        }

        let data = decompressor
            .decompress(&compressed, passes)
            .map_err(|message| ResourceError::DecompressionFailure { message })?;
        debug!(passes, compressed = file_size, decompressed = data.len(), "decompressed envelope");
        Ok(data)
    }

    /// Parse an uncompressed container of `len` bytes positioned at offset 0.
    pub fn parse_container<R: Read + Seek>(
        &self,
        reader: &mut R,
        len:    u64,
    ) -> Result<(Vec<TocEntry>, ResourceSet)> {
        let (reported, count) = read_header(reader).reading("header")?;
        if reported as u64 != len {
            return Err(ResourceError::SizeMismatch { reported: reported as u64, actual: len });
        }

        let entries = toc::read_toc(reader, count).reading("table of contents")?;
        let base = reader.stream_position().reading("table of contents")?;
        warn_past_end(&entries, base, len);

        let mut order = Vec::with_capacity(entries.len());
        let mut map = ResourceMap::with_capacity(entries.len());
        let mut spans = Vec::with_capacity(entries.len());

        for entry in &entries {
            let what = format!("resource \"{}\"", entry.id);
            reader
                .seek(SeekFrom::Start(base + entry.offset as u64))
                .reading(&what)?;

            if map.contains_key(&entry.id) {
                return Err(ResourceError::DuplicateId { id: entry.id });
            }

            let tag = self.resolve(&entry.id)?;
            let resource = get_codec(tag).read(reader).reading(&what)?;
            let end = reader.stream_position().reading(&what)? - base;
            debug!(id = %entry.id, kind = tag.name(), offset = entry.offset, "read resource");

            spans.push(Span { id: entry.id, start: entry.offset as u64, end });
            map.insert(entry.id, resource);
            order.push(entry.id);
        }

        for anomaly in layout_anomalies(&spans, len.saturating_sub(base)) {
            match anomaly {
                LayoutAnomaly::Unordered => warn!("table of contents offsets are not ascending"),
                LayoutAnomaly::Gap { start, len } => {
                    warn!(offset = start, len, "unreferenced bytes between resources")
                }
                LayoutAnomaly::Overlap { first, second } => {
                    warn!(%first, %second, "resource payloads overlap")
                }
            }
        }

        info!(count = order.len(), size = len, "parsed resource container");
        let resources = ResourceSet::from_parts(order, map)?;
        Ok((entries, resources))
    }

    fn resolve(&self, id: &ResourceId) -> Result<TypeTag> {
        let declared = self.registry.type_of(id);
        declared
            .and_then(TypeTag::from_name)
            .ok_or_else(|| ResourceError::UnknownType {
                id:       *id,
                declared: declared.map(str::to_owned),
            })
    }
}

fn read_header<R: Read + ?Sized>(reader: &mut R) -> io::Result<(u32, u16)> {
    let size = reader.read_u32::<LittleEndian>()?;
    let count = reader.read_u16::<LittleEndian>()?;
    Ok((size, count))
}

fn warn_past_end(entries: &[TocEntry], base: u64, len: u64) {
    for entry in entries {
        if base + entry.offset as u64 > len {
            warn!(id = %entry.id, offset = entry.offset, "resource offset points past end of file");
        }
    }
}

/// Payload bytes one record occupied, relative to the base offset.
#[derive(Debug, Clone, Copy)]
struct Span {
    id:    ResourceId,
    start: u64,
    end:   u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutAnomaly {
    Unordered,
    Gap { start: u64, len: u64 },
    Overlap { first: ResourceId, second: ResourceId },
}

// None of these fail a parse. A freshly written container has none of them.
fn layout_anomalies(spans: &[Span], payload_len: u64) -> Vec<LayoutAnomaly> {
    let mut found = Vec::new();
    if spans.windows(2).any(|w| w[1].start < w[0].start) {
        found.push(LayoutAnomaly::Unordered);
    }

    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|s| (s.start, s.end));

    let mut covered = 0;
    let mut owner: Option<ResourceId> = None;
    for span in &sorted {
        if span.start > covered {
            found.push(LayoutAnomaly::Gap { start: covered, len: span.start - covered });
        } else if let Some(first) = owner.filter(|_| span.start < covered) {
            found.push(LayoutAnomaly::Overlap { first, second: span.id });
        }
        if span.end > covered {
            covered = span.end;
            owner = Some(span.id);
        }
    }
    if payload_len > covered {
        found.push(LayoutAnomaly::Gap { start: covered, len: payload_len - covered });
    }
    found
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Writes one container into an empty stream, starting at offset 0.
pub struct ResourceWriter<W: Write + Seek> {
    writer: W,
}

impl<W: Write + Seek> ResourceWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_set(&mut self, resources: &ResourceSet) -> Result<u64> {
        self.write_resources(resources.ids(), resources.map())
    }

    /// Write `ids` in order, looking each one up in `map`. Returns the total
    /// container size.
    pub fn write_resources(&mut self, ids: &[ResourceId], map: &ResourceMap) -> Result<u64> {
        let count = u16::try_from(ids.len())
            .map_err(|_| ResourceError::TooManyResources { count: ids.len() })?;
        let out = &mut self.writer;

        out.seek(SeekFrom::Start(0)).writing("header")?;
        out.write_u32::<LittleEndian>(0).writing("header")?;
        out.write_u16::<LittleEndian>(count).writing("header")?;

        toc::write_toc_ids(out, ids).writing("table of contents")?;
        let toc_offset = out.stream_position().writing("table of contents")?;
        toc::write_toc_placeholders(out, ids.len()).writing("table of contents")?;
        let base = out.stream_position().writing("table of contents")?;

        for (i, id) in ids.iter().enumerate() {
            let resource = map.get(id).ok_or(ResourceError::MissingResource { id: *id })?;
            let what = format!("resource \"{id}\"");

            let end = out.seek(SeekFrom::End(0)).writing(&what)?;
            let offset = fit_u32(end - base)?;
            out.seek(SeekFrom::Start(toc_offset + i as u64 * 4)).writing(&what)?;
            out.write_u32::<LittleEndian>(offset).writing(&what)?;
            out.seek(SeekFrom::Start(base + offset as u64)).writing(&what)?;

            get_codec(resource.type_tag()).write(resource, out).writing(&what)?;
            debug!(%id, offset, kind = resource.type_tag().name(), "wrote resource");
        }

        let total = out.seek(SeekFrom::End(0)).writing("final file size")?;
        let size = fit_u32(total)?;
        out.seek(SeekFrom::Start(0)).writing("final file size")?;
        out.write_u32::<LittleEndian>(size).writing("final file size")?;
        out.flush().writing("final file size")?;

        info!(count, size, "wrote resource container");
        Ok(total)
    }
}

fn fit_u32(size: u64) -> Result<u32> {
    u32::try_from(size).map_err(|_| ResourceError::ContainerTooLarge { size })
}

/// Serialize a record set into a fresh buffer.
pub fn to_bytes(resources: &ResourceSet) -> Result<Vec<u8>> {
    let mut writer = ResourceWriter::new(Cursor::new(Vec::new()));
    writer.write_set(resources)?;
    Ok(writer.into_inner().into_inner())
}

/// Write `resources` to `path` as an uncompressed container.
///
/// The file is truncated as soon as it is opened. A failure part-way leaves
/// it partially written; the previous contents are not kept.
pub fn write_file<P: AsRef<Path>>(path: P, resources: &ResourceSet) -> Result<u64> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ResourceError::IoOpenFailure {
        path: path.to_owned(),
        direction: Direction::Writing,
        source,
    })?;
    let mut writer = ResourceWriter::new(io::BufWriter::new(file));
    let total = writer.write_set(resources)?;
    let file = writer
        .into_inner()
        .into_inner()
        .map_err(|e| classify(e.into_error(), "final file size", Direction::Writing))?;
    file.sync_all().writing("final file size")?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: &str, start: u64, end: u64) -> Span {
        Span { id: ResourceId::new(id), start, end }
    }

    #[test]
    fn packed_layout_is_clean() {
        let spans = [span("a", 0, 4), span("b", 4, 10)];
        assert!(layout_anomalies(&spans, 10).is_empty());
    }

    #[test]
    fn gaps_are_reported() {
        let spans = [span("a", 2, 4), span("b", 6, 8)];
        assert_eq!(
            layout_anomalies(&spans, 12),
            [
                LayoutAnomaly::Gap { start: 0, len: 2 },
                LayoutAnomaly::Gap { start: 4, len: 2 },
                LayoutAnomaly::Gap { start: 8, len: 4 },
            ]
        );
    }

    #[test]
    fn overlaps_and_shared_payloads_are_reported() {
        let spans = [span("a", 0, 6), span("b", 4, 8), span("c", 8, 10), span("d", 8, 10)];
        assert_eq!(
            layout_anomalies(&spans, 10),
            [
                LayoutAnomaly::Overlap { first: ResourceId::new("a"), second: ResourceId::new("b") },
                LayoutAnomaly::Overlap { first: ResourceId::new("c"), second: ResourceId::new("d") },
            ]
        );
    }

    #[test]
    fn unordered_offsets_are_reported() {
        let spans = [span("b", 4, 8), span("a", 0, 4)];
        assert_eq!(layout_anomalies(&spans, 8), [LayoutAnomaly::Unordered]);
    }
}
