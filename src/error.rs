//! Error type shared by the reader and the writer.
//!
//! Every failure is terminal for the parse or write in progress. The stream
//! classification in [`classify`] is used by both directions; only the
//! [`Direction`] differs.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::toc::ResourceId;

pub type Result<T> = std::result::Result<T, ResourceError>;

/// Whether a stream was being read from or written to when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Reading,
    Writing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Reading => "reading",
            Direction::Writing => "writing",
        })
    }
}

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Couldn't open {} for {direction}: {source}", .path.display())]
    IoOpenFailure {
        path:      PathBuf,
        direction: Direction,
        #[source]
        source:    io::Error,
    },

    #[error("Invalid file. Reported size ({reported}) doesn't match actual size ({actual})")]
    SizeMismatch { reported: u64, actual: u64 },

    #[error("Invalid file. Reported size ({reported}) doesn't match actual file size ({actual}) or compression header")]
    InvalidCompressionHeader { reported: u32, actual: u64 },

    #[error("Decompression failed with message \"{message}\"")]
    DecompressionFailure { message: String },

    #[error("Couldn't allocate {bytes} bytes for compressed data")]
    AllocationFailure { bytes: u64 },

    #[error("Resource id \"{id}\" not unique")]
    DuplicateId { id: ResourceId },

    #[error("Unknown type for id \"{id}\"{}", declared_suffix(.declared))]
    UnknownType { id: ResourceId, declared: Option<String> },

    #[error("Reached unexpected end of file while {direction} {what}")]
    TruncatedStream { what: String, direction: Direction },

    #[error("Data corruption occurred while {direction} {what}")]
    CorruptStream { what: String, direction: Direction },

    #[error("Device error occurred while {direction} {what} (\"{message}\")")]
    DeviceError { what: String, direction: Direction, message: String },

    /// The ordered id list and the record map disagree about an id.
    #[error("Resource id \"{id}\" has no matching record")]
    MissingResource { id: ResourceId },

    #[error("Too many resources for one container: {count} (maximum 65535)")]
    TooManyResources { count: usize },

    #[error("Container too large: {size} bytes does not fit the 32-bit size field")]
    ContainerTooLarge { size: u64 },

    #[error("Couldn't load type registry: {0}")]
    Registry(String),
}

fn declared_suffix(declared: &Option<String>) -> String {
    match declared {
        Some(name) => format!(" (declared as \"{name}\")"),
        None       => String::new(),
    }
}

/// Map a failed stream operation onto the closed error set.
///
/// `what` names the part of the container being processed ("header",
/// "table of contents", ...).
pub fn classify(err: io::Error, what: &str, direction: Direction) -> ResourceError {
    let what = what.to_owned();
    match err.kind() {
        io::ErrorKind::UnexpectedEof => ResourceError::TruncatedStream { what, direction },
        io::ErrorKind::InvalidData   => ResourceError::CorruptStream { what, direction },
        _ => ResourceError::DeviceError {
            what,
            direction,
            message: err.to_string(),
        },
    }
}

/// Attach stream context to a batch of I/O operations.
pub(crate) trait StreamContext<T> {
    fn reading(self, what: &str) -> Result<T>;
    fn writing(self, what: &str) -> Result<T>;
}

impl<T> StreamContext<T> for io::Result<T> {
    fn reading(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(e, what, Direction::Reading))
    }

    fn writing(self, what: &str) -> Result<T> {
        self.map_err(|e| classify(e, what, Direction::Writing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "boom")
    }

    #[test]
    fn classify_maps_each_kind_in_both_directions() {
        for direction in [Direction::Reading, Direction::Writing] {
            match classify(io_err(io::ErrorKind::UnexpectedEof), "header", direction) {
                ResourceError::TruncatedStream { what, direction: d } => {
                    assert_eq!(what, "header");
                    assert_eq!(d, direction);
                }
                other => panic!("expected TruncatedStream, got {other:?}"),
            }
            match classify(io_err(io::ErrorKind::InvalidData), "table of contents", direction) {
                ResourceError::CorruptStream { what, direction: d } => {
                    assert_eq!(what, "table of contents");
                    assert_eq!(d, direction);
                }
                other => panic!("expected CorruptStream, got {other:?}"),
            }
            match classify(io_err(io::ErrorKind::PermissionDenied), "final file size", direction) {
                ResourceError::DeviceError { what, direction: d, message } => {
                    assert_eq!(what, "final file size");
                    assert_eq!(d, direction);
                    assert_eq!(message, "boom");
                }
                other => panic!("expected DeviceError, got {other:?}"),
            }
        }
    }

    #[test]
    fn messages_name_the_stage_and_direction() {
        let e = classify(io_err(io::ErrorKind::UnexpectedEof), "header", Direction::Reading);
        assert_eq!(e.to_string(), "Reached unexpected end of file while reading header");

        let e = classify(io_err(io::ErrorKind::InvalidData), "resource \"gnam\"", Direction::Writing);
        assert_eq!(e.to_string(), "Data corruption occurred while writing resource \"gnam\"");

        let e = classify(io_err(io::ErrorKind::Other), "table of contents", Direction::Reading);
        assert_eq!(
            e.to_string(),
            "Device error occurred while reading table of contents (\"boom\")"
        );
    }

    #[test]
    fn stream_context_picks_direction() {
        let read: io::Result<()> = Err(io_err(io::ErrorKind::InvalidData));
        assert!(matches!(
            read.reading("header"),
            Err(ResourceError::CorruptStream { direction: Direction::Reading, .. })
        ));
        let write: io::Result<()> = Err(io_err(io::ErrorKind::WriteZero));
        assert!(matches!(
            write.writing("header"),
            Err(ResourceError::DeviceError { direction: Direction::Writing, .. })
        ));
    }
}
