pub mod error;
pub mod toc;
pub mod envelope;
pub mod decompress;
pub mod codec;
pub mod registry;
pub mod resource_set;
pub mod io_stream;
pub mod archive;

pub use error::{ResourceError, Result};
pub use toc::{ResourceId, TocEntry};
pub use envelope::{Envelope, CompressionHeader};
pub use decompress::Decompressor;
pub use codec::{Resource, TypeTag, TextResource, BitmapResource, get_codec};
pub use registry::{TypeRegistry, TypeMap};
pub use resource_set::{ResourceSet, ResourceMap};
pub use io_stream::{ResourceReader, ResourceWriter, write_file, to_bytes};
pub use archive::ResourceFile;
