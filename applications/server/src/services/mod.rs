/// Server services
pub mod library;
pub mod object_store;
pub mod resolver;

pub use library::{LibraryService, PlaylistEntry};
pub use object_store::{FileObjectStore, S3ObjectStore};
pub use resolver::YtDlpResolver;
