//! Plain-text structure files: catalog, shape checks, record filtering and
//! header lookup. Nothing here parses individual atom fields.

pub mod catalog;
pub mod filter;
pub mod header;
pub mod record;

pub use catalog::*;
pub use filter::*;
pub use header::*;
pub use record::*;
