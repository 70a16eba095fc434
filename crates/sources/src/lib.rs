// FILE: crates/sources/src/lib.rs

mod catalog;
mod resolver;

pub use catalog::{SourceCatalog, SourceId};
pub use resolver::{is_absolute_url, resolve, Candidate, CandidateOrigin, ResolveError};

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
