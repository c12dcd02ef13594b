//! Remote fetch strategies: chunked batches by name and paginated listings by path.

mod batch;
mod path;

pub use batch::{BatchFetcher, MAX_BATCH_SIZE, chunk_keys};
pub use path::PathFetcher;
