//! Persistence of state projections.
//!
//! A slot holds the JSON text of a state with the URL-positional keys
//! removed. Backends implement [`StorageBackend`]; [`MemoryStorage`] and
//! [`FileStorage`] ship with the crate.

mod backend;
mod file;
pub mod snapshot;

pub use backend::{MemoryStorage, StorageBackend};
pub use file::FileStorage;
pub use snapshot::LoadOutcome;
