//! Persistence layer: key-value backends, the persistence port, and player history.

mod error;
pub use error::StoreError;

mod kv;
pub use kv::{JsonFileStore, KvStore, MemoryStore};

mod port;
pub use port::Persistence;

pub mod history;
pub use history::{PlayHistory, Statistics};
