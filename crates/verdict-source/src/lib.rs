//! Case sourcing and game flow: data sources, the shard manifest, the shard
//! cache, the non-repeating case sampler, and the player session on top.

mod config;
pub use config::SourceConfig;

mod source;
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use source::{DataSource, DirSource, FetchError, MemorySource, source_for};

pub mod manifest;
pub use manifest::{Manifest, ManifestEntry, ManifestResolver};

pub mod shard;
pub use shard::{PoolKind, ShardCache, ShardId, parse_rows};

pub mod sampler;
pub use sampler::{CaseSampler, SampleError};

pub mod session;
pub use session::{DEFAULT_REGION, GameSession, SessionError, Verdict, load_charge_catalog};
