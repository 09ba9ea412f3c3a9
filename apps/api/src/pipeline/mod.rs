// Request-driven parse-then-rank pipeline.
// I/O (profile fetch, catalog fetch) is awaited with explicit timeouts; scoring runs on the
// blocking pool. Each (session, catalog) slot only ever publishes its latest generation.

pub mod cache;
pub mod handlers;
pub mod runner;
pub mod session;

pub use cache::{ProfileCache, ProfileLookup, ProfileSnapshot, ProfileStatus};
pub use runner::{Pipeline, PipelineOutcome, RankParams, RankedPage, RankingRequest};
pub use session::{QuerySlot, SlotKey, SlotRegistry};
