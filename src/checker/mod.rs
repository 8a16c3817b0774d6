//! # Fixity Checking Engine
//!
//! Periodically recomputes the digest of every stored object and compares
//! it with the last-known-good value, keeping a current-status row per
//! object and an append-only history of every check.
//!
//! Pieces:
//!
//! - `dispatcher`: which object to check next (lists, containers, oldest
//!   pending, with count and time limits as decorators)
//! - `checker`: the per-object check/compare/record cycle
//! - `runner`: seed, then drive a dispatcher through the checker
//! - `retention`: prune old history rows per outcome
//! - `store`: the status and history tables
//!
//! The catalog and digest function are external and reached through the
//! `Catalog` and `DigestSource` traits.

mod catalog;
#[allow(clippy::module_inception)]
mod checker;
mod clock;
mod collector;
mod digest;
mod dispatcher;
mod errors;
mod model;
mod outcome;
mod retention;
mod runner;
mod store;

pub use catalog::{
    Catalog, CatalogManifest, CatalogObject, ContainerEntry, ContainerKind, MemoryCatalog,
    NodeKind, ResolvedNode,
};
pub use checker::{compare_digests, FixityChecker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collector::{LoggingCollector, MemoryCollector, ResultsCollector};
pub use digest::{
    digest_bytes, Digest, DigestAlgorithm, DigestError, DigestSource, LocalDigestSource,
    MemoryDigestSource,
};
pub use dispatcher::{
    CountLimit, Dispatcher, Next, OldestPending, ScopedResolver, StaticList, TimeLimit,
};
pub use errors::{CheckerError, CheckerResult};
pub use model::{never_checked, CheckResult, CurrentStatus, HistoryEntry, NewHistoryEntry, ObjectId};
pub use outcome::OutcomeCode;
pub use retention::{parse_duration, PruneReport, RetentionPolicy, RetentionPruner};
pub use runner::{RunController, RunSummary};
pub use store::{
    FileLedger, HistoryStore, Ledger, MemoryLedger, RemovalReport, SeedReport, StatusStore,
};
