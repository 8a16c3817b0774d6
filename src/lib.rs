//! fixity - continuous digest auditing for stored objects
//!
//! Recomputes object digests on a schedule, compares them with the
//! last-known-good values, and keeps a per-object status row plus an
//! append-only history of every check.

pub mod checker;
pub mod cli;
pub mod config;
pub mod observability;
