//! calyx-cache — Memoization of scoring results.
//! Keyed by (company id, configuration fingerprint) with a single-flight
//! guarantee: at most one engine invocation per distinct key at a time.

pub mod result_cache;

pub use result_cache::{CacheConfig, CacheStats, ResultCache};
