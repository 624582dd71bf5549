//! Wayback Machine CDX index access.
//!
//! This module provides:
//! - `CdxSnapshot` and the eligibility rules for captures worth parsing
//! - `CdxCache`, the per-entity on-disk cache of filtered listings
//! - `CdxClient`, which queries the index and maintains the cache

mod cache;
mod client;
mod types;

// Re-export public API
pub use cache::CdxCache;
pub use client::CdxClient;
pub use types::{CdxCacheEntry, CdxSnapshot};
