//! Zone resolution and record reconciliation.
//!
//! This is the decision-making half of the crate. Given a hostname or an
//! IPv4 address it finds the owning zone, locates the forward (A) and
//! reverse (PTR) records involved, and adds or removes them as a pair
//! without ever deleting a record it cannot prove belongs to the name in
//! question.
//!
//! # Module Structure
//!
//! * `cache` - zone lookup caching with TTL expiry
//! * `netutil` - IPv4 helpers and the in-addr.arpa transform
//! * `record_type` - record type definitions
//! * `resolver` - zone search and longest-suffix host/zone splitting
//! * `reconciler` - record search, safe deletes and paired operations

/// Zone lookup caching with TTL expiry
pub mod cache;

/// Internal address utilities
pub mod netutil;

/// Record type definitions and conversions
pub mod record_type;

/// Forward/reverse record reconciliation
pub mod reconciler;

/// Zone search and host/zone splitting
pub mod resolver;
