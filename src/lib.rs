//! zonesync
//!
//! A blocking client library that keeps forward (A) and reverse (PTR) DNS
//! records consistent through a remote zone-management service.
//!
//! # Features
//!
//! * Longest-registered-suffix zone resolution with TTL caching
//! * Paginated exact-match zone search and scoped record search
//! * Deletes that refuse to act on ambiguous matches
//! * Paired forward/reverse record creation and removal, with a guard
//!   against removing a reverse record that points at a different host
//! * Session tokens reacquired automatically after idle expiry
//!
//! # Architecture
//!
//! The library is divided into two main modules:
//! * `rpc` - session handling and the SOAP wire plumbing
//! * `dns` - zone resolution and record reconciliation
//!
//! # Usage
//!
//! ```rust,no_run
//! use zonesync::dns::reconciler::{RecordReconciler, DEFAULT_RECORD_TTL};
//! use zonesync::rpc::client::{SoapClient, SoapConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SoapConfig::new(
//!     "https://ns.example.net/soap",
//!     "http://ns.example.net/NicToolServer",
//! );
//! let mut reconciler = RecordReconciler::connect(SoapClient::new(config)?, "ops", "secret");
//! reconciler.add_forward_and_reverse("host.example.com", "10.20.30.40", DEFAULT_RECORD_TTL)?;
//! reconciler.delete_forward_and_reverse(Some("old.example.com"), None)?;
//! # Ok(())
//! # }
//! ```

/// Zone resolution and record reconciliation
pub mod dns;

/// RPC invoker, session handling and wire envelope
pub mod rpc;
