//! Wire plumbing for the zone-management service.
//!
//! The service speaks a SOAP 1.1 dialect: every call is a method name
//! plus a flat map of typed key/value arguments, and every response is a
//! structured payload with an in-band status code. Nothing above this
//! module knows about XML; the reconciliation core talks to the service
//! exclusively through the [`client::RpcInvoker`] trait.
//!
//! # Module Structure
//!
//! * `client` - the invoker trait and the SOAP-over-HTTPS implementation
//! * `envelope` - envelope assembly and generic response parsing
//! * `protocol` - the method registry, request builders and typed responses
//! * `session` - session token lifecycle and idle tracking

/// RPC invoker trait and the SOAP transport
pub mod client;

/// SOAP envelope assembly and response parsing
pub mod envelope;

/// Method registry, search requests and typed responses
pub mod protocol;

/// Session token lifecycle
pub mod session;
