//! Inbound adapters translating external requests into driving-port calls.
//!
//! HTTP is the only transport today; the live notification feed rides on it
//! as server-sent events.

pub mod http;
