//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel
//! - **memory**: in-process repositories for local runs and tests
//! - **push**: live fan-out of stored notifications
//!
//! Adapters translate between domain types and infrastructure
//! representations. They hold no business rules.

pub mod memory;
pub mod persistence;
pub mod push;
