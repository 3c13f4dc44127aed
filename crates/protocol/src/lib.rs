//! Wire types for the remote debugging protocol.
//!
//! This crate contains the serde-serializable types exchanged with a
//! debugging server, plus the render-ready target shapes derived from them.
//! Types here are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with the wire**: Descriptor and reply shapes match the packets
//!   the server sends
//!
//! The aggregation and synchronization logic built on these types lives in
//! the `rdbg-panel` crate.

pub mod descriptors;
pub mod types;

pub use descriptors::*;
pub use types::*;
