//! Remote debugging client seam.
//!
//! This crate defines the boundary between the target-discovery core and a
//! live debugging-protocol connection:
//!
//! - **[`RemoteClient`]**: the request/response and event-subscription
//!   surface an actual connection must provide
//! - **[`ActorChannel`]**: a typed request proxy bound to one actor id
//! - **[`RootActor`]**: convenience requests against the root actor
//! - **[`Error`]**: the transport/protocol/remote error taxonomy
//!
//! Protocol framing and transport are deliberately out of scope: the panel
//! core only ever talks through the [`RemoteClient`] trait, which keeps it
//! substitutable with fakes in tests.

pub mod client;
pub mod error;

pub use client::{
    ActorChannel, BoxFuture, ClientEvent, ROOT_ACTOR, RemoteClient, RootActor, check_reply,
};
pub use error::{Error, Result};
