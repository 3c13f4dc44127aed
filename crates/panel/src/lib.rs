//! Debug-target discovery, synchronization, and dispatch.
//!
//! This crate keeps a categorized, de-duplicated view of debuggable entities
//! (installed add-ons, running workers) synchronized with their lifecycle,
//! and knows how to start a debugging session for each kind of target:
//!
//! - **Aggregators** ([`addons::list_extension_targets`],
//!   [`workers::list_worker_targets`]): stateless passes that query the host
//!   registry or the remote client and produce a fresh, render-ready
//!   snapshot per call
//! - **Watchers** ([`AddonsWatcher`], [`WorkersWatcher`],
//!   [`DebugFlagWatcher`]): background tasks that subscribe to lifecycle
//!   events, re-run the aggregation pass on change, and publish complete
//!   snapshots through a callback
//! - **Dispatcher** ([`dispatch::debug`]): starts the kind-specific
//!   debugging session for one target
//!
//! Rendering is not this crate's concern: consumers receive immutable
//! snapshots and forward user clicks to [`dispatch::debug`].
//!
//! # Example
//!
//! ```ignore
//! use rdbg::{AddonsWatcher, WorkersWatcher};
//!
//! let mut addons = AddonsWatcher::start(registry, |targets| render_addons(targets));
//! let mut workers = WorkersWatcher::start(client, |snapshot| render_workers(snapshot));
//!
//! // ... panel is live, snapshots arrive as lifecycles change ...
//!
//! addons.stop();
//! workers.stop();
//! ```

pub mod addons;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod testing;
pub mod watch;
pub mod workers;

pub use addons::{EXTENSION_ICON, list_extension_targets};
pub use dispatch::{SessionClosed, ToolboxHost, WorkerSession, debug};
pub use error::{Error, Result};
pub use host::{AddonEvent, AddonInfo, AddonRegistry, DEBUG_ENABLED_PREF, PrefStore};
pub use watch::{AddonsWatcher, DebugFlagWatcher, WatcherHandle, WorkersWatcher};
pub use workers::{WORKER_ICON, list_worker_targets};

pub use rdbg_protocol::{DebugTarget, TargetKind, WorkerSnapshot};
