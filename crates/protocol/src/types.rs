//! Render-ready target shapes.
//!
//! A [`DebugTarget`] is the unit of output of an aggregation pass: a flat,
//! presentation-friendly record describing one debuggable entity. Worker
//! targets are grouped into a [`WorkerSnapshot`] with one bucket per worker
//! category.

use serde::{Deserialize, Serialize};

/// Kind of a debuggable entity.
///
/// The kind determines both rendering grouping and the attach strategy used
/// when debugging starts. `Unknown` captures any tag outside the enumerated
/// set: target classification is driven by external data, so an
/// unrecognized kind must deserialize into a reachable state rather than
/// fail the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// An installed, debuggable add-on.
    Extension,
    /// A service worker.
    ServiceWorker,
    /// A shared worker.
    SharedWorker,
    /// A dedicated (or otherwise uncategorized) worker.
    Worker,
    /// Any tag outside the enumerated set.
    #[serde(other)]
    Unknown,
}

/// One debuggable entity, normalized for rendering and dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugTarget {
    /// Human-readable label (add-on name, or worker URL).
    pub name: String,
    /// Icon reference; defaulted per family when the source provides none.
    pub icon: String,
    /// Target kind, `"type"` on the wire.
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// Opaque id used to attach (add-on id, or worker actor id).
    pub identity: String,
}

/// Complete categorized view of the worker family.
///
/// Rebuilt wholesale on every aggregation pass and published as one unit, so
/// consumers never observe one bucket updated while another is stale. Order
/// within each bucket follows the order the upstream queries returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    /// Service workers.
    pub service: Vec<DebugTarget>,
    /// Shared workers.
    pub shared: Vec<DebugTarget>,
    /// Everything else (dedicated workers, unrecognized kinds).
    pub other: Vec<DebugTarget>,
}

impl WorkerSnapshot {
    /// Returns true if all three buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.service.is_empty() && self.shared.is_empty() && self.other.is_empty()
    }

    /// Total number of targets across all buckets.
    pub fn len(&self) -> usize {
        self.service.len() + self.shared.len() + self.other.len()
    }
}
