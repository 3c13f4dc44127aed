//! Descriptor and reply shapes received from the debugging server.

use serde::{Deserialize, Serialize};

/// Worker kind tag for a dedicated worker.
pub const WORKER_TYPE_DEDICATED: u32 = 0;
/// Worker kind tag for a shared worker.
pub const WORKER_TYPE_SHARED: u32 = 1;
/// Worker kind tag for a service worker.
pub const WORKER_TYPE_SERVICE: u32 = 2;

/// One worker as reported by a `listWorkers` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    /// Actor id used to address this worker.
    pub actor: String,
    /// Script URL of the worker.
    pub url: String,
    /// Declared worker kind, one of the `WORKER_TYPE_*` constants.
    /// Unrecognized values classify as an uncategorized worker.
    #[serde(rename = "type", default)]
    pub kind: u32,
}

/// One process as reported by a `listProcesses` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    /// Process id, used with `getProcess` to obtain the process actor.
    pub id: u64,
    /// True for the top-level (parent) process.
    #[serde(default)]
    pub parent: bool,
}

/// Actor form carried in a `getProcess` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessForm {
    /// Actor id used to address this process.
    pub actor: String,
}

/// Reply to a `listWorkers` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWorkersReply {
    pub workers: Vec<WorkerDescriptor>,
}

/// Reply to a `listProcesses` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProcessesReply {
    pub processes: Vec<ProcessDescriptor>,
}

/// Reply to a `getProcess` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProcessReply {
    pub form: ProcessForm,
}
