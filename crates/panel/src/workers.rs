//! Worker-family target aggregation.
//!
//! One pass queries the root actor for its worker list and the process
//! list concurrently, fans out a `getProcess` + `listWorkers` query pair to
//! every non-parent process, joins everything all-or-nothing, and buckets
//! the combined descriptors into one [`WorkerSnapshot`]. A failed request
//! anywhere fails the whole pass; callers keep their previous snapshot.

use crate::error::Result;
use futures_util::future;
use rdbg_client::{ActorChannel, RemoteClient, RootActor};
use rdbg_protocol::{
    DebugTarget, ListWorkersReply, TargetKind, WORKER_TYPE_SERVICE, WORKER_TYPE_SHARED,
    WorkerSnapshot,
};
use std::sync::Arc;

/// Icon shared by all worker targets.
pub const WORKER_ICON: &str = "chrome://devtools/skin/images/debugging-workers.svg";

/// Produces the current categorized snapshot of worker targets.
///
/// The snapshot is returned as a single unit; partial buckets are never
/// exposed. Bucket order follows the order the upstream queries returned:
/// parent-process workers first, then each child process's workers in
/// process-list order.
pub async fn list_worker_targets(client: &Arc<dyn RemoteClient>) -> Result<WorkerSnapshot> {
    let root = RootActor::new(Arc::clone(client));

    // Root worker list and process list are independent requests.
    let (workers_reply, processes_reply) =
        future::try_join(root.list_workers(), root.list_processes()).await?;

    let mut forms = workers_reply.workers;

    // Fan out to every child process; the parent's workers are already in
    // the root listing.
    let child_queries = processes_reply
        .processes
        .into_iter()
        .filter(|process| !process.parent)
        .map(|process| {
            let root = &root;
            let client = Arc::clone(client);
            async move {
                let form = root.get_process(process.id).await?.form;
                let channel = ActorChannel::new(form.actor, client);
                let reply: ListWorkersReply = channel.send_no_params("listWorkers").await?;
                Ok::<_, rdbg_client::Error>(reply.workers)
            }
        });
    for workers in future::try_join_all(child_queries).await? {
        forms.extend(workers);
    }

    let mut snapshot = WorkerSnapshot::default();
    for form in forms {
        let (kind, bucket) = match form.kind {
            WORKER_TYPE_SERVICE => (TargetKind::ServiceWorker, &mut snapshot.service),
            WORKER_TYPE_SHARED => (TargetKind::SharedWorker, &mut snapshot.shared),
            _ => (TargetKind::Worker, &mut snapshot.other),
        };
        bucket.push(DebugTarget {
            name: form.url,
            icon: WORKER_ICON.to_string(),
            kind,
            identity: form.actor,
        });
    }
    Ok(snapshot)
}
