//! Lifecycle-driven snapshot synchronization.
//!
//! Each watcher owns a background task that subscribes to its family's
//! lifecycle events, runs one aggregation pass immediately, and re-runs a
//! pass per received event, publishing every complete snapshot through the
//! caller's callback. Passes are serialized by construction: the task runs
//! one pass at a time, and events arriving mid-pass sit in the broadcast
//! buffer until the pass completes, each triggering a fresh pass. A failed
//! pass publishes nothing, so consumers keep their previous snapshot.
//!
//! Stopping is strict: after [`WatcherHandle::stop`] returns, the callback
//! is never invoked again, even if a pass was in flight or events keep
//! firing on the underlying source.

use crate::addons::list_extension_targets;
use crate::host::{AddonRegistry, DEBUG_ENABLED_PREF, PrefStore};
use crate::workers::list_worker_targets;
use parking_lot::ReentrantMutex;
use rdbg_client::RemoteClient;
use rdbg_protocol::{DebugTarget, WorkerSnapshot};
use std::cell::Cell;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

/// Stop flag shared between a handle and its watcher's publication path.
///
/// The publication path holds this lock across the snapshot callback, so a
/// cross-thread `stop()` blocks until the callback returns and later
/// callbacks see the flag. The lock is reentrant: a callback that stops its
/// own watcher re-acquires it on the same thread instead of deadlocking.
type StopFlag = Arc<ReentrantMutex<Cell<bool>>>;

/// Handle controlling one watcher task.
///
/// `stop` is idempotent; dropping the handle also stops the watcher.
pub struct WatcherHandle {
    cancel_tx: Option<oneshot::Sender<()>>,
    stopped: StopFlag,
}

impl WatcherHandle {
    fn new(cancel_tx: oneshot::Sender<()>, stopped: StopFlag) -> Self {
        Self {
            cancel_tx: Some(cancel_tx),
            stopped,
        }
    }

    /// Stops the watcher. No callback invocation happens after this
    /// returns. Safe to call from inside the snapshot callback itself;
    /// calling it again is a no-op.
    pub fn stop(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            self.stopped.lock().set(true);
            let _ = tx.send(());
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("active", &self.cancel_tx.is_some())
            .finish()
    }
}

fn gated<T>(
    stopped: &StopFlag,
    callback: impl Fn(T) + Send + Sync + 'static,
) -> impl Fn(T) + Send + Sync + 'static {
    let stopped = Arc::clone(stopped);
    move |value| {
        // Held across the callback; never across an await point.
        let guard = stopped.lock();
        if !guard.get() {
            callback(value);
        }
    }
}

/// Waits for the next lifecycle event. Returns false when the source is
/// gone; lag only means events were dropped, and a fresh pass reconverges.
async fn next_event<E: Clone>(events: &mut broadcast::Receiver<E>) -> bool {
    match events.recv().await {
        Ok(_) => true,
        Err(broadcast::error::RecvError::Lagged(n)) => {
            tracing::warn!(dropped = n, "Lifecycle event stream lagged");
            true
        }
        Err(broadcast::error::RecvError::Closed) => false,
    }
}

/// Synchronization controller for the extensions family.
///
/// Subscribes to add-on install/uninstall/enable/disable notifications and
/// republishes the filtered extension target list on every change.
pub struct AddonsWatcher;

impl AddonsWatcher {
    pub fn start<F>(registry: Arc<dyn AddonRegistry>, on_snapshot: F) -> WatcherHandle
    where
        F: Fn(Vec<DebugTarget>) + Send + Sync + 'static,
    {
        let stopped: StopFlag = Arc::new(ReentrantMutex::new(Cell::new(false)));
        let publish = gated(&stopped, on_snapshot);
        // Subscribe before the first pass so no event is missed.
        let mut events = registry.addon_events();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    result = list_extension_targets(registry.as_ref()) => match result {
                        Ok(targets) => publish(targets),
                        Err(error) => {
                            tracing::warn!(%error, "Extension aggregation pass failed");
                        }
                    },
                }
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    more = next_event(&mut events) => {
                        if !more {
                            break;
                        }
                    }
                }
            }
        });

        WatcherHandle::new(cancel_tx, stopped)
    }
}

/// Synchronization controller for the workers family.
///
/// Subscribes to `workerListChanged` and `processListChanged` and
/// republishes a complete [`WorkerSnapshot`] on either.
pub struct WorkersWatcher;

impl WorkersWatcher {
    pub fn start<F>(client: Arc<dyn RemoteClient>, on_snapshot: F) -> WatcherHandle
    where
        F: Fn(WorkerSnapshot) + Send + Sync + 'static,
    {
        let stopped: StopFlag = Arc::new(ReentrantMutex::new(Cell::new(false)));
        let publish = gated(&stopped, on_snapshot);
        let mut events = client.events();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    result = list_worker_targets(&client) => match result {
                        Ok(snapshot) => publish(snapshot),
                        Err(error) => {
                            tracing::warn!(%error, "Worker aggregation pass failed");
                        }
                    },
                }
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    more = next_event(&mut events) => {
                        if !more {
                            break;
                        }
                    }
                }
            }
        });

        WatcherHandle::new(cancel_tx, stopped)
    }
}

/// Watches the debugging-enabled preference.
///
/// Publishes the *disabled* flag: true when the preference reads false.
/// The flag only gates whether the UI offers the debug action; it never
/// cancels in-flight aggregation passes.
pub struct DebugFlagWatcher;

impl DebugFlagWatcher {
    pub fn start<F>(prefs: Arc<dyn PrefStore>, on_flag: F) -> WatcherHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let stopped: StopFlag = Arc::new(ReentrantMutex::new(Cell::new(false)));
        let publish = gated(&stopped, on_flag);
        let mut changes = prefs.changes();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            publish(!prefs.get_bool(DEBUG_ENABLED_PREF));
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    change = changes.recv() => match change {
                        Ok(key) if key == DEBUG_ENABLED_PREF => {
                            publish(!prefs.get_bool(DEBUG_ENABLED_PREF));
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            // The dropped events may have included our key.
                            tracing::warn!(dropped = n, "Preference change stream lagged");
                            publish(!prefs.get_bool(DEBUG_ENABLED_PREF));
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        WatcherHandle::new(cancel_tx, stopped)
    }
}
