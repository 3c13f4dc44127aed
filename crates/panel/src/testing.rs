//! Fake collaborators for testing the panel core.
//!
//! Every external seam ([`RemoteClient`], [`AddonRegistry`], [`PrefStore`],
//! [`ToolboxHost`]) has a scripted or recording fake here, so aggregation,
//! synchronization, and dispatch can be exercised without a live connection
//! or host.
//!
//! # Example
//!
//! ```ignore
//! use rdbg::testing::FakeClient;
//!
//! let fake = FakeClient::new();
//! fake.script("root", "listWorkers", serde_json::json!({ "workers": [] }));
//! fake.script("root", "listProcesses", serde_json::json!({ "processes": [] }));
//!
//! let snapshot = rdbg::list_worker_targets(&fake.as_client()).await?;
//! assert!(snapshot.is_empty());
//! ```

use crate::dispatch::{SessionClosed, ToolboxHost, WorkerSession};
use crate::error::{Error, Result};
use crate::host::{AddonEvent, AddonInfo, AddonRegistry, PrefStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use rdbg_client::{BoxFuture, ClientEvent, RemoteClient, check_reply};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{broadcast, oneshot};

/// Scripted [`RemoteClient`]: replies keyed by (actor, request kind),
/// with a full request log for asserting traffic.
pub struct FakeClient {
    replies: Mutex<HashMap<(String, String), Value>>,
    requests: Mutex<Vec<(String, String, Value)>>,
    events_tx: broadcast::Sender<ClientEvent>,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            events_tx,
        })
    }

    /// Returns this fake as the trait object the core expects.
    pub fn as_client(self: &Arc<Self>) -> Arc<dyn RemoteClient> {
        Arc::clone(self) as Arc<dyn RemoteClient>
    }

    /// Scripts the reply for requests of `kind` addressed to `actor`.
    pub fn script(&self, actor: &str, kind: &str, reply: Value) {
        self.replies
            .lock()
            .insert((actor.to_string(), kind.to_string()), reply);
    }

    /// Removes a scripted reply; matching requests fail from then on.
    pub fn unscript(&self, actor: &str, kind: &str) {
        self.replies
            .lock()
            .remove(&(actor.to_string(), kind.to_string()));
    }

    /// Returns every request issued so far, in issue order.
    pub fn requests(&self) -> Vec<(String, String, Value)> {
        self.requests.lock().clone()
    }

    /// Emits a list-change notification to all subscribers.
    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl RemoteClient for FakeClient {
    fn request(&self, to: &str, kind: &str, params: Value) -> BoxFuture<'_, rdbg_client::Result<Value>> {
        self.requests
            .lock()
            .push((to.to_string(), kind.to_string(), params));
        let reply = self
            .replies
            .lock()
            .get(&(to.to_string(), kind.to_string()))
            .cloned();
        let to = to.to_string();
        Box::pin(async move {
            reply
                .ok_or_else(|| rdbg_client::Error::ActorGone(to))
                .and_then(check_reply)
        })
    }

    fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events_tx.subscribe()
    }
}

/// Mutable in-memory [`AddonRegistry`] with lifecycle notifications and an
/// enumeration counter.
pub struct FakeRegistry {
    addons: Mutex<Vec<AddonInfo>>,
    events_tx: broadcast::Sender<AddonEvent>,
    enumerations: AtomicUsize,
    fail: AtomicBool,
}

impl FakeRegistry {
    pub fn new(addons: Vec<AddonInfo>) -> Self {
        let (events_tx, _) = broadcast::channel(64);
        Self {
            addons: Mutex::new(addons),
            events_tx,
            enumerations: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Adds an add-on and emits an install notification.
    pub fn install(&self, addon: AddonInfo) {
        self.addons.lock().push(addon);
        self.emit(AddonEvent::Installed);
    }

    /// Removes an add-on by id and emits an uninstall notification.
    pub fn uninstall(&self, id: &str) {
        self.addons.lock().retain(|addon| addon.id != id);
        self.emit(AddonEvent::Uninstalled);
    }

    /// Emits a lifecycle notification without touching the add-on set.
    pub fn emit(&self, event: AddonEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Number of `all_addons` enumerations issued so far.
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Makes subsequent enumerations fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AddonRegistry for FakeRegistry {
    async fn all_addons(&self) -> Result<Vec<AddonInfo>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Registry("registry unavailable".to_string()));
        }
        Ok(self.addons.lock().clone())
    }

    fn addon_events(&self) -> broadcast::Receiver<AddonEvent> {
        self.events_tx.subscribe()
    }
}

/// In-memory [`PrefStore`] with change notifications.
pub struct FakePrefs {
    values: Mutex<HashMap<String, bool>>,
    changes_tx: broadcast::Sender<String>,
}

impl FakePrefs {
    pub fn new() -> Self {
        let (changes_tx, _) = broadcast::channel(64);
        Self {
            values: Mutex::new(HashMap::new()),
            changes_tx,
        }
    }

    /// Sets a boolean preference and notifies subscribers.
    pub fn set_bool(&self, key: &str, value: bool) {
        self.values.lock().insert(key.to_string(), value);
        let _ = self.changes_tx.send(key.to_string());
    }
}

impl Default for FakePrefs {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefStore for FakePrefs {
    fn get_bool(&self, key: &str) -> bool {
        self.values.lock().get(key).copied().unwrap_or(false)
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes_tx.subscribe()
    }
}

/// Recording [`ToolboxHost`]: logs opens and hands out close signals the
/// test controls.
pub struct RecordingToolbox {
    addon_opens: Mutex<Vec<String>>,
    worker_opens: Mutex<Vec<String>>,
    close_txs: Mutex<Vec<oneshot::Sender<()>>>,
    fail_next: AtomicBool,
}

impl RecordingToolbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            addon_opens: Mutex::new(Vec::new()),
            worker_opens: Mutex::new(Vec::new()),
            close_txs: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        })
    }

    /// Returns this fake as the trait object the dispatcher expects.
    pub fn as_host(self: &Arc<Self>) -> Arc<dyn ToolboxHost> {
        Arc::clone(self) as Arc<dyn ToolboxHost>
    }

    /// Add-on ids an out-of-process toolbox was opened for, in order.
    pub fn addon_opens(&self) -> Vec<String> {
        self.addon_opens.lock().clone()
    }

    /// Worker actor ids a toolbox was opened for, in order.
    pub fn worker_opens(&self) -> Vec<String> {
        self.worker_opens.lock().clone()
    }

    /// Fires the close signal of every open toolbox.
    pub fn close_all(&self) {
        for tx in self.close_txs.lock().drain(..) {
            let _ = tx.send(());
        }
    }

    /// Makes the next worker-toolbox open fail.
    pub fn fail_next_open(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ToolboxHost for RecordingToolbox {
    fn open_addon_toolbox(&self, addon_id: &str) {
        self.addon_opens.lock().push(addon_id.to_string());
    }

    async fn open_worker_toolbox(&self, session: &WorkerSession) -> Result<SessionClosed> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Toolbox("toolbox open failed".to_string()));
        }
        self.worker_opens.lock().push(session.actor().to_string());
        let (tx, closed) = SessionClosed::pair();
        self.close_txs.lock().push(tx);
        Ok(closed)
    }
}
