//! Watcher lifecycle: initial pass, event-driven re-aggregation, failure
//! atomicity, and strict stop semantics.

use rdbg::testing::{FakeClient, FakePrefs, FakeRegistry};
use rdbg::{
    AddonInfo, AddonsWatcher, DEBUG_ENABLED_PREF, DebugFlagWatcher, WatcherHandle, WorkerSnapshot,
    WorkersWatcher,
};
use rdbg_client::{ClientEvent, ROOT_ACTOR};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Makes watcher warn logs visible under RUST_LOG when a test fails.
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn addon(id: &str, debuggable: bool) -> AddonInfo {
    AddonInfo {
        id: id.to_string(),
        name: format!("{id} name"),
        icon_url: None,
        debuggable,
    }
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a publication")
        .expect("publication channel closed")
}

/// Asserts nothing arrives within a short grace period.
async fn assert_silent<T>(rx: &mut mpsc::UnboundedReceiver<T>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "unexpected publication");
}

#[tokio::test]
async fn addons_watcher_publishes_an_initial_snapshot() {
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true), addon("b", false)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handle = AddonsWatcher::start(registry.clone(), move |targets| {
        let _ = tx.send(targets);
    });

    let targets = recv(&mut rx).await;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].identity, "a");

    handle.stop();
}

#[tokio::test]
async fn install_triggers_exactly_one_reaggregation() {
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handle = AddonsWatcher::start(registry.clone(), move |targets| {
        let _ = tx.send(targets);
    });

    let initial = recv(&mut rx).await;
    assert_eq!(initial.len(), 1);
    assert_eq!(registry.enumerations(), 1);

    registry.install(addon("fresh", true));

    let updated = recv(&mut rx).await;
    assert_eq!(updated.len(), 2);
    assert!(updated.iter().any(|t| t.identity == "fresh"));
    assert_eq!(registry.enumerations(), 2);
    assert_silent(&mut rx).await;

    handle.stop();
}

#[tokio::test]
async fn uninstall_removes_the_target() {
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true), addon("b", true)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handle = AddonsWatcher::start(registry.clone(), move |targets| {
        let _ = tx.send(targets);
    });

    assert_eq!(recv(&mut rx).await.len(), 2);

    registry.uninstall("a");

    let updated = recv(&mut rx).await;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].identity, "b");

    handle.stop();
}

#[tokio::test]
async fn stopped_watcher_never_publishes_again() {
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handle = AddonsWatcher::start(registry.clone(), move |targets| {
        let _ = tx.send(targets);
    });
    let _ = recv(&mut rx).await;

    handle.stop();
    handle.stop(); // idempotent

    registry.install(addon("late", true));
    registry.install(addon("later", true));
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn dropping_the_handle_stops_the_watcher() {
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = AddonsWatcher::start(registry.clone(), move |targets| {
        let _ = tx.send(targets);
    });
    let _ = recv(&mut rx).await;

    drop(handle);

    registry.install(addon("late", true));
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn stopping_from_inside_the_callback_does_not_deadlock() {
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    // The callback stops its own watcher through a shared handle slot.
    let slot: Arc<Mutex<Option<WatcherHandle>>> = Arc::new(Mutex::new(None));
    let callback_slot = Arc::clone(&slot);
    let handle = AddonsWatcher::start(registry.clone(), move |targets| {
        if let Some(mut handle) = callback_slot.lock().unwrap().take() {
            handle.stop();
        }
        let _ = tx.send(targets);
    });
    // Single-threaded test runtime: the watcher task cannot run before the
    // next await, so the slot is filled ahead of the first publication.
    *slot.lock().unwrap() = Some(handle);

    let first = recv(&mut rx).await;
    assert_eq!(first.len(), 1);

    registry.install(addon("late", true));
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn failed_extension_pass_publishes_nothing() {
    init_logging();
    let registry = Arc::new(FakeRegistry::new(vec![addon("a", true)]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handle = AddonsWatcher::start(registry.clone(), move |targets| {
        let _ = tx.send(targets);
    });
    let _ = recv(&mut rx).await;

    registry.set_fail(true);
    registry.emit(rdbg::AddonEvent::Enabled);
    assert_silent(&mut rx).await;

    // Recovery: the next event after the registry comes back republished.
    registry.set_fail(false);
    registry.emit(rdbg::AddonEvent::Enabled);
    let recovered = recv(&mut rx).await;
    assert_eq!(recovered.len(), 1);

    handle.stop();
}

fn script_empty_worker_state(fake: &FakeClient) {
    fake.script(ROOT_ACTOR, "listWorkers", json!({ "workers": [] }));
    fake.script(ROOT_ACTOR, "listProcesses", json!({ "processes": [] }));
}

#[tokio::test]
async fn workers_watcher_reacts_to_either_list_change() {
    let fake = FakeClient::new();
    script_empty_worker_state(&fake);
    let (tx, mut rx) = mpsc::unbounded_channel::<WorkerSnapshot>();

    let mut handle = WorkersWatcher::start(fake.as_client(), move |snapshot| {
        let _ = tx.send(snapshot);
    });

    assert!(recv(&mut rx).await.is_empty());

    fake.script(
        ROOT_ACTOR,
        "listWorkers",
        json!({ "workers": [{ "actor": "w1", "url": "https://a.example/sw.js", "type": 2 }] }),
    );
    fake.emit(ClientEvent::WorkerListChanged);

    let after_worker_event = recv(&mut rx).await;
    assert_eq!(after_worker_event.service.len(), 1);

    fake.emit(ClientEvent::ProcessListChanged);
    let after_process_event = recv(&mut rx).await;
    assert_eq!(after_process_event, after_worker_event);

    handle.stop();
}

#[tokio::test]
async fn failed_worker_pass_keeps_the_previous_snapshot() {
    init_logging();
    let fake = FakeClient::new();
    script_empty_worker_state(&fake);
    let (tx, mut rx) = mpsc::unbounded_channel::<WorkerSnapshot>();

    let mut handle = WorkersWatcher::start(fake.as_client(), move |snapshot| {
        let _ = tx.send(snapshot);
    });
    let _ = recv(&mut rx).await;

    // A mid-pass failure must not publish a partial snapshot.
    fake.unscript(ROOT_ACTOR, "listProcesses");
    fake.emit(ClientEvent::WorkerListChanged);
    assert_silent(&mut rx).await;

    fake.script(ROOT_ACTOR, "listProcesses", json!({ "processes": [] }));
    fake.emit(ClientEvent::WorkerListChanged);
    let recovered = recv(&mut rx).await;
    assert!(recovered.is_empty());

    handle.stop();
}

#[tokio::test]
async fn debug_flag_watcher_publishes_the_disabled_state() {
    let prefs = Arc::new(FakePrefs::new());
    let (tx, mut rx) = mpsc::unbounded_channel::<bool>();

    let mut handle = DebugFlagWatcher::start(prefs.clone(), move |disabled| {
        let _ = tx.send(disabled);
    });

    // Preference unset reads false, so debugging starts disabled.
    assert!(recv(&mut rx).await);

    prefs.set_bool(DEBUG_ENABLED_PREF, true);
    assert!(!recv(&mut rx).await);

    // Unrelated keys do not republish.
    prefs.set_bool("devtools.unrelated", true);
    assert_silent(&mut rx).await;

    prefs.set_bool(DEBUG_ENABLED_PREF, false);
    assert!(recv(&mut rx).await);

    handle.stop();
    prefs.set_bool(DEBUG_ENABLED_PREF, true);
    assert_silent(&mut rx).await;
}
