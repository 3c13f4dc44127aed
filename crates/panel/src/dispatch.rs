//! Kind-specific debug action dispatch.
//!
//! `debug` is the single entry point the presentation layer calls when the
//! user asks to debug a target. Extensions launch an out-of-process toolbox
//! scoped to the add-on id; workers follow a two-phase protocol: attach the
//! worker actor, open a toolbox bound to the attached session, and detach
//! exactly once when the toolbox closes.

use crate::error::{Error, Result};
use async_trait::async_trait;
use rdbg_client::{ActorChannel, RemoteClient};
use rdbg_protocol::{DebugTarget, TargetKind};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// Presentation-side collaborator that opens debugging toolboxes.
///
/// The panel core never renders anything itself; it hands session handles to
/// this trait and reacts to the close signal it returns.
#[async_trait]
pub trait ToolboxHost: Send + Sync {
    /// Launches an out-of-process debugging session scoped to one add-on.
    /// Fire-and-forget: no result is awaited.
    fn open_addon_toolbox(&self, addon_id: &str);

    /// Opens a toolbox bound to an attached worker session.
    ///
    /// Resolves with a [`SessionClosed`] signal that fires when the toolbox
    /// is torn down.
    async fn open_worker_toolbox(&self, session: &WorkerSession) -> Result<SessionClosed>;
}

/// Signal that resolves when a toolbox is torn down.
///
/// Dropping the sending half counts as closed, so a toolbox that disappears
/// without an explicit close still releases its worker.
pub struct SessionClosed {
    rx: oneshot::Receiver<()>,
}

impl SessionClosed {
    /// Creates a connected (sender, signal) pair.
    pub fn pair() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Waits until the toolbox closes.
    pub async fn wait(self) {
        let _ = self.rx.await;
    }
}

/// An attached worker actor.
///
/// Created by a successful `attach` request; `detach` is issued at most
/// once no matter how many times it is called.
pub struct WorkerSession {
    channel: ActorChannel,
    detached: AtomicBool,
}

impl WorkerSession {
    /// Attaches to the worker identified by `actor`.
    pub async fn attach(client: Arc<dyn RemoteClient>, actor: &str) -> Result<Self> {
        let channel = ActorChannel::new(actor, client);
        let _: Value = channel.send_no_params("attach").await?;
        Ok(Self {
            channel,
            detached: AtomicBool::new(false),
        })
    }

    /// Returns the worker actor id this session is attached to.
    pub fn actor(&self) -> &str {
        self.channel.actor()
    }

    /// Detaches the worker. Later calls are no-ops.
    pub async fn detach(&self) -> Result<()> {
        if self.detached.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.channel.send_no_result("detach", Value::Null).await?;
        Ok(())
    }
}

/// Starts a debugging session for `target`.
///
/// Errors during attach or toolbox open propagate to the caller, which is
/// expected to surface them. An unrecognized target kind is a reportable
/// [`Error::UnsupportedTarget`], issued before any remote call.
pub async fn debug(
    target: &DebugTarget,
    client: &Arc<dyn RemoteClient>,
    toolbox: &Arc<dyn ToolboxHost>,
) -> Result<()> {
    match target.kind {
        TargetKind::Extension => {
            toolbox.open_addon_toolbox(&target.identity);
            Ok(())
        }
        TargetKind::ServiceWorker | TargetKind::SharedWorker | TargetKind::Worker => {
            let session = WorkerSession::attach(Arc::clone(client), &target.identity).await?;
            let closed = match toolbox.open_worker_toolbox(&session).await {
                Ok(closed) => closed,
                Err(error) => {
                    // The attach succeeded, so the worker must still be
                    // released even though no toolbox ever opened.
                    if let Err(detach_error) = session.detach().await {
                        tracing::warn!(error = %detach_error, "Detach after failed toolbox open failed");
                    }
                    return Err(error);
                }
            };
            tokio::spawn(async move {
                closed.wait().await;
                if let Err(error) = session.detach().await {
                    tracing::warn!(%error, "Detach after session close failed");
                }
            });
            Ok(())
        }
        TargetKind::Unknown => Err(Error::UnsupportedTarget(target.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, RecordingToolbox};
    use serde_json::json;
    use std::time::Duration;

    fn worker_target(actor: &str) -> DebugTarget {
        DebugTarget {
            name: format!("https://a.example/{actor}.js"),
            icon: crate::workers::WORKER_ICON.to_string(),
            kind: TargetKind::Worker,
            identity: actor.to_string(),
        }
    }

    async fn wait_for_request(fake: &Arc<FakeClient>, kind: &str) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if fake.requests().iter().any(|(_, k, _)| k == kind) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("request '{kind}' never issued"));
    }

    #[tokio::test]
    async fn worker_dispatch_attaches_then_opens_then_detaches_once() {
        let fake = FakeClient::new();
        fake.script("w1", "attach", json!({ "type": "attached" }));
        fake.script("w1", "detach", json!({ "type": "detached" }));
        let toolbox = RecordingToolbox::new();

        let client = fake.as_client();
        let host = toolbox.as_host();
        debug(&worker_target("w1"), &client, &host).await.unwrap();

        // Attach was issued before the toolbox opened, and no detach yet.
        let kinds: Vec<_> = fake.requests().into_iter().map(|(_, k, _)| k).collect();
        assert_eq!(kinds, ["attach"]);
        assert_eq!(toolbox.worker_opens(), ["w1"]);

        toolbox.close_all();
        wait_for_request(&fake, "detach").await;

        let detaches = fake
            .requests()
            .into_iter()
            .filter(|(_, k, _)| k == "detach")
            .count();
        assert_eq!(detaches, 1);
    }

    #[tokio::test]
    async fn unknown_kind_reports_without_remote_calls() {
        let fake = FakeClient::new();
        let toolbox = RecordingToolbox::new();

        let target: DebugTarget = serde_json::from_value(json!({
            "name": "mystery",
            "icon": "",
            "type": "bogus",
            "identity": "x1",
        }))
        .unwrap();
        assert_eq!(target.kind, TargetKind::Unknown);

        let client = fake.as_client();
        let host = toolbox.as_host();
        let err = debug(&target, &client, &host).await.unwrap_err();

        assert!(err.is_reportable());
        assert!(fake.requests().is_empty());
        assert!(toolbox.worker_opens().is_empty());
    }

    #[tokio::test]
    async fn extension_dispatch_is_fire_and_forget() {
        let fake = FakeClient::new();
        let toolbox = RecordingToolbox::new();

        let target = DebugTarget {
            name: "My Extension".to_string(),
            icon: crate::addons::EXTENSION_ICON.to_string(),
            kind: TargetKind::Extension,
            identity: "ext@a.example".to_string(),
        };

        let client = fake.as_client();
        let host = toolbox.as_host();
        debug(&target, &client, &host).await.unwrap();

        assert_eq!(toolbox.addon_opens(), ["ext@a.example"]);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn failed_attach_propagates() {
        let fake = FakeClient::new();
        let toolbox = RecordingToolbox::new();

        let client = fake.as_client();
        let host = toolbox.as_host();
        // No attach scripted for w9: the remote call fails.
        let err = debug(&worker_target("w9"), &client, &host).await.unwrap_err();

        assert!(matches!(err, Error::Client(_)));
        assert!(toolbox.worker_opens().is_empty());
    }

    #[tokio::test]
    async fn failed_toolbox_open_still_detaches() {
        let fake = FakeClient::new();
        fake.script("w2", "attach", json!({ "type": "attached" }));
        fake.script("w2", "detach", json!({ "type": "detached" }));
        let toolbox = RecordingToolbox::new();
        toolbox.fail_next_open();

        let client = fake.as_client();
        let host = toolbox.as_host();
        let result = debug(&worker_target("w2"), &client, &host).await;

        assert!(result.is_err());
        let kinds: Vec<_> = fake.requests().into_iter().map(|(_, k, _)| k).collect();
        assert_eq!(kinds, ["attach", "detach"]);
    }

    #[tokio::test]
    async fn detach_is_idempotent() {
        let fake = FakeClient::new();
        fake.script("w3", "attach", json!({ "type": "attached" }));
        fake.script("w3", "detach", json!({ "type": "detached" }));

        let session = WorkerSession::attach(fake.as_client(), "w3").await.unwrap();
        session.detach().await.unwrap();
        session.detach().await.unwrap();

        let detaches = fake
            .requests()
            .into_iter()
            .filter(|(_, k, _)| k == "detach")
            .count();
        assert_eq!(detaches, 1);
    }
}
