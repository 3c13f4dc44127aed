//! The [`RemoteClient`] trait and its typed request helpers.
//!
//! A connection implementation routes requests to actors and surfaces
//! server-pushed list-change notifications. The panel core never sees
//! framing or correlation; it addresses actors by id and awaits replies.

use crate::error::{Error, Result};
use rdbg_protocol::{GetProcessReply, ListProcessesReply, ListWorkersReply};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Actor id of the top-level (root) actor.
pub const ROOT_ACTOR: &str = "root";

/// Type alias for boxed futures returned across the trait-object seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Server-pushed notifications the panel core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// The set of workers known to some process changed.
    WorkerListChanged,
    /// The set of content processes changed.
    ProcessListChanged,
}

/// Request/response and event-subscription surface of a live connection.
///
/// Implementations serialize the `(to, type, params)` triple into whatever
/// packet shape the transport speaks and correlate the reply. Fakes in
/// tests route on the same triple.
pub trait RemoteClient: Send + Sync {
    /// Sends a request to the actor `to` and awaits the reply payload.
    fn request(&self, to: &str, kind: &str, params: Value) -> BoxFuture<'_, Result<Value>>;

    /// Subscribes to list-change notifications.
    ///
    /// Events emitted before subscription are not received.
    fn events(&self) -> broadcast::Receiver<ClientEvent>;
}

/// Typed request proxy bound to one actor id.
///
/// Every remote entity the core talks to (the root actor, process actors,
/// worker actors) is addressed through an `ActorChannel`, which handles the
/// serde round-trip around [`RemoteClient::request`].
#[derive(Clone)]
pub struct ActorChannel {
    actor: Arc<str>,
    client: Arc<dyn RemoteClient>,
}

impl ActorChannel {
    /// Creates a channel addressing `actor` over `client`.
    pub fn new(actor: impl Into<Arc<str>>, client: Arc<dyn RemoteClient>) -> Self {
        Self {
            actor: actor.into(),
            client,
        }
    }

    /// Sends a request and deserializes the reply.
    pub async fn send<P: Serialize, R: DeserializeOwned>(&self, kind: &str, params: P) -> Result<R> {
        let params_value = serde_json::to_value(params)?;
        tracing::debug!(actor = %self.actor, kind, "Sending request");
        let reply = self.client.request(&self.actor, kind, params_value).await?;
        serde_json::from_value(reply).map_err(Into::into)
    }

    /// Sends a request with no parameters.
    pub async fn send_no_params<R: DeserializeOwned>(&self, kind: &str) -> Result<R> {
        self.send(kind, Value::Null).await
    }

    /// Sends a request whose reply payload is discarded.
    pub async fn send_no_result<P: Serialize>(&self, kind: &str, params: P) -> Result<()> {
        let _: Value = self.send(kind, params).await?;
        Ok(())
    }

    /// Returns the actor id this channel addresses.
    pub fn actor(&self) -> &str {
        &self.actor
    }
}

/// Convenience requests against the root actor.
pub struct RootActor {
    channel: ActorChannel,
}

impl RootActor {
    /// Creates a root-actor wrapper over `client`.
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            channel: ActorChannel::new(ROOT_ACTOR, client),
        }
    }

    /// Lists the workers known to the top-level process.
    pub async fn list_workers(&self) -> Result<ListWorkersReply> {
        self.channel.send_no_params("listWorkers").await
    }

    /// Lists all known processes.
    pub async fn list_processes(&self) -> Result<ListProcessesReply> {
        self.channel.send_no_params("listProcesses").await
    }

    /// Resolves the actor form for the process with the given id.
    pub async fn get_process(&self, id: u64) -> Result<GetProcessReply> {
        self.channel
            .send("getProcess", serde_json::json!({ "id": id }))
            .await
    }
}

/// Converts a server error payload (`{ "error": ..., "message": ... }`)
/// into [`Error::Remote`], or returns the payload unchanged.
pub fn check_reply(reply: Value) -> Result<Value> {
    if let Some(name) = reply.get("error").and_then(Value::as_str) {
        let message = reply
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(Error::Remote {
            name: name.to_string(),
            message,
        });
    }
    Ok(reply)
}
