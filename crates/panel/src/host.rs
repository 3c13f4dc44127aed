//! Host-collaborator seams.
//!
//! The panel core reaches the host through two injected services: the
//! add-on registry (enumeration plus install/uninstall/enable/disable
//! notifications) and the preference store (one boolean flag plus change
//! notifications). Both are traits so tests substitute fakes; the real
//! implementations live with the embedding application.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Preference key gating whether debugging is offered at all.
pub const DEBUG_ENABLED_PREF: &str = "devtools.chrome.enabled";

/// One installed add-on as reported by the host registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInfo {
    /// Add-on id, used to scope a debugging session.
    pub id: String,
    /// Human-readable add-on name.
    pub name: String,
    /// Add-on-provided icon reference, if any.
    pub icon_url: Option<String>,
    /// Whether the host marks this add-on as debuggable.
    pub debuggable: bool,
}

/// Add-on lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonEvent {
    Installed,
    Uninstalled,
    Enabled,
    Disabled,
}

/// Host add-on registry: enumeration and lifecycle notifications.
#[async_trait]
pub trait AddonRegistry: Send + Sync {
    /// Enumerates all installed add-ons, in the host's enumeration order.
    async fn all_addons(&self) -> Result<Vec<AddonInfo>>;

    /// Subscribes to add-on lifecycle notifications.
    fn addon_events(&self) -> broadcast::Receiver<AddonEvent>;
}

/// Host preference store: boolean reads and change notifications.
pub trait PrefStore: Send + Sync {
    /// Reads a boolean preference; missing keys read as false.
    fn get_bool(&self, key: &str) -> bool;

    /// Subscribes to preference changes; the payload is the changed key.
    fn changes(&self) -> broadcast::Receiver<String>;
}
