//! Extension-family target aggregation.

use crate::error::Result;
use crate::host::AddonRegistry;
use rdbg_protocol::{DebugTarget, TargetKind};

/// Fallback icon for add-ons that provide none.
pub const EXTENSION_ICON: &str = "chrome://mozapps/skin/extensions/extensionGeneric.svg";

/// Produces the current list of debuggable extension targets.
///
/// Enumerates the host registry, keeps only entries the host marks as
/// debuggable (non-debuggable entries are silently excluded, not errors),
/// and maps each to a render-ready [`DebugTarget`]. Ordering follows the
/// registry's enumeration order. Pure read, no side effects.
pub async fn list_extension_targets(registry: &dyn AddonRegistry) -> Result<Vec<DebugTarget>> {
    let addons = registry.all_addons().await?;
    let targets = addons
        .into_iter()
        .filter(|addon| addon.debuggable)
        .map(|addon| DebugTarget {
            name: addon.name,
            icon: addon.icon_url.unwrap_or_else(|| EXTENSION_ICON.to_string()),
            kind: TargetKind::Extension,
            identity: addon.id,
        })
        .collect();
    Ok(targets)
}
