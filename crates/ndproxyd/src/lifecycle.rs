//! Attach/detach of the packet interception hook
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-7: Boundary Protection - At most one interception hook is ever registered
//! - AU-12: Audit Record Generation - Lifecycle transitions are logged

use crate::error::{NdproxyError, Result};
use crate::filter::{HookArgs, HookId, PacketFilter};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Whether the hook is registered with the packet filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookState {
    Detached,
    Attached,
}

/// Two-state owner of the interception hook.
///
/// `attach` and `detach` are idempotent. The lock here guards only the hook
/// handle; list commits never take it.
pub struct HookLifecycleManager {
    filter: Arc<dyn PacketFilter>,
    args: HookArgs,
    hook: Mutex<Option<HookId>>,
}

impl HookLifecycleManager {
    pub fn new(filter: Arc<dyn PacketFilter>) -> Self {
        Self::with_args(filter, HookArgs::ndproxy())
    }

    pub fn with_args(filter: Arc<dyn PacketFilter>, args: HookArgs) -> Self {
        Self {
            filter,
            args,
            hook: Mutex::new(None),
        }
    }

    pub fn state(&self) -> HookState {
        match *self.hook.lock() {
            Some(_) => HookState::Attached,
            None => HookState::Detached,
        }
    }

    /// Register the hook unless it already is.
    ///
    /// If the filter creates the hook but refuses to link it, the created
    /// hook is removed again and the state stays `Detached`.
    #[instrument(skip(self))]
    pub fn attach(&self) -> Result<()> {
        let mut hook = self.hook.lock();
        if let Some(id) = *hook {
            debug!(hook = id.0, "hook already attached");
            return Ok(());
        }

        let id = self.filter.add_hook(&self.args).map_err(|e| {
            error!(error = %e, "packet filter refused hook, proxying disabled");
            NdproxyError::HookRegistrationFailed(e.to_string())
        })?;

        if let Err(e) = self.filter.link(id) {
            self.filter.remove_hook(id);
            error!(hook = id.0, error = %e, "hook link failed, proxying disabled");
            return Err(NdproxyError::HookRegistrationFailed(e.to_string()));
        }

        *hook = Some(id);
        info!(
            hook = id.0,
            module = self.args.module_name,
            rule = self.args.rule_name,
            "hook attached"
        );
        Ok(())
    }

    /// Remove the hook if registered.
    #[instrument(skip(self))]
    pub fn detach(&self) {
        match self.hook.lock().take() {
            Some(id) => {
                self.filter.remove_hook(id);
                info!(hook = id.0, "hook detached");
            }
            None => debug!("hook not attached, nothing to detach"),
        }
    }
}

impl std::fmt::Debug for HookLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookLifecycleManager")
            .field("args", &self.args)
            .field("state", &self.state())
            .finish()
    }
}
