//! Module lifecycle: load/unload wiring of store, counter, hook and admin tree
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-7: Least Functionality - Only load and unload are honoured
//! - CP-10: System Recovery - Unload returns every component to its initial state
//! - AU-12: Audit Record Generation - Host events are logged

use crate::admin::AdminSurface;
use crate::counter::PacketCounter;
use crate::error::{NdproxyError, Result};
use crate::filter::PacketFilter;
use crate::lifecycle::{HookLifecycleManager, HookState};
use crate::metrics::MetricsCollector;
use crate::store::{AddressListStore, ConfigSnapshot};
use arc_swap::Guard;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Lifecycle events delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleEvent {
    Load,
    Unload,
    Shutdown,
    Quiesce,
}

impl fmt::Display for ModuleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleEvent::Load => "load",
            ModuleEvent::Unload => "unload",
            ModuleEvent::Shutdown => "shutdown",
            ModuleEvent::Quiesce => "quiesce",
        };
        f.write_str(name)
    }
}

/// What the interception hook gets: the committed lists and the counter.
#[derive(Debug, Clone)]
pub struct HookContext {
    store: Arc<AddressListStore>,
    counter: Arc<PacketCounter>,
}

impl HookContext {
    /// Current configuration, read without locking.
    #[inline]
    pub fn snapshot(&self) -> Guard<Arc<ConfigSnapshot>> {
        self.store.load()
    }

    /// Record one processed packet.
    #[inline]
    pub fn count_packet(&self) -> u64 {
        self.counter.increment()
    }
}

/// The ND proxy configuration module.
pub struct NdproxyModule {
    store: Arc<AddressListStore>,
    counter: Arc<PacketCounter>,
    lifecycle: Arc<HookLifecycleManager>,
    admin: AdminSurface,
    metrics: MetricsCollector,
    attach_on_load: bool,
}

impl NdproxyModule {
    pub const NAME: &'static str = "ndproxy";

    pub fn new(filter: Arc<dyn PacketFilter>) -> Result<Self> {
        let store = Arc::new(AddressListStore::new());
        let counter = Arc::new(PacketCounter::new());
        let lifecycle = Arc::new(HookLifecycleManager::new(filter));
        let metrics = MetricsCollector::new()?;
        let admin = AdminSurface::new(
            Arc::clone(&store),
            Arc::clone(&counter),
            Arc::clone(&lifecycle),
            metrics.clone(),
        );

        Ok(Self {
            store,
            counter,
            lifecycle,
            admin,
            metrics,
            attach_on_load: true,
        })
    }

    /// Leave the hook detached on Load; the first `packet_count` read attaches it.
    pub fn with_attach_on_load(mut self, attach: bool) -> Self {
        self.attach_on_load = attach;
        self
    }

    /// Handle a host lifecycle event.
    ///
    /// A refused hook on Load is returned to the caller, but the admin tree
    /// remains usable.
    #[instrument(skip(self), fields(module = Self::NAME))]
    pub fn handle_event(&self, event: ModuleEvent) -> Result<()> {
        match event {
            ModuleEvent::Load => {
                info!("loading");
                let attached = if self.attach_on_load {
                    self.lifecycle.attach()
                } else {
                    Ok(())
                };
                self.metrics.set_hook_state(self.lifecycle.state());
                if let Err(e) = &attached {
                    error!(error = %e, "loaded without interception hook");
                }
                attached
            }
            ModuleEvent::Unload => {
                info!("unloading");
                self.lifecycle.detach();
                self.store.reset();
                self.counter.reset();
                self.metrics.set_hook_state(self.lifecycle.state());
                Ok(())
            }
            other => {
                warn!(event = %other, "unsupported module event");
                Err(NdproxyError::UnsupportedEvent(other.to_string()))
            }
        }
    }

    pub fn admin(&self) -> &AdminSurface {
        &self.admin
    }

    pub fn hook_state(&self) -> HookState {
        self.lifecycle.state()
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.store.snapshot()
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Handle for the packet path.
    pub fn hook_context(&self) -> HookContext {
        HookContext {
            store: Arc::clone(&self.store),
            counter: Arc::clone(&self.counter),
        }
    }
}

impl fmt::Debug for NdproxyModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdproxyModule")
            .field("store", &self.store)
            .field("admin", &self.admin)
            .field("attach_on_load", &self.attach_on_load)
            .finish()
    }
}
