//! Packet interception substrate
//!
//! The proxy hook is attached to an IPv6 packet filter head in two steps:
//! the hook is created, then linked to the head. [`PacketFilter`] is the
//! seam to whatever provides that mechanism. [`InProcessFilter`] keeps the
//! registrations in memory for the control tool and for tests.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-7: Boundary Protection - Inbound IPv6 interception point
//! - AU-12: Audit Record Generation - Hook registration is logged

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Handle on a created hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub u64);

/// Description of the hook to create. Hooks are always inbound IPv6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookArgs {
    pub module_name: &'static str,
    pub rule_name: &'static str,
}

impl HookArgs {
    /// The inbound IPv6 hook of the ND proxy.
    pub const fn ndproxy() -> Self {
        Self {
            module_name: "ndproxy",
            rule_name: "default-in6",
        }
    }
}

impl Default for HookArgs {
    fn default() -> Self {
        Self::ndproxy()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("hook creation refused: {0}")]
    AddRefused(String),

    #[error("linking hook to the inet6 filter head failed: {0}")]
    LinkFailed(String),
}

/// Something that can create, link and remove packet hooks.
#[cfg_attr(test, mockall::automock)]
pub trait PacketFilter: Send + Sync {
    /// Create a hook; it sees no packets until linked.
    fn add_hook(&self, args: &HookArgs) -> Result<HookId, FilterError>;

    /// Link a created hook to the inet6 filter head.
    fn link(&self, hook: HookId) -> Result<(), FilterError>;

    /// Unlink and destroy a hook. Unknown ids are ignored.
    fn remove_hook(&self, hook: HookId);
}

#[derive(Debug, Default)]
struct InProcessState {
    next_id: u64,
    hooks: Vec<(HookId, HookArgs, bool)>,
    refuse_link: bool,
    add_calls: usize,
    remove_calls: usize,
}

/// In-memory packet filter.
///
/// Records created and linked hooks. Can be told to refuse linking to
/// exercise registration failure.
#[derive(Debug, Default)]
pub struct InProcessFilter {
    state: Mutex<InProcessState>,
}

impl InProcessFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter whose head refuses every link.
    pub fn refusing() -> Self {
        let filter = Self::default();
        filter.set_refuse_link(true);
        filter
    }

    pub fn set_refuse_link(&self, refuse: bool) {
        self.state.lock().refuse_link = refuse;
    }

    /// Number of hooks currently linked to the head.
    pub fn linked_hooks(&self) -> usize {
        self.state.lock().hooks.iter().filter(|(_, _, linked)| *linked).count()
    }

    /// Number of hooks that exist, linked or not.
    pub fn live_hooks(&self) -> usize {
        self.state.lock().hooks.len()
    }

    pub fn add_calls(&self) -> usize {
        self.state.lock().add_calls
    }

    pub fn remove_calls(&self) -> usize {
        self.state.lock().remove_calls
    }
}

impl PacketFilter for InProcessFilter {
    fn add_hook(&self, args: &HookArgs) -> Result<HookId, FilterError> {
        let mut state = self.state.lock();
        state.add_calls += 1;
        state.next_id += 1;
        let id = HookId(state.next_id);
        state.hooks.push((id, args.clone(), false));
        debug!(hook = id.0, module = args.module_name, rule = args.rule_name, "hook created");
        Ok(id)
    }

    fn link(&self, hook: HookId) -> Result<(), FilterError> {
        let mut state = self.state.lock();
        if state.refuse_link {
            return Err(FilterError::LinkFailed("filter head refused link".to_string()));
        }
        match state.hooks.iter_mut().find(|(id, _, _)| *id == hook) {
            Some((_, _, linked)) => {
                *linked = true;
                Ok(())
            }
            None => Err(FilterError::LinkFailed(format!("no hook with id {}", hook.0))),
        }
    }

    fn remove_hook(&self, hook: HookId) {
        let mut state = self.state.lock();
        state.remove_calls += 1;
        state.hooks.retain(|(id, _, _)| *id != hook);
        debug!(hook = hook.0, "hook removed");
    }
}
