//! Administrative surface: the `net.inet6.ndproxy` node tree
//!
//! Five list nodes and the packet counter, each read and written as text.
//! Reads of `packet_count` also make sure the interception hook is attached.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-6: Configuration Settings - Runtime-configurable proxy lists
//! - AU-12: Audit Record Generation - Every write outcome is logged and counted

use crate::applier::ConfigApplier;
use crate::counter::PacketCounter;
use crate::error::{NdproxyError, Result};
use crate::lifecycle::HookLifecycleManager;
use crate::metrics::MetricsCollector;
use crate::store::AddressListStore;
use crate::types::ListKind;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Parent of every node name.
pub const NODE_PREFIX: &str = "net.inet6.ndproxy";

/// One node of the administrative tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminNode {
    List(ListKind),
    PacketCount,
}

impl AdminNode {
    pub const ALL: [AdminNode; ListKind::COUNT + 1] = [
        AdminNode::List(ListKind::DownlinkMac),
        AdminNode::List(ListKind::UplinkIface),
        AdminNode::List(ListKind::ExceptionAddr),
        AdminNode::List(ListKind::UplinkAddr),
        AdminNode::List(ListKind::UplinkMac),
        AdminNode::PacketCount,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            AdminNode::List(kind) => kind.node_name(),
            AdminNode::PacketCount => "packet_count",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            AdminNode::List(kind) => kind.description(),
            AdminNode::PacketCount => "fire an event",
        }
    }

    /// Fully qualified name, e.g. `net.inet6.ndproxy.uplink_addr_list`.
    pub fn qualified_name(&self) -> String {
        format!("{NODE_PREFIX}.{}", self.name())
    }
}

impl fmt::Display for AdminNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdminNode {
    type Err = NdproxyError;

    /// Accepts short or fully qualified node names.
    fn from_str(s: &str) -> Result<Self> {
        let short = s
            .strip_prefix(NODE_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|node| node.name() == short)
            .ok_or_else(|| NdproxyError::UnknownNode(s.to_string()))
    }
}

/// Synchronous read/write access to every node.
pub struct AdminSurface {
    appliers: [ConfigApplier; ListKind::COUNT],
    counter: Arc<PacketCounter>,
    lifecycle: Arc<HookLifecycleManager>,
    metrics: MetricsCollector,
}

impl AdminSurface {
    pub fn new(
        store: Arc<AddressListStore>,
        counter: Arc<PacketCounter>,
        lifecycle: Arc<HookLifecycleManager>,
        metrics: MetricsCollector,
    ) -> Self {
        let appliers = ListKind::ALL.map(|kind| ConfigApplier::new(kind, Arc::clone(&store)));
        Self {
            appliers,
            counter,
            lifecycle,
            metrics,
        }
    }

    pub fn applier(&self, kind: ListKind) -> &ConfigApplier {
        &self.appliers[kind.index()]
    }

    /// Current value of `node` in write format.
    pub fn read(&self, node: AdminNode) -> String {
        match node {
            AdminNode::List(kind) => self.applier(kind).read(),
            AdminNode::PacketCount => self.read_packet_count().to_string(),
        }
    }

    /// Write `value` to `node`. Failed writes change nothing.
    #[instrument(skip_all, fields(node = %node))]
    pub fn write(&self, node: AdminNode, value: &str) -> Result<()> {
        match node {
            AdminNode::List(kind) => match self.applier(kind).apply(value) {
                Ok(_) => {
                    self.metrics.record_commit(kind);
                    Ok(())
                }
                Err(e) => {
                    self.metrics.record_rejection(kind, e.reason());
                    Err(e)
                }
            },
            AdminNode::PacketCount => {
                let count = value.trim().parse::<u64>().map_err(|_| {
                    warn!(value, "rejected packet_count write");
                    NdproxyError::InvalidCount(value.to_string())
                })?;
                self.counter.set(count);
                info!(count, "packet_count set");
                Ok(())
            }
        }
    }

    pub fn read_by_name(&self, name: &str) -> Result<String> {
        Ok(self.read(name.parse()?))
    }

    pub fn write_by_name(&self, name: &str, value: &str) -> Result<()> {
        self.write(name.parse()?, value)
    }

    /// Counter value, attaching the hook first if it is missing.
    ///
    /// A refused attach is logged and the count is still returned: the node
    /// stays queryable while proxying is down.
    pub fn read_packet_count(&self) -> u64 {
        if let Err(e) = self.lifecycle.attach() {
            warn!(error = %e, "hook still detached after packet_count query");
        }
        self.metrics.set_hook_state(self.lifecycle.state());
        self.counter.get()
    }
}

impl fmt::Debug for AdminSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSurface")
            .field("packet_count", &self.counter.get())
            .field("hook", &self.lifecycle.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::InProcessFilter;
    use crate::lifecycle::HookState;
    use pretty_assertions::assert_eq;

    struct Fixture {
        admin: AdminSurface,
        filter: Arc<InProcessFilter>,
        lifecycle: Arc<HookLifecycleManager>,
        metrics: MetricsCollector,
    }

    fn fixture(filter: InProcessFilter) -> Fixture {
        let filter = Arc::new(filter);
        let lifecycle = Arc::new(HookLifecycleManager::new(filter.clone()));
        let metrics = MetricsCollector::new().unwrap();
        let admin = AdminSurface::new(
            Arc::new(AddressListStore::new()),
            Arc::new(PacketCounter::new()),
            Arc::clone(&lifecycle),
            metrics.clone(),
        );
        Fixture {
            admin,
            filter,
            lifecycle,
            metrics,
        }
    }

    #[test]
    fn test_node_names() {
        assert_eq!(
            "uplink_addr_list".parse::<AdminNode>().unwrap(),
            AdminNode::List(ListKind::UplinkAddr)
        );
        assert_eq!(
            "net.inet6.ndproxy.packet_count".parse::<AdminNode>().unwrap(),
            AdminNode::PacketCount
        );
        assert!(matches!(
            "net.inet6.ndproxy.".parse::<AdminNode>(),
            Err(NdproxyError::UnknownNode(_))
        ));
        assert!("net.inet6.ndproxyuplink_addr_list".parse::<AdminNode>().is_err());
        assert_eq!(
            AdminNode::List(ListKind::ExceptionAddr).qualified_name(),
            "net.inet6.ndproxy.exception_addr_list"
        );
        assert_eq!(AdminNode::PacketCount.description(), "fire an event");
    }

    #[test]
    fn test_mac_iface_alignment_scenario() {
        let f = fixture(InProcessFilter::new());
        f.admin
            .write_by_name("downlink_mac_list", "aa:bb:cc:dd:ee:ff 11:22:33:44:55:66")
            .unwrap();
        f.admin.write_by_name("uplink_iface_list", "em0 em1").unwrap();

        assert_eq!(f.admin.read_by_name("uplink_iface_list").unwrap(), "em0 em1");
        assert_eq!(
            f.admin.read_by_name("downlink_mac_list").unwrap(),
            "aa:bb:cc:dd:ee:ff 11:22:33:44:55:66"
        );
    }

    #[test]
    fn test_packet_count_read_attaches_hook() {
        let f = fixture(InProcessFilter::new());
        assert_eq!(f.lifecycle.state(), HookState::Detached);

        assert_eq!(f.admin.read(AdminNode::PacketCount), "0");
        assert_eq!(f.lifecycle.state(), HookState::Attached);
        assert_eq!(f.metrics.hook_attached.get(), 1);

        f.admin.read(AdminNode::PacketCount);
        assert_eq!(f.filter.add_calls(), 1);
    }

    #[test]
    fn test_packet_count_readable_when_attach_refused() {
        let f = fixture(InProcessFilter::refusing());
        f.admin.write(AdminNode::PacketCount, "41").unwrap();
        assert_eq!(f.admin.read(AdminNode::PacketCount), "41");
        assert_eq!(f.lifecycle.state(), HookState::Detached);
        assert_eq!(f.filter.live_hooks(), 0);
    }

    #[test]
    fn test_packet_count_write_rejects_garbage() {
        let f = fixture(InProcessFilter::new());
        f.admin.write(AdminNode::PacketCount, "12").unwrap();
        for bad in ["", "-1", "twelve", "1.5"] {
            assert!(matches!(
                f.admin.write(AdminNode::PacketCount, bad),
                Err(NdproxyError::InvalidCount(_))
            ));
        }
        assert_eq!(f.admin.read(AdminNode::PacketCount), "12");
    }

    #[test]
    fn test_write_outcomes_counted() {
        let f = fixture(InProcessFilter::new());
        f.admin.write_by_name("exception_addr_list", "fe80::1").unwrap();
        f.admin
            .write_by_name("exception_addr_list", "fe80::1 nope")
            .unwrap_err();

        assert_eq!(
            f.metrics
                .writes_committed_total
                .with_label_values(&["exception_addr_list"])
                .get(),
            1
        );
        assert_eq!(
            f.metrics
                .writes_rejected_total
                .with_label_values(&["exception_addr_list", "validation"])
                .get(),
            1
        );
        assert_eq!(f.admin.read_by_name("exception_addr_list").unwrap(), "fe80::1");
    }

    #[test]
    fn test_unknown_node() {
        let f = fixture(InProcessFilter::new());
        assert!(matches!(
            f.admin.write_by_name("uplink_router_list", "fe80::1"),
            Err(NdproxyError::UnknownNode(_))
        ));
    }
}
