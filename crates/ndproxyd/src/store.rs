//! Committed configuration and its atomic publication
//!
//! The current configuration lives in one immutable [`ConfigSnapshot`]
//! behind an `ArcSwap`. Readers, including the packet hook, load it without
//! locking; writers build a complete replacement and swap it in as a unit.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-3: Configuration Change Control - Whole-list replacement only
//! - SI-7: Software, Firmware, and Information Integrity - No partial state is observable

use crate::error::{NdproxyError, Result};
use crate::types::{ConfigList, ListKind, EXCEPTION_MAX, UP_IFACE_MAX, UPLINK_MAX};
use arc_swap::{ArcSwap, Guard};
use ndproxy_types::{InterfaceName, Ipv6Address, MacAddress};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// One consistent view of every list.
///
/// `version` increases by one on every commit or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub downlink_macs: ConfigList<MacAddress>,
    pub uplink_ifaces: ConfigList<InterfaceName>,
    pub exception_addrs: ConfigList<Ipv6Address>,
    pub uplink_addrs: ConfigList<Ipv6Address>,
    pub uplink_macs: ConfigList<MacAddress>,
}

impl ConfigSnapshot {
    fn empty(version: u64) -> Self {
        Self {
            version,
            downlink_macs: ConfigList::empty(UP_IFACE_MAX),
            uplink_ifaces: ConfigList::empty(UP_IFACE_MAX),
            exception_addrs: ConfigList::empty(EXCEPTION_MAX),
            uplink_addrs: ConfigList::empty(UPLINK_MAX),
            uplink_macs: ConfigList::empty(UPLINK_MAX),
        }
    }

    /// Whether `addr` is a configured uplink router.
    #[inline]
    pub fn is_uplink_router(&self, addr: &Ipv6Address) -> bool {
        self.uplink_addrs.contains(addr)
    }

    /// Whether `addr` is excluded from proxying.
    #[inline]
    pub fn is_exception(&self, addr: &Ipv6Address) -> bool {
        self.exception_addrs.contains(addr)
    }

    /// Position of `name` in the uplink interface list.
    pub fn iface_index(&self, name: &str) -> Option<usize> {
        self.uplink_ifaces.iter().position(|iface| iface.as_str() == name)
    }

    /// Downlink MAC to present on interface `name`.
    pub fn downlink_mac_for(&self, name: &str) -> Option<&MacAddress> {
        self.iface_index(name)
            .and_then(|index| self.downlink_macs.get(index))
    }

    /// Interface and its downlink MAC at `index`, if the interface slot is set.
    pub fn iface_binding(&self, index: usize) -> Option<(&InterfaceName, Option<&MacAddress>)> {
        self.uplink_ifaces
            .get(index)
            .map(|iface| (iface, self.downlink_macs.get(index)))
    }

    pub fn count(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::DownlinkMac => self.downlink_macs.count(),
            ListKind::UplinkIface => self.uplink_ifaces.count(),
            ListKind::ExceptionAddr => self.exception_addrs.count(),
            ListKind::UplinkAddr => self.uplink_addrs.count(),
            ListKind::UplinkMac => self.uplink_macs.count(),
        }
    }

    pub fn is_configured(&self, kind: ListKind) -> bool {
        match kind {
            ListKind::DownlinkMac => self.downlink_macs.is_configured(),
            ListKind::UplinkIface => self.uplink_ifaces.is_configured(),
            ListKind::ExceptionAddr => self.exception_addrs.is_configured(),
            ListKind::UplinkAddr => self.uplink_addrs.is_configured(),
            ListKind::UplinkMac => self.uplink_macs.is_configured(),
        }
    }

    /// Render one list in the administrative text format.
    pub fn render(&self, kind: ListKind) -> String {
        match kind {
            ListKind::DownlinkMac => self.downlink_macs.render(),
            ListKind::UplinkIface => self.uplink_ifaces.render(),
            ListKind::ExceptionAddr => self.exception_addrs.render(),
            ListKind::UplinkAddr => self.uplink_addrs.render(),
            ListKind::UplinkMac => self.uplink_macs.render(),
        }
    }

    fn blank_from(&mut self, kind: ListKind, len: usize) {
        match kind {
            ListKind::DownlinkMac => self.downlink_macs.blank_from(len),
            ListKind::UplinkIface => self.uplink_ifaces.blank_from(len),
            ListKind::ExceptionAddr => self.exception_addrs.blank_from(len),
            ListKind::UplinkAddr => self.uplink_addrs.blank_from(len),
            ListKind::UplinkMac => self.uplink_macs.blank_from(len),
        }
    }
}

/// A validated replacement for exactly one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListUpdate {
    DownlinkMacs(Vec<MacAddress>),
    UplinkIfaces(Vec<InterfaceName>),
    ExceptionAddrs(Vec<Ipv6Address>),
    UplinkAddrs(Vec<Ipv6Address>),
    UplinkMacs(Vec<MacAddress>),
}

impl ListUpdate {
    pub fn kind(&self) -> ListKind {
        match self {
            ListUpdate::DownlinkMacs(_) => ListKind::DownlinkMac,
            ListUpdate::UplinkIfaces(_) => ListKind::UplinkIface,
            ListUpdate::ExceptionAddrs(_) => ListKind::ExceptionAddr,
            ListUpdate::UplinkAddrs(_) => ListKind::UplinkAddr,
            ListUpdate::UplinkMacs(_) => ListKind::UplinkMac,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ListUpdate::DownlinkMacs(v) | ListUpdate::UplinkMacs(v) => v.len(),
            ListUpdate::UplinkIfaces(v) => v.len(),
            ListUpdate::ExceptionAddrs(v) | ListUpdate::UplinkAddrs(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide holder of the committed configuration.
///
/// Writers serialize on a private mutex that readers never touch, so a
/// reader is never blocked by a writer and a writer never waits on packet
/// processing.
pub struct AddressListStore {
    current: ArcSwap<ConfigSnapshot>,
    writer: Mutex<()>,
}

impl AddressListStore {
    /// A store with every list empty and unconfigured.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ConfigSnapshot::empty(0)),
            writer: Mutex::new(()),
        }
    }

    /// Borrow the current snapshot without touching the reference count.
    ///
    /// This is the packet-path read: lock-free and allocation-free.
    #[inline]
    pub fn load(&self) -> Guard<Arc<ConfigSnapshot>> {
        self.current.load()
    }

    /// Owned handle on the current snapshot.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Replace one list as a unit and publish the new snapshot.
    ///
    /// An update longer than the list's capacity is rejected and nothing is
    /// published. When a list of the interface/MAC pair shrinks, slots at the
    /// new length and beyond are blanked in both lists.
    ///
    /// Returns the version of the published snapshot.
    pub fn commit(&self, update: ListUpdate) -> Result<u64> {
        let kind = update.kind();
        let new_len = update.len();
        if new_len > kind.capacity() {
            return Err(NdproxyError::CapacityExceeded {
                kind,
                capacity: kind.capacity(),
            });
        }

        let _writer = self.writer.lock();
        let current = self.current.load_full();
        let old_len = current.count(kind);

        let mut next = ConfigSnapshot::clone(&current);
        next.version = current.version + 1;
        match update {
            ListUpdate::DownlinkMacs(macs) => {
                next.downlink_macs = ConfigList::configured(macs, UP_IFACE_MAX);
            }
            ListUpdate::UplinkIfaces(names) => {
                next.uplink_ifaces = ConfigList::configured(names, UP_IFACE_MAX);
            }
            ListUpdate::ExceptionAddrs(addrs) => {
                next.exception_addrs = ConfigList::configured(addrs, EXCEPTION_MAX);
            }
            ListUpdate::UplinkAddrs(addrs) => {
                next.uplink_addrs = ConfigList::configured(addrs, UPLINK_MAX);
            }
            ListUpdate::UplinkMacs(macs) => {
                next.uplink_macs = ConfigList::configured(macs, UPLINK_MAX);
            }
        }

        if let Some(partner) = kind.aligned_partner() {
            if new_len < old_len && next.count(partner) > new_len {
                debug!(
                    list = %kind,
                    partner = %partner,
                    from = new_len,
                    "blanking trailing index-aligned slots"
                );
                next.blank_from(partner, new_len);
            }
        }

        let version = next.version;
        self.current.store(Arc::new(next));
        Ok(version)
    }

    /// Drop every list back to empty and unconfigured.
    pub fn reset(&self) -> u64 {
        let _writer = self.writer.lock();
        let version = self.current.load().version + 1;
        self.current.store(Arc::new(ConfigSnapshot::empty(version)));
        info!(version, "configuration reset");
        version
    }
}

impl Default for AddressListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AddressListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("AddressListStore")
            .field("version", &snapshot.version)
            .field("downlink_macs", &snapshot.downlink_macs.count())
            .field("uplink_ifaces", &snapshot.uplink_ifaces.count())
            .field("exception_addrs", &snapshot.exception_addrs.count())
            .field("uplink_addrs", &snapshot.uplink_addrs.count())
            .field("uplink_macs", &snapshot.uplink_macs.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn macs(tokens: &[&str]) -> Vec<MacAddress> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn ifaces(tokens: &[&str]) -> Vec<InterfaceName> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn addrs(tokens: &[&str]) -> Vec<Ipv6Address> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn test_starts_empty_and_unconfigured() {
        let store = AddressListStore::new();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, 0);
        for kind in ListKind::ALL {
            assert_eq!(snapshot.count(kind), 0);
            assert!(!snapshot.is_configured(kind));
            assert_eq!(snapshot.render(kind), "");
        }
    }

    #[test]
    fn test_commit_replaces_whole_list() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::UplinkAddrs(addrs(&["fe80::1", "fe80::2", "fe80::3"]))).unwrap();
        let version = store.commit(ListUpdate::UplinkAddrs(addrs(&["2001:db8::1"]))).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(version, 2);
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.render(ListKind::UplinkAddr), "2001:db8::1");
        assert!(snapshot.is_configured(ListKind::UplinkAddr));
        assert!(!snapshot.is_configured(ListKind::ExceptionAddr));
    }

    #[test]
    fn test_old_snapshot_unchanged_after_commit() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::ExceptionAddrs(addrs(&["fe80::1"]))).unwrap();
        let before = store.snapshot();

        store.commit(ListUpdate::ExceptionAddrs(addrs(&["fe80::9", "fe80::8"]))).unwrap();

        assert_eq!(before.render(ListKind::ExceptionAddr), "fe80::1");
        assert_eq!(store.load().render(ListKind::ExceptionAddr), "fe80::9 fe80::8");
    }

    #[test]
    fn test_empty_commit_marks_configured() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::ExceptionAddrs(Vec::new())).unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.is_configured(ListKind::ExceptionAddr));
        assert_eq!(snapshot.count(ListKind::ExceptionAddr), 0);
    }

    #[test]
    fn test_shrinking_ifaces_blanks_both_lists() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::DownlinkMacs(macs(&[
            "00:00:00:00:00:01",
            "00:00:00:00:00:02",
            "00:00:00:00:00:03",
        ]))).unwrap();
        store.commit(ListUpdate::UplinkIfaces(ifaces(&["em0", "em1", "em2"]))).unwrap();

        store.commit(ListUpdate::UplinkIfaces(Vec::new())).unwrap();

        let snapshot = store.snapshot();
        for index in 0..3 {
            assert_eq!(snapshot.uplink_ifaces.get(index), None);
            assert_eq!(snapshot.downlink_macs.get(index), None);
        }
        assert_eq!(snapshot.count(ListKind::DownlinkMac), 0);
    }

    #[test]
    fn test_shrinking_macs_blanks_trailing_ifaces() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::UplinkIfaces(ifaces(&["em0", "em1", "em2"]))).unwrap();
        store.commit(ListUpdate::DownlinkMacs(macs(&[
            "00:00:00:00:00:01",
            "00:00:00:00:00:02",
            "00:00:00:00:00:03",
        ]))).unwrap();

        store.commit(ListUpdate::DownlinkMacs(macs(&["00:00:00:00:00:0a"]))).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.render(ListKind::UplinkIface), "em0");
        assert_eq!(snapshot.render(ListKind::DownlinkMac), "00:00:00:00:00:0a");
        assert!(snapshot.iface_binding(1).is_none());
    }

    #[test]
    fn test_growing_pair_keeps_partner() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::DownlinkMacs(macs(&["aa:bb:cc:dd:ee:ff", "11:22:33:44:55:66"]))).unwrap();
        store.commit(ListUpdate::UplinkIfaces(ifaces(&["em0", "em1"]))).unwrap();

        let snapshot = store.snapshot();
        let (iface, mac) = snapshot.iface_binding(1).unwrap();
        assert_eq!(iface.as_str(), "em1");
        assert_eq!(mac.unwrap().to_string(), "11:22:33:44:55:66");
        assert_eq!(
            snapshot.downlink_mac_for("em0").map(|m| m.to_string()),
            Some("aa:bb:cc:dd:ee:ff".to_string())
        );
        assert_eq!(snapshot.downlink_mac_for("em7"), None);
    }

    #[test]
    fn test_unpaired_lists_do_not_blank_each_other() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::UplinkAddrs(addrs(&["fe80::1", "fe80::2"]))).unwrap();
        store.commit(ListUpdate::ExceptionAddrs(addrs(&["fe80::3", "fe80::4"]))).unwrap();
        store.commit(ListUpdate::UplinkAddrs(Vec::new())).unwrap();

        assert_eq!(store.snapshot().count(ListKind::ExceptionAddr), 2);
    }

    #[test]
    fn test_membership_lookups() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::UplinkAddrs(addrs(&["fe80::1"]))).unwrap();
        store.commit(ListUpdate::ExceptionAddrs(addrs(&["2001:db8::5"]))).unwrap();

        let snapshot = store.load();
        assert!(snapshot.is_uplink_router(&"fe80::1".parse().unwrap()));
        assert!(!snapshot.is_uplink_router(&"fe80::2".parse().unwrap()));
        assert!(snapshot.is_exception(&"2001:db8::5".parse().unwrap()));
    }

    #[test]
    fn test_oversize_update_rejected() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::UplinkAddrs(addrs(&["fe80::1"]))).unwrap();
        let before = store.snapshot();

        let oversize: Vec<Ipv6Address> = (0..40)
            .map(|i| format!("2001:db8::{i:x}").parse().unwrap())
            .collect();
        let err = store.commit(ListUpdate::UplinkAddrs(oversize)).unwrap_err();

        assert!(matches!(
            err,
            NdproxyError::CapacityExceeded { kind: ListKind::UplinkAddr, capacity: 32 }
        ));
        assert_eq!(*store.snapshot(), *before);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_full_update_accepted() {
        let store = AddressListStore::new();
        let names: Vec<InterfaceName> = (0..UP_IFACE_MAX)
            .map(|i| format!("em{i}").parse().unwrap())
            .collect();
        store.commit(ListUpdate::UplinkIfaces(names)).unwrap();
        assert_eq!(store.snapshot().count(ListKind::UplinkIface), UP_IFACE_MAX);
    }

    #[test]
    fn test_reset_bumps_version_and_clears() {
        let store = AddressListStore::new();
        store.commit(ListUpdate::UplinkMacs(macs(&["00:11:22:33:44:55"]))).unwrap();
        let version = store.reset();

        assert_eq!(version, 2);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.count(ListKind::UplinkMac), 0);
        assert!(!snapshot.is_configured(ListKind::UplinkMac));
    }
}
