//! Core types for the proxy configuration lists
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-6: Configuration Settings - Bounded, typed configuration lists
//! - SC-5: Denial of Service Protection - Fixed list capacities

use ndproxy_types::{InterfaceName, Ipv6Address, MacAddress};
use serde::Serialize;
use std::fmt;

/// Separator between entries in list text.
pub const DELIM: char = ' ';

/// Max uplink interfaces (and downlink MACs, one per interface).
pub const UP_IFACE_MAX: usize = 32;
/// Max exception addresses.
pub const EXCEPTION_MAX: usize = 32;
/// Max uplink router addresses (and uplink router MACs).
pub const UPLINK_MAX: usize = 32;

/// The administered lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// MACs presented to hosts, one per uplink interface
    DownlinkMac,
    /// Interfaces with uplinks, index-aligned with `DownlinkMac`
    UplinkIface,
    /// IPv6 addresses not to proxy
    ExceptionAddr,
    /// Uplink router IPv6 addresses
    UplinkAddr,
    /// Uplink router MACs
    UplinkMac,
}

impl ListKind {
    pub const COUNT: usize = 5;

    pub const ALL: [ListKind; Self::COUNT] = [
        ListKind::DownlinkMac,
        ListKind::UplinkIface,
        ListKind::ExceptionAddr,
        ListKind::UplinkAddr,
        ListKind::UplinkMac,
    ];

    /// Administrative node name of this list.
    pub const fn node_name(&self) -> &'static str {
        match self {
            ListKind::DownlinkMac => "downlink_mac_list",
            ListKind::UplinkIface => "uplink_iface_list",
            ListKind::ExceptionAddr => "exception_addr_list",
            ListKind::UplinkAddr => "uplink_addr_list",
            ListKind::UplinkMac => "uplink_mac_list",
        }
    }

    /// Operator-facing description of the node.
    pub const fn description(&self) -> &'static str {
        match self {
            ListKind::DownlinkMac => "Downlink MAC Addresses",
            ListKind::UplinkIface => "Interfaces with uplinks",
            ListKind::ExceptionAddr => "IPv6 addresses NOT to proxy",
            ListKind::UplinkAddr => "Uplink router addresses",
            ListKind::UplinkMac => "Uplink router MAC addresses",
        }
    }

    pub const fn capacity(&self) -> usize {
        match self {
            ListKind::DownlinkMac | ListKind::UplinkIface => UP_IFACE_MAX,
            ListKind::ExceptionAddr => EXCEPTION_MAX,
            ListKind::UplinkAddr | ListKind::UplinkMac => UPLINK_MAX,
        }
    }

    /// Widest entry text plus one byte for the delimiter or terminator.
    pub const fn max_entry_text_len(&self) -> usize {
        match self {
            ListKind::DownlinkMac | ListKind::UplinkMac => MacAddress::MAX_TEXT_LEN,
            ListKind::UplinkIface => InterfaceName::IFNAMSIZ,
            ListKind::ExceptionAddr | ListKind::UplinkAddr => Ipv6Address::MAX_TEXT_LEN,
        }
    }

    /// Size of a text buffer that holds a full list at maximum entry width.
    pub const fn max_text_len(&self) -> usize {
        self.capacity() * self.max_entry_text_len() + 1
    }

    /// Position in [`ListKind::ALL`].
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The other half of the index-aligned interface/MAC pair.
    pub const fn aligned_partner(&self) -> Option<ListKind> {
        match self {
            ListKind::DownlinkMac => Some(ListKind::UplinkIface),
            ListKind::UplinkIface => Some(ListKind::DownlinkMac),
            _ => None,
        }
    }

    pub fn from_node_name(name: &str) -> Option<ListKind> {
        Self::ALL.into_iter().find(|kind| kind.node_name() == name)
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_name())
    }
}

/// A committed list: ordered entries bounded by a fixed capacity.
///
/// `count` is the entry count; `configured` becomes true on the first
/// successful write, including an explicit empty one, so "never written"
/// and "emptied" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigList<T> {
    entries: Vec<T>,
    capacity: usize,
    configured: bool,
}

impl<T> ConfigList<T> {
    /// An unconfigured, empty list.
    pub fn empty(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            configured: false,
        }
    }

    /// A configured list. Callers validate the length first.
    pub(crate) fn configured(entries: Vec<T>, capacity: usize) -> Self {
        Self {
            entries,
            capacity,
            configured: true,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Blank every slot at `len` and beyond.
    pub(crate) fn blank_from(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}

impl<T: PartialEq> ConfigList<T> {
    #[inline]
    pub fn contains(&self, entry: &T) -> bool {
        self.entries.contains(entry)
    }
}

impl<T: fmt::Display> ConfigList<T> {
    /// Render in the administrative text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(DELIM);
            }
            out.push_str(&entry.to_string());
        }
        out
    }
}

impl<'a, T> IntoIterator for &'a ConfigList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_node_names_round_trip() {
        for kind in ListKind::ALL {
            assert_eq!(ListKind::from_node_name(kind.node_name()), Some(kind));
            assert_eq!(ListKind::ALL[kind.index()], kind);
        }
        assert_eq!(ListKind::from_node_name("packet_count"), None);
    }

    #[test]
    fn test_text_buffer_sizing() {
        assert_eq!(ListKind::UplinkIface.max_text_len(), 32 * 16 + 1);
        assert_eq!(ListKind::DownlinkMac.max_text_len(), 32 * 18 + 1);
        assert_eq!(ListKind::ExceptionAddr.max_text_len(), 32 * 46 + 1);
        assert_eq!(ListKind::UplinkAddr.max_text_len(), 32 * 46 + 1);
    }

    #[test]
    fn test_full_list_fits_text_buffer() {
        let widest_mac: MacAddress = "ff:ff:ff:ff:ff:ff".parse().unwrap();
        let macs = ConfigList::configured(vec![widest_mac; UP_IFACE_MAX], UP_IFACE_MAX);
        assert!(macs.render().len() < ListKind::DownlinkMac.max_text_len());

        let widest_name: InterfaceName = "a".repeat(InterfaceName::MAX_LEN).parse().unwrap();
        let names = ConfigList::configured(vec![widest_name; UP_IFACE_MAX], UP_IFACE_MAX);
        assert!(names.render().len() < ListKind::UplinkIface.max_text_len());

        let widest_addr: Ipv6Address = "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff".parse().unwrap();
        let addrs = ConfigList::configured(vec![widest_addr; UPLINK_MAX], UPLINK_MAX);
        assert!(addrs.render().len() < ListKind::UplinkAddr.max_text_len());
    }

    #[test]
    fn test_aligned_partner() {
        assert_eq!(ListKind::DownlinkMac.aligned_partner(), Some(ListKind::UplinkIface));
        assert_eq!(ListKind::UplinkIface.aligned_partner(), Some(ListKind::DownlinkMac));
        assert_eq!(ListKind::UplinkAddr.aligned_partner(), None);
    }

    #[test]
    fn test_config_list_flags() {
        let list: ConfigList<u8> = ConfigList::empty(4);
        assert!(!list.is_configured());
        assert_eq!(list.count(), 0);

        let emptied: ConfigList<u8> = ConfigList::configured(Vec::new(), 4);
        assert!(emptied.is_configured());
        assert!(emptied.is_empty());
    }

    #[test]
    fn test_blank_from() {
        let mut list = ConfigList::configured(vec![1, 2, 3], 4);
        list.blank_from(1);
        assert_eq!(list.as_slice(), &[1]);
        assert_eq!(list.get(1), None);
        list.blank_from(5);
        assert_eq!(list.count(), 1);
    }

    #[test]
    fn test_render_uses_delimiter() {
        let list = ConfigList::configured(vec![1, 22, 333], 4);
        assert_eq!(list.render(), "1 22 333");
        assert_eq!(ConfigList::<u8>::empty(4).render(), "");
    }
}
