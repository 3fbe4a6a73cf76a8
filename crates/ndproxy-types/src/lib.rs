//! Element types for the ndproxy configuration lists.
//!
//! Every list the administrator writes is made of one of these types:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC address (downlink and uplink router MACs)
//! - [`Ipv6Address`]: 128-bit IPv6 address (uplink routers and proxy exceptions)
//! - [`InterfaceName`]: bounded network interface name (uplink interfaces)
//!
//! Each type parses the exact token syntax accepted on the administrative
//! surface and formats back to a token that parses to the same value.

mod iface;
mod ip;
mod mac;

pub use iface::InterfaceName;
pub use ip::Ipv6Address;
pub use mac::MacAddress;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0:?}")]
    InvalidMacAddress(String),

    #[error("invalid IPv6 address format: {0:?}")]
    InvalidIpv6Address(String),

    #[error("invalid interface name {name:?}: {reason}")]
    InvalidInterfaceName { name: String, reason: &'static str },
}
