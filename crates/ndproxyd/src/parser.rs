//! List text decoding
//!
//! Turns the delimited text written on an administrative node into an
//! ordered, capacity-bounded sequence of typed entries. Nothing here touches
//! stored configuration: a failure simply returns.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Every token is decoded before any commit
//! - SC-5: Denial of Service Protection - Capacity is enforced, never truncated

use crate::error::NdproxyError;
use crate::types::{DELIM, ListKind};
use ndproxy_types::ParseError;
use thiserror::Error;
use tracing::debug;

/// Why a list text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListParseError {
    /// The token at `position` did not decode
    #[error("invalid entry {token:?} at position {position}: {source}")]
    InvalidToken {
        token: String,
        position: usize,
        source: ParseError,
    },
    /// More than `capacity` tokens
    #[error("more than {capacity} entries")]
    CapacityExceeded { capacity: usize },
}

impl ListParseError {
    /// Attach the list kind the text was written to.
    pub fn into_error(self, kind: ListKind) -> NdproxyError {
        match self {
            ListParseError::InvalidToken {
                token,
                position,
                source,
            } => NdproxyError::Validation {
                kind,
                token,
                position,
                source,
            },
            ListParseError::CapacityExceeded { capacity } => {
                NdproxyError::CapacityExceeded { kind, capacity }
            }
        }
    }
}

/// Decode `text` into at most `capacity` entries.
///
/// Tokens are separated by exactly one [`DELIM`]. Empty text is an empty
/// list. Boundary or doubled delimiters produce an empty token, which the
/// decoder rejects like any other malformed token. Decoding stops at the
/// first failure and the capacity is checked before each token is accepted.
pub fn parse_list<T, D>(text: &str, capacity: usize, decode: D) -> Result<Vec<T>, ListParseError>
where
    D: Fn(&str) -> Result<T, ParseError>,
{
    let mut entries = Vec::new();
    if text.is_empty() {
        return Ok(entries);
    }

    for (position, token) in text.split(DELIM).enumerate() {
        if position >= capacity {
            return Err(ListParseError::CapacityExceeded { capacity });
        }

        let entry = decode(token).map_err(|source| ListParseError::InvalidToken {
            token: token.to_string(),
            position,
            source,
        })?;
        debug!(position, token, "parsed list entry");
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndproxy_types::{InterfaceName, Ipv6Address, MacAddress};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn addrs(text: &str, capacity: usize) -> Result<Vec<Ipv6Address>, ListParseError> {
        parse_list(text, capacity, Ipv6Address::from_str)
    }

    #[test]
    fn test_empty_text_is_empty_list() {
        assert_eq!(addrs("", 32).unwrap(), Vec::new());
        assert_eq!(addrs("", 0).unwrap(), Vec::new());
    }

    #[test]
    fn test_preserves_order() {
        let parsed = addrs("fe80::2 fe80::1 2001:db8::9", 32).unwrap();
        let rendered: Vec<String> = parsed.iter().map(|a| a.to_string()).collect();
        assert_eq!(rendered, vec!["fe80::2", "fe80::1", "2001:db8::9"]);
    }

    #[test]
    fn test_reports_first_bad_token() {
        let err = addrs("fe80::1 bogus fe80::3 also-bogus", 32).unwrap_err();
        assert_eq!(
            err,
            ListParseError::InvalidToken {
                token: "bogus".to_string(),
                position: 1,
                source: ndproxy_types::ParseError::InvalidIpv6Address("bogus".to_string()),
            }
        );
    }

    #[test]
    fn test_single_bad_token_at_every_position() {
        let good = ["fe80::1", "fe80::2", "fe80::3", "fe80::4"];
        for bad_at in 0..good.len() {
            let mut tokens = good.to_vec();
            tokens[bad_at] = "xyz";
            match addrs(&tokens.join(" "), 32) {
                Err(ListParseError::InvalidToken { position, .. }) => assert_eq!(position, bad_at),
                other => panic!("expected failure at {bad_at}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_capacity_boundary() {
        let text = |n: usize| {
            (1..=n)
                .map(|i| format!("2001:db8::{i:x}"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        assert_eq!(addrs(&text(4), 4).unwrap().len(), 4);
        assert_eq!(
            addrs(&text(5), 4).unwrap_err(),
            ListParseError::CapacityExceeded { capacity: 4 }
        );
    }

    #[test]
    fn test_capacity_checked_before_decoding_extra_token() {
        let err = addrs("fe80::1 fe80::2 garbage", 2).unwrap_err();
        assert_eq!(err, ListParseError::CapacityExceeded { capacity: 2 });
    }

    #[test]
    fn test_boundary_delimiters_rejected() {
        for text in [" fe80::1", "fe80::1 ", "fe80::1  fe80::2", " "] {
            match addrs(text, 32) {
                Err(ListParseError::InvalidToken { token, .. }) => assert_eq!(token, ""),
                other => panic!("{text:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_mac_decoder() {
        let macs = parse_list("aa:bb:cc:dd:ee:ff 11:22:33:44:55:66", 32, MacAddress::from_str)
            .unwrap();
        assert_eq!(macs[1].to_string(), "11:22:33:44:55:66");

        let err = parse_list("aa:bb:cc:dd:ee:ff a:b:c:d:e:f", 32, MacAddress::from_str).unwrap_err();
        assert!(matches!(err, ListParseError::InvalidToken { position: 1, .. }));
    }

    #[test]
    fn test_interface_decoder() {
        let names = parse_list("em0 em1 vlan100", 32, InterfaceName::from_str).unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names[2].as_str(), "vlan100");
    }

    #[test]
    fn test_error_messages() {
        use std::error::Error;

        let err = addrs("fe80::1 bogus", 32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid entry \"bogus\" at position 1: invalid IPv6 address format: \"bogus\""
        );
        assert!(err.source().is_some());

        let err = addrs("fe80::1 fe80::2", 1).unwrap_err();
        assert_eq!(err.to_string(), "more than 1 entries");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_into_error_carries_kind() {
        let err = ListParseError::CapacityExceeded { capacity: 32 }.into_error(ListKind::ExceptionAddr);
        assert!(matches!(
            err,
            NdproxyError::CapacityExceeded {
                kind: ListKind::ExceptionAddr,
                capacity: 32
            }
        ));
    }
}
