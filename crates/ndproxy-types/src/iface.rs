//! Interface name type with length validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A network interface name such as `em0` or `igb1.100`.
///
/// Names are limited to [`InterfaceName::MAX_LEN`] bytes so that they fit a
/// kernel `IFNAMSIZ` buffer together with the terminator. Only printable,
/// non-space ASCII is accepted.
///
/// # Examples
///
/// ```
/// use ndproxy_types::InterfaceName;
///
/// let name: InterfaceName = "em0".parse().unwrap();
/// assert_eq!(name.as_str(), "em0");
///
/// assert!("".parse::<InterfaceName>().is_err());
/// assert!("a-very-long-interface".parse::<InterfaceName>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    /// `IFNAMSIZ`, the kernel buffer size including the terminator.
    pub const IFNAMSIZ: usize = 16;

    /// Maximum number of bytes in a name.
    pub const MAX_LEN: usize = Self::IFNAMSIZ - 1;

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InterfaceName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ParseError::InvalidInterfaceName {
            name: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid("empty name"));
        }
        if s.len() > Self::MAX_LEN {
            return Err(invalid("longer than 15 bytes"));
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(invalid("contains non-printable or non-ASCII characters"));
        }

        Ok(InterfaceName(s.to_string()))
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InterfaceName> for String {
    fn from(name: InterfaceName) -> String {
        name.0
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
