//! Validate-then-commit for one list
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-3: Configuration Change Control - Only fully validated lists are committed
//! - SI-10: Information Input Validation - Rejections name the offending token
//! - AU-12: Audit Record Generation - Commits and rejections are logged

use crate::error::Result;
use crate::parser::parse_list;
use crate::store::{AddressListStore, ListUpdate};
use crate::types::ListKind;
use ndproxy_types::{InterfaceName, Ipv6Address, MacAddress};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Applies administrative text to one list of the store.
#[derive(Debug, Clone)]
pub struct ConfigApplier {
    kind: ListKind,
    store: Arc<AddressListStore>,
}

impl ConfigApplier {
    pub fn new(kind: ListKind, store: Arc<AddressListStore>) -> Self {
        Self { kind, store }
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    /// Decode `text` with this list's decoder and capacity, without committing.
    pub fn validate(&self, text: &str) -> Result<ListUpdate> {
        let capacity = self.kind.capacity();
        let update = match self.kind {
            ListKind::DownlinkMac => {
                parse_list(text, capacity, MacAddress::from_str).map(ListUpdate::DownlinkMacs)
            }
            ListKind::UplinkIface => {
                parse_list(text, capacity, InterfaceName::from_str).map(ListUpdate::UplinkIfaces)
            }
            ListKind::ExceptionAddr => {
                parse_list(text, capacity, Ipv6Address::from_str).map(ListUpdate::ExceptionAddrs)
            }
            ListKind::UplinkAddr => {
                parse_list(text, capacity, Ipv6Address::from_str).map(ListUpdate::UplinkAddrs)
            }
            ListKind::UplinkMac => {
                parse_list(text, capacity, MacAddress::from_str).map(ListUpdate::UplinkMacs)
            }
        };
        update.map_err(|e| e.into_error(self.kind))
    }

    /// Replace the list with the entries in `text`.
    ///
    /// On any error the store is left exactly as it was. Returns the number
    /// of committed entries.
    #[instrument(skip(self, text), fields(list = %self.kind))]
    pub fn apply(&self, text: &str) -> Result<usize> {
        let update = match self.validate(text) {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "rejected list write, configuration unchanged");
                return Err(e);
            }
        };

        let count = update.len();
        let version = self.store.commit(update)?;
        info!(count, version, "committed list");
        Ok(count)
    }

    /// The last committed list in write format.
    pub fn read(&self) -> String {
        self.store.load().render(self.kind)
    }
}
