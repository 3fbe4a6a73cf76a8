//! Configuration file support for ndproxyd
//!
//! Loads and validates the startup configuration from TOML.
//! Default location: /etc/ndproxy/ndproxy.conf
//!
//! List values use the same space-separated text as runtime writes and are
//! applied through the admin surface after Load.

use crate::admin::{AdminNode, AdminSurface};
use crate::applier::ConfigApplier;
use crate::error::{NdproxyError, Result};
use crate::store::AddressListStore;
use crate::types::ListKind;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ndproxy/ndproxy.conf";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Module behaviour
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleConfig {
    /// Attach the interception hook on Load
    #[serde(default = "default_attach_on_load")]
    pub attach_on_load: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Initial list contents, one optional string per node
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListsConfig {
    #[serde(default)]
    pub downlink_mac_list: Option<String>,
    #[serde(default)]
    pub uplink_iface_list: Option<String>,
    #[serde(default)]
    pub exception_addr_list: Option<String>,
    #[serde(default)]
    pub uplink_addr_list: Option<String>,
    #[serde(default)]
    pub uplink_mac_list: Option<String>,
}

impl ListsConfig {
    /// Configured lists in node order. Absent keys are skipped.
    pub fn entries(&self) -> Vec<(ListKind, &str)> {
        ListKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let value = match kind {
                    ListKind::DownlinkMac => &self.downlink_mac_list,
                    ListKind::UplinkIface => &self.uplink_iface_list,
                    ListKind::ExceptionAddr => &self.exception_addr_list,
                    ListKind::UplinkAddr => &self.uplink_addr_list,
                    ListKind::UplinkMac => &self.uplink_mac_list,
                };
                value.as_deref().map(|text| (kind, text))
            })
            .collect()
    }
}

/// Complete ndproxyd configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NdproxyConfig {
    #[serde(default)]
    pub module: ModuleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub lists: ListsConfig,
}

fn default_attach_on_load() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            attach_on_load: default_attach_on_load(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl NdproxyConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map_err(|e| {
                NdproxyError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(NdproxyError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| NdproxyError::Config(e.to_string()))
    }

    /// Validate configuration
    ///
    /// Every configured list is decoded against a scratch store, so a file
    /// that passes here applies cleanly.
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(NdproxyError::Config(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join("/"),
                self.logging.level
            )));
        }

        let scratch = Arc::new(AddressListStore::new());
        for (kind, text) in self.lists.entries() {
            ConfigApplier::new(kind, Arc::clone(&scratch))
                .validate(text)
                .map_err(|e| NdproxyError::Config(format!("lists.{kind}: {e}")))?;
        }

        Ok(())
    }

    /// Write every configured list through the admin surface.
    ///
    /// Stops at the first rejected list; lists applied before it stay committed.
    pub fn apply(&self, admin: &AdminSurface) -> Result<usize> {
        let mut applied = 0;
        for (kind, text) in self.lists.entries() {
            admin.write(AdminNode::List(kind), text)?;
            applied += 1;
        }
        info!(applied, "applied configured lists");
        Ok(applied)
    }
}
