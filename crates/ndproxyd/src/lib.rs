//! Administrative configuration layer for the IPv6 Neighbor Discovery proxy
//!
//! The ND proxy answers Neighbor Solicitations on behalf of downstream hosts.
//! This crate holds what it is configured with: which interfaces face uplinks,
//! the downlink MAC bound to each, which uplink routers to answer, and which
//! addresses never to proxy. Operators read and write those lists as
//! space-separated text on the `net.inet6.ndproxy` node tree; the packet hook
//! reads them lock-free from an immutable snapshot.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! This module implements the following security controls:
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-3 | Content of Audit Records | Structured logging with list and token details |
//! | AU-12 | Audit Record Generation | Commits, rejections and hook transitions logged |
//! | CM-3 | Configuration Change Control | Whole-list validate-then-commit |
//! | CM-6 | Configuration Settings | Runtime node tree and TOML startup file |
//! | SC-7 | Boundary Protection | Single inbound IPv6 interception hook |
//! | SI-7 | Information Integrity | Readers never observe partial updates |
//! | SI-10 | Input Validation | Token-level validation with capacity limits |
//! | SI-11 | Error Handling | Structured error types |
//!
//! # Architecture
//!
//! ```text
//!  operator text          ConfigApplier           AddressListStore
//!  ─────────────▶ AdminSurface ──▶ parse_list ──▶ commit ──▶ ArcSwap<ConfigSnapshot>
//!                      │                                          │
//!                      │ packet_count read                        │ load()
//!                      ▼                                          ▼
//!             HookLifecycleManager ──▶ PacketFilter        HookContext (packet path)
//!                                                                 │
//!                                                          PacketCounter
//! ```

pub mod admin;
pub mod applier;
pub mod config_file;
pub mod counter;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod metrics;
pub mod module;
pub mod parser;
pub mod store;
pub mod types;

pub use admin::{AdminNode, AdminSurface, NODE_PREFIX};
pub use applier::ConfigApplier;
pub use config_file::NdproxyConfig;
pub use counter::PacketCounter;
pub use error::{NdproxyError, Result};
pub use filter::{FilterError, HookArgs, HookId, InProcessFilter, PacketFilter};
pub use lifecycle::{HookLifecycleManager, HookState};
pub use metrics::MetricsCollector;
pub use module::{HookContext, ModuleEvent, NdproxyModule};
pub use parser::{ListParseError, parse_list};
pub use store::{AddressListStore, ConfigSnapshot, ListUpdate};
pub use types::{ConfigList, ListKind};
