//! Prometheus metrics for the configuration surface
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-6: Audit Record Review - Write outcomes available for analysis
//! - SI-4: System Monitoring - Hook state exported as a gauge

use crate::lifecycle::HookState;
use crate::types::ListKind;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector for ndproxyd
#[derive(Clone)]
pub struct MetricsCollector {
    /// Committed list writes, labelled by list
    pub writes_committed_total: IntCounterVec,
    /// Rejected list writes, labelled by list and reason
    pub writes_rejected_total: IntCounterVec,
    /// 1 while the interception hook is attached
    pub hook_attached: IntGauge,

    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let writes_committed_total = IntCounterVec::new(
            Opts::new(
                "ndproxy_list_writes_committed_total",
                "Total number of committed list writes",
            ),
            &["list"],
        )?;
        registry.register(Box::new(writes_committed_total.clone()))?;

        let writes_rejected_total = IntCounterVec::new(
            Opts::new(
                "ndproxy_list_writes_rejected_total",
                "Total number of rejected list writes",
            ),
            &["list", "reason"],
        )?;
        registry.register(Box::new(writes_rejected_total.clone()))?;

        let hook_attached = IntGauge::with_opts(Opts::new(
            "ndproxy_hook_attached",
            "Interception hook status (1=attached, 0=detached)",
        ))?;
        registry.register(Box::new(hook_attached.clone()))?;

        Ok(Self {
            writes_committed_total,
            writes_rejected_total,
            hook_attached,
            registry: Arc::new(registry),
        })
    }

    pub fn record_commit(&self, kind: ListKind) {
        self.writes_committed_total
            .with_label_values(&[kind.node_name()])
            .inc();
    }

    pub fn record_rejection(&self, kind: ListKind, reason: &str) {
        self.writes_rejected_total
            .with_label_values(&[kind.node_name(), reason])
            .inc();
    }

    pub fn set_hook_state(&self, state: HookState) {
        self.hook_attached.set(match state {
            HookState::Attached => 1,
            HookState::Detached => 0,
        });
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
