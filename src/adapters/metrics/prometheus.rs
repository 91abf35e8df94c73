//! Prometheus Metrics Registry - Routing and Approval Observability
//!
//! Counts rebuilds, adapter churn and construction failures, and
//! approval phase transitions. All metrics are named `wallet_router_*`.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::{AdapterError, ApprovalPhase};
use crate::usecases::RebuildReport;

/// Centralized Prometheus metrics for the router.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Routing table rebuilds.
    pub rebuilds: IntCounter,
    /// Adapters in the published table.
    pub adapters_registered: IntGauge,
    /// Adapters constructed.
    pub adapters_created: IntCounter,
    /// Adapters unlinked by rebuilds.
    pub adapters_released: IntCounter,
    /// Construction failures by error kind.
    pub construction_failures: IntCounterVec,
    /// Approval phase transitions by target phase.
    pub phase_transitions: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let rebuilds = IntCounter::new(
            "wallet_router_rebuilds_total",
            "Routing table rebuilds",
        )?;

        let adapters_registered = IntGauge::new(
            "wallet_router_adapters_registered",
            "Transactions adapters in the routing table",
        )?;

        let adapters_created = IntCounter::new(
            "wallet_router_adapters_created_total",
            "Transactions adapters constructed",
        )?;

        let adapters_released = IntCounter::new(
            "wallet_router_adapters_released_total",
            "Transactions adapters unlinked",
        )?;

        let construction_failures = IntCounterVec::new(
            Opts::new(
                "wallet_router_construction_failures_total",
                "Adapter construction failures",
            ),
            &["error"],
        )?;

        let phase_transitions = IntCounterVec::new(
            Opts::new(
                "wallet_router_approval_phase_transitions_total",
                "Approval phase transitions",
            ),
            &["phase"],
        )?;

        registry.register(Box::new(rebuilds.clone()))?;
        registry.register(Box::new(adapters_registered.clone()))?;
        registry.register(Box::new(adapters_created.clone()))?;
        registry.register(Box::new(adapters_released.clone()))?;
        registry.register(Box::new(construction_failures.clone()))?;
        registry.register(Box::new(phase_transitions.clone()))?;

        Ok(Self {
            registry,
            rebuilds,
            adapters_registered,
            adapters_created,
            adapters_released,
            construction_failures,
            phase_transitions,
        })
    }

    pub fn record_rebuild(&self, report: &RebuildReport) {
        self.rebuilds.inc();
        self.adapters_registered
            .set(i64::try_from(report.registered).unwrap_or(i64::MAX));
        self.adapters_created.inc_by(report.created as u64);
        self.adapters_released.inc_by(report.released as u64);

        for (_, error) in &report.failures {
            let label = match error {
                AdapterError::UnsupportedAccount { .. } => "unsupported_account",
                AdapterError::UnsupportedBlockchain(_) => "unsupported_blockchain",
                AdapterError::Construction { .. } => "construction",
            };
            self.construction_failures.with_label_values(&[label]).inc();
        }
    }

    /// Correct the registered gauge after missed reports.
    pub fn resync_registered(&self, registered: usize) {
        self.adapters_registered
            .set(i64::try_from(registered).unwrap_or(i64::MAX));
    }

    pub fn record_phase(&self, phase: ApprovalPhase) {
        self.phase_transitions
            .with_label_values(&[phase.as_str()])
            .inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
