//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics for routing rebuilds and approval phases, served
//! with /live and /ready health checks via axum 0.7.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
