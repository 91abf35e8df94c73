//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` for the
//! composition root and tests. Each sub-module groups adapters by
//! concern.
//!
//! Adapter categories:
//! - `kits`: In-memory transactions adapters and their factory
//! - `wallets`: Config-backed wallet set source
//! - `allowance`: Allowance and pending transaction sources
//! - `metrics`: Prometheus metrics export and health checks

pub mod allowance;
pub mod kits;
pub mod metrics;
pub mod wallets;
