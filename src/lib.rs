//! Wallet Transaction Router — Library Root
//!
//! Routes wallets to per-source transactions adapters and reconciles
//! pending approve/revoke transactions against on-chain allowances.
//! Re-exports all modules for the binary, integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
