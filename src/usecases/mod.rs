//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces. Both use cases react
//! to one serialized notification stream each and publish their results
//! on broadcast channels.
//!
//! Use cases:
//! - `AdapterRoutingTable`: One transactions adapter per transaction source
//! - `AllowanceReconciler`: Pending approve/revoke phase for the UI

pub mod allowance_reconciler;
pub mod routing_table;

pub use allowance_reconciler::AllowanceReconciler;
pub use routing_table::{AdapterRoutingTable, RebuildReport};
