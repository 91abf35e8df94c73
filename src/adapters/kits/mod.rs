//! Chain Kit Adapters - In-memory Transactions Adapters
//!
//! Implements the adapter ports without any chain connection:
//! - `InMemoryAdapterFactory`: kit-family adapters keyed by source
//! - `InMemoryTransactionsAdapter`: pushed history, paged newest first
//! - `BalanceAdapter`: the raw adapter each wallet owns

pub mod factory;
pub mod transactions;

pub use factory::InMemoryAdapterFactory;
pub use transactions::{BalanceAdapter, InMemoryTransactionsAdapter};
