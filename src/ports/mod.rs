//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the use cases require from the
//! wallet application and its chain kits. Adapters implement these traits.
//!
//! Port categories:
//! - `adapters`: Transactions adapters and the factory building them
//! - `wallet_source`: Active wallet set notifications
//! - `allowance`: On-chain allowance and pending transaction lookups

pub mod adapters;
pub mod allowance;
pub mod wallet_source;

pub use adapters::{AdapterFactory, AdapterHandle, RawAdapter, TransactionsAdapter};
pub use allowance::{AllowanceSource, PendingTransactionSource};
pub use wallet_source::{WalletSet, WalletSetSource};
