//! Domain layer - Core wallet types and pure logic.
//!
//! Nothing here performs I/O or holds shared state. Chain identities,
//! wallets and routing keys, transaction records, and the pending approval
//! state machine all live in this inner ring.

pub mod approval;
pub mod blockchain;
pub mod error;
pub mod transaction;
pub mod wallet;

// Re-export core types for convenience
pub use approval::{AllowanceState, ApprovalPhase, reconcile};
pub use blockchain::{AdapterKind, Blockchain, BlockchainType};
pub use error::AdapterError;
pub use transaction::TransactionRecord;
pub use wallet::{Account, AccountType, Token, TokenType, TransactionSource, Wallet};
