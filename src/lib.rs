//! # Wallet Core
//!
//! An e-wallet ledger core providing atomic deposits and transfers with an
//! append-only statement log.
//!
//! ## Features
//!
//! - **Atomic operations**: deposits and transfers mutate balances and
//!   append their statement rows in a single transaction
//! - **Concurrency safety**: conditional balance increments and ordered
//!   row locks keep overlapping operations serializable and deadlock free
//! - **Settlement gating**: deposits are credited only after an external
//!   settlement gateway authorizes them
//! - **Exact money**: every amount is a fixed-point decimal with scale 2
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage and an in-memory backend for tests
//!
//! ## Quick Start
//!
//! ```rust
//! use wallet_core::{HttpSettlementGateway, WalletService};
//! use wallet_core::utils::MemoryLedgerStore;
//!
//! // Wire the service to a storage backend and a settlement gateway:
//! // let service = WalletService::new(MemoryLedgerStore::new(), gateway);
//! ```

pub mod gateway;
pub mod traits;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export commonly used types
pub use gateway::*;
pub use traits::*;
pub use types::*;
pub use wallet::*;
