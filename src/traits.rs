//! Traits for storage abstraction and the settlement gateway seam

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::types::*;

/// Storage abstraction for the wallet ledger.
///
/// This trait allows the core to work with any storage backend (PostgreSQL,
/// MySQL, SQLite, in-memory, etc.). Reads outside a transaction see only
/// committed state; every multi-step mutation goes through [`LedgerStore::begin`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create an account with a zero balance and fresh timestamps.
    async fn create_account(&self, name: &str) -> Result<Account, StorageError>;

    /// Plain committed read of an account, no lock.
    async fn get_account(&self, id: WalletId) -> Result<Option<Account>, StorageError>;

    /// List all accounts in creation order.
    async fn list_accounts(&self) -> Result<Vec<Account>, StorageError>;

    /// Statements for a wallet, most recent first by created timestamp.
    /// `limit = None` returns all of them.
    async fn statements_for(
        &self,
        wallet_id: WalletId,
        limit: Option<usize>,
    ) -> Result<Vec<Statement>, StorageError>;

    /// Open an atomic transaction. Everything done through the returned
    /// handle commits together or not at all.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StorageError>;
}

/// One atomic transaction against a [`LedgerStore`].
///
/// Row locks acquired through [`LedgerTx::account_for_update`] or
/// [`LedgerTx::increment_balance`] are held until the transaction commits
/// or ends. Dropping an uncommitted transaction discards every staged
/// write and releases every lock, exactly like an explicit rollback.
#[async_trait]
pub trait LedgerTx: Send {
    /// Read an account and take its row write-lock for the rest of the
    /// transaction, blocking other writers of the same row.
    ///
    /// Callers locking more than one row must do so in ascending id order;
    /// the trait cannot enforce this, and violating it can deadlock.
    async fn account_for_update(&mut self, id: WalletId)
        -> Result<Option<Account>, StorageError>;

    /// Atomically add `delta` to the account's balance and touch its
    /// modified timestamp, as a single conditional update (no
    /// read-modify-write). Returns `false` when no such account exists.
    async fn increment_balance(
        &mut self,
        id: WalletId,
        delta: &BigDecimal,
    ) -> Result<bool, StorageError>;

    /// Plain read inside the transaction; sees this transaction's own
    /// uncommitted writes.
    async fn get_account(&self, id: WalletId) -> Result<Option<Account>, StorageError>;

    /// Persist the account's balance and modified timestamp. The caller
    /// must already hold the row lock via
    /// [`LedgerTx::account_for_update`].
    async fn save_account(&mut self, account: &Account) -> Result<(), StorageError>;

    /// Append one statement row. The store assigns the id and created
    /// timestamp and returns the full row.
    async fn append_statement(&mut self, statement: NewStatement)
        -> Result<Statement, StorageError>;

    /// Commit every staged write and release all locks.
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard every staged write and release all locks.
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// External settlement service that authorizes a deposit before funds are
/// credited.
///
/// A non-zero domain error code and a transport-level failure both surface
/// as [`GatewayError`]; the caller treats them identically.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn authorize(&self) -> Result<(), GatewayError>;
}
