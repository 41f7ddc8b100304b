//! Core types and data structures for the wallet ledger

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a wallet account, assigned at creation and never reused.
pub type WalletId = Uuid;

/// Identifier of a statement row.
pub type StatementId = Uuid;

/// Kinds of balance-changing events recorded in the statement log.
///
/// Closed set on purpose: the storage boundary carries this tag, never a
/// bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Funds credited from outside the ledger after settlement.
    Deposit,
    /// Funds moved between two wallets inside the ledger.
    Transfer,
}

/// A wallet account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, immutable after creation
    pub id: WalletId,
    /// Display name, set at creation (no rename operation)
    pub name: String,
    /// Current balance, exact decimal with scale 2; never committed negative
    pub balance: BigDecimal,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the balance last changed
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new account with a fresh id and a zero balance.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            balance: BigDecimal::from(0).with_scale(2),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a signed balance delta and touch the modified timestamp.
    pub fn apply_delta(&mut self, delta: &BigDecimal) {
        self.balance += delta;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// One immutable row of the append-only statement log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Unique identifier
    pub id: StatementId,
    /// Owning account
    pub account_id: WalletId,
    /// Denormalized copy of the owning account id, kept for query convenience
    pub wallet_id: WalletId,
    /// Signed amount: positive for credits, negative for debits
    pub amount: BigDecimal,
    /// The account's balance immediately after this entry was applied
    pub balance_after: BigDecimal,
    /// What kind of event produced this entry
    pub kind: TransactionType,
    /// When the entry was created; natural ordering key for recent-N queries
    pub created_at: NaiveDateTime,
}

/// Parameters for appending a statement row. The store assigns the id and
/// the created timestamp.
#[derive(Debug, Clone)]
pub struct NewStatement {
    pub account_id: WalletId,
    pub wallet_id: WalletId,
    pub amount: BigDecimal,
    pub balance_after: BigDecimal,
    pub kind: TransactionType,
}

/// Failure of the underlying ledger store. Propagated unmodified; always
/// aborts the enclosing transaction.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// Failure of the settlement gateway call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The call could not be completed (connection refused, bad status,
    /// undecodable body).
    #[error("settlement transport failure: {0}")]
    Transport(String),
    /// The gateway answered but declined with a non-zero error code.
    #[error("settlement declined with error code {code}")]
    Declined { code: i64 },
    /// The call exceeded the configured settlement timeout.
    #[error("settlement call timed out")]
    TimedOut,
}

/// Causes of wallet operation failures.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(BigDecimal),
    #[error("wallet not found: {0}")]
    AccountNotFound(WalletId),
    #[error("insufficient funds in wallet {wallet_id}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        wallet_id: WalletId,
        balance: BigDecimal,
        amount: BigDecimal,
    },
    #[error("cannot transfer from wallet {0} to itself")]
    SameWallet(WalletId),
    #[error("settlement failed: {0}")]
    Settlement(#[from] GatewayError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Deposit failure family: wraps the specific cause so callers can branch
/// on business-vs-infrastructure while keeping the cause for logs.
#[derive(Debug, thiserror::Error)]
#[error("deposit failed: {0}")]
pub struct DepositError(#[source] pub WalletError);

impl DepositError {
    /// The underlying cause.
    pub fn cause(&self) -> &WalletError {
        &self.0
    }
}

/// Transfer failure family, mirroring [`DepositError`].
#[derive(Debug, thiserror::Error)]
#[error("transfer failed: {0}")]
pub struct TransferError(#[source] pub WalletError);

impl TransferError {
    /// The underlying cause.
    pub fn cause(&self) -> &WalletError {
        &self.0
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
