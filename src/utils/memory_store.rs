//! In-memory ledger store for testing and development
//!
//! Unlike a plain map of accounts, this backend models the storage
//! contract the service relies on: staged writes that publish only at
//! commit, and per-account row locks owned by the transaction and held
//! until it commits or is dropped. Concurrent writers of the same row
//! block exactly as they would on a SQL row write-lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation of [`LedgerStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    accounts: Arc<RwLock<HashMap<WalletId, Account>>>,
    statements: Arc<RwLock<Vec<Statement>>>,
    row_locks: Arc<RwLock<HashMap<WalletId, Arc<Mutex<()>>>>>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn row_lock(&self, id: WalletId) -> Option<Arc<Mutex<()>>> {
        self.row_locks.read().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn create_account(&self, name: &str) -> Result<Account, StorageError> {
        let account = Account::new(name);
        let mut accounts = self.accounts.write().unwrap();
        let mut row_locks = self.row_locks.write().unwrap();
        row_locks.insert(account.id, Arc::new(Mutex::new(())));
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: WalletId) -> Result<Option<Account>, StorageError> {
        Ok(self.accounts.read().unwrap().get(&id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StorageError> {
        let accounts = self.accounts.read().unwrap();
        let mut rows: Vec<Account> = accounts.values().cloned().collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn statements_for(
        &self,
        wallet_id: WalletId,
        limit: Option<usize>,
    ) -> Result<Vec<Statement>, StorageError> {
        let statements = self.statements.read().unwrap();
        let mut rows: Vec<Statement> = statements
            .iter()
            .filter(|statement| statement.wallet_id == wallet_id)
            .cloned()
            .collect();
        // Most recent first; ties keep reverse insertion order so a row
        // committed later still lists first.
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StorageError> {
        Ok(Box::new(MemoryTx {
            store: self.clone(),
            held: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_statements: Vec::new(),
        }))
    }
}

/// One open transaction against a [`MemoryLedgerStore`].
struct MemoryTx {
    store: MemoryLedgerStore,
    held: HashMap<WalletId, OwnedMutexGuard<()>>,
    staged_accounts: HashMap<WalletId, Account>,
    staged_statements: Vec<Statement>,
}

impl MemoryTx {
    /// Take the account's row lock, waiting for any other transaction that
    /// holds it. Returns `false` when no such account exists. Re-locking a
    /// row this transaction already holds is a no-op.
    async fn lock_row(&mut self, id: WalletId) -> bool {
        if self.held.contains_key(&id) {
            return true;
        }
        let Some(lock) = self.store.row_lock(id) else {
            return false;
        };
        let guard = lock.lock_owned().await;
        self.held.insert(id, guard);
        true
    }

    /// The row as this transaction sees it: staged write if present,
    /// committed state otherwise.
    fn current(&self, id: WalletId) -> Option<Account> {
        if let Some(staged) = self.staged_accounts.get(&id) {
            return Some(staged.clone());
        }
        self.store.accounts.read().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn account_for_update(
        &mut self,
        id: WalletId,
    ) -> Result<Option<Account>, StorageError> {
        if !self.lock_row(id).await {
            return Ok(None);
        }
        Ok(self.current(id))
    }

    async fn increment_balance(
        &mut self,
        id: WalletId,
        delta: &BigDecimal,
    ) -> Result<bool, StorageError> {
        // The update itself takes the row lock, serializing concurrent
        // increments of the same account.
        if !self.lock_row(id).await {
            return Ok(false);
        }
        match self.current(id) {
            Some(mut account) => {
                account.apply_delta(delta);
                self.staged_accounts.insert(id, account);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_account(&self, id: WalletId) -> Result<Option<Account>, StorageError> {
        Ok(self.current(id))
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), StorageError> {
        debug_assert!(
            self.held.contains_key(&account.id),
            "save_account requires the row lock from account_for_update"
        );
        self.staged_accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn append_statement(
        &mut self,
        statement: NewStatement,
    ) -> Result<Statement, StorageError> {
        let statement = Statement {
            id: Uuid::new_v4(),
            account_id: statement.account_id,
            wallet_id: statement.wallet_id,
            amount: statement.amount,
            balance_after: statement.balance_after,
            kind: statement.kind,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.staged_statements.push(statement.clone());
        Ok(statement)
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryTx {
            store,
            held,
            staged_accounts,
            mut staged_statements,
        } = *self;
        {
            let mut accounts = store.accounts.write().unwrap();
            for (id, account) in staged_accounts {
                accounts.insert(id, account);
            }
        }
        store.statements.write().unwrap().append(&mut staged_statements);
        // Row locks release only after the staged writes are visible.
        drop(held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        // Staged writes are discarded and locks released on drop.
        Ok(())
    }
}
