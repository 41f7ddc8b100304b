//! The transactional core: deposits and transfers as atomic units

use std::time::Duration;

use bigdecimal::BigDecimal;
use tokio::time::timeout;
use tracing::{error, info};

use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Default bound on the settlement gateway call. The reference gateway is
/// slow (seconds, not milliseconds), so the default is generous.
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wallet service orchestrating account creation, deposits, and transfers
/// over a [`LedgerStore`] and a [`SettlementGateway`].
///
/// Every multi-step mutation runs inside exactly one store transaction:
/// either the balance change and its statement rows all commit, or none of
/// them become visible.
pub struct WalletService<S, G> {
    pub(crate) store: S,
    gateway: G,
    settlement_timeout: Duration,
}

impl<S, G> WalletService<S, G>
where
    S: LedgerStore,
    G: SettlementGateway,
{
    /// Create a service with the default settlement timeout.
    pub fn new(store: S, gateway: G) -> Self {
        Self {
            store,
            gateway,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
        }
    }

    /// Override the bound on the settlement gateway call. Exceeding it is
    /// treated the same as a gateway failure.
    pub fn with_settlement_timeout(mut self, settlement_timeout: Duration) -> Self {
        self.settlement_timeout = settlement_timeout;
        self
    }

    /// Create a new wallet with a zero balance.
    ///
    /// The name is assumed validated by the caller; the only failure mode
    /// is the store itself, propagated unclassified.
    pub async fn create_wallet(&self, name: &str) -> Result<Account, StorageError> {
        let account = self.store.create_account(name).await?;
        info!(wallet_id = %account.id, name = %account.name, "wallet created");
        Ok(account)
    }

    /// Deposit `amount` into a wallet after the settlement gateway
    /// authorizes it. Returns the new balance.
    ///
    /// Runs as one atomic transaction: a failed settlement call, a missing
    /// wallet, or a store failure leaves no balance change and no
    /// statement behind.
    pub async fn deposit(
        &self,
        wallet_id: WalletId,
        amount: BigDecimal,
    ) -> Result<BigDecimal, DepositError> {
        match self.deposit_tx(wallet_id, amount).await {
            Ok(new_balance) => {
                info!(%wallet_id, balance = %new_balance, "deposit committed");
                Ok(new_balance)
            }
            Err(cause) => {
                error!(%wallet_id, error = %cause, "deposit failed");
                Err(DepositError(cause))
            }
        }
    }

    async fn deposit_tx(
        &self,
        wallet_id: WalletId,
        amount: BigDecimal,
    ) -> WalletResult<BigDecimal> {
        validation::validate_positive_amount(&amount)?;
        let amount = validation::money_scale(&amount);

        let mut tx = self.store.begin().await?;

        // Settlement gates the credit; nothing is staged until it succeeds.
        if let Err(cause) = self.settle().await {
            tx.rollback().await?;
            return Err(cause);
        }

        // Single conditional update, so concurrent deposits on the same
        // wallet serialize on the row instead of losing increments.
        if !tx.increment_balance(wallet_id, &amount).await? {
            tx.rollback().await?;
            return Err(WalletError::AccountNotFound(wallet_id));
        }

        // Authoritative post-increment balance, read inside the transaction.
        let account = tx
            .get_account(wallet_id)
            .await?
            .ok_or(WalletError::AccountNotFound(wallet_id))?;
        let new_balance = account.balance;

        tx.append_statement(NewStatement {
            account_id: wallet_id,
            wallet_id,
            amount,
            balance_after: new_balance.clone(),
            kind: TransactionType::Deposit,
        })
        .await?;

        tx.commit().await?;
        Ok(new_balance)
    }

    /// Move `amount` from one wallet to another. Returns the source
    /// wallet's new balance.
    ///
    /// Both balance updates and both statement rows share one commit
    /// boundary: they all become visible together or not at all.
    pub async fn transfer(
        &self,
        from_wallet_id: WalletId,
        to_wallet_id: WalletId,
        amount: BigDecimal,
    ) -> Result<BigDecimal, TransferError> {
        match self.transfer_tx(from_wallet_id, to_wallet_id, amount).await {
            Ok(new_balance) => {
                info!(%from_wallet_id, %to_wallet_id, balance = %new_balance, "transfer committed");
                Ok(new_balance)
            }
            Err(cause) => {
                error!(%from_wallet_id, %to_wallet_id, error = %cause, "transfer failed");
                Err(TransferError(cause))
            }
        }
    }

    async fn transfer_tx(
        &self,
        from: WalletId,
        to: WalletId,
        amount: BigDecimal,
    ) -> WalletResult<BigDecimal> {
        validation::validate_positive_amount(&amount)?;
        if from == to {
            return Err(WalletError::SameWallet(from));
        }
        let amount = validation::money_scale(&amount);

        let mut tx = self.store.begin().await?;

        // Locks go in ascending id order, never argument order, so two
        // opposed transfers over the same pair cannot form a wait cycle.
        let (first_id, second_id) = if from < to { (from, to) } else { (to, from) };
        let first = tx.account_for_update(first_id).await?;
        let second = tx.account_for_update(second_id).await?;

        let (first, second) = match (first, second) {
            (Some(first), Some(second)) => (first, second),
            (None, _) => {
                tx.rollback().await?;
                return Err(WalletError::AccountNotFound(first_id));
            }
            (_, None) => {
                tx.rollback().await?;
                return Err(WalletError::AccountNotFound(second_id));
            }
        };

        // Map the lock-ordered rows back to their roles in this call.
        let (mut source, mut destination) = if first_id == from {
            (first, second)
        } else {
            (second, first)
        };

        let new_source_balance = &source.balance - &amount;
        if new_source_balance < BigDecimal::from(0) {
            let balance = source.balance.clone();
            tx.rollback().await?;
            return Err(WalletError::InsufficientFunds {
                wallet_id: from,
                balance,
                amount,
            });
        }

        let debit = -amount.clone();
        source.apply_delta(&debit);
        destination.apply_delta(&amount);

        tx.save_account(&source).await?;
        tx.save_account(&destination).await?;

        tx.append_statement(NewStatement {
            account_id: from,
            wallet_id: from,
            amount: debit,
            balance_after: source.balance.clone(),
            kind: TransactionType::Transfer,
        })
        .await?;
        tx.append_statement(NewStatement {
            account_id: to,
            wallet_id: to,
            amount,
            balance_after: destination.balance.clone(),
            kind: TransactionType::Transfer,
        })
        .await?;

        tx.commit().await?;
        Ok(source.balance)
    }

    async fn settle(&self) -> WalletResult<()> {
        match timeout(self.settlement_timeout, self.gateway.authorize()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(cause)) => Err(WalletError::Settlement(cause)),
            Err(_) => Err(WalletError::Settlement(GatewayError::TimedOut)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::utils::memory_store::MemoryLedgerStore;

    struct CountingGateway {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SettlementGateway for CountingGateway {
        async fn authorize(&self) -> Result<(), GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct DecliningGateway;

    #[async_trait]
    impl SettlementGateway for DecliningGateway {
        async fn authorize(&self) -> Result<(), GatewayError> {
            Err(GatewayError::Declined { code: 1 })
        }
    }

    fn dec(value: &str) -> BigDecimal {
        value.parse().unwrap()
    }

    fn service_with_counter() -> (
        WalletService<MemoryLedgerStore, CountingGateway>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let gateway = CountingGateway {
            calls: Arc::clone(&calls),
        };
        (WalletService::new(MemoryLedgerStore::new(), gateway), calls)
    }

    #[tokio::test]
    async fn deposit_credits_balance_and_appends_statement() {
        let (service, _calls) = service_with_counter();
        let wallet = service.create_wallet("Alice").await.unwrap();

        let balance = service.deposit(wallet.id, dec("100.00")).await.unwrap();
        assert_eq!(balance, dec("100.00"));

        let statements = service.statements(wallet.id, None).await.unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].amount, dec("100.00"));
        assert_eq!(statements[0].balance_after, dec("100.00"));
        assert_eq!(statements[0].kind, TransactionType::Deposit);
    }

    #[tokio::test]
    async fn deposit_rejects_non_positive_amount_before_any_side_effect() {
        let (service, calls) = service_with_counter();
        let wallet = service.create_wallet("Alice").await.unwrap();

        let err = service.deposit(wallet.id, dec("-5.00")).await.unwrap_err();
        assert!(matches!(err.cause(), WalletError::InvalidAmount(_)));
        // The gateway must not have been consulted.
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let account = service.wallet(wallet.id).await.unwrap();
        assert_eq!(account.balance, dec("0.00"));
    }

    #[tokio::test]
    async fn deposit_rolls_back_when_gateway_declines() {
        let service = WalletService::new(MemoryLedgerStore::new(), DecliningGateway);
        let wallet = service.create_wallet("Alice").await.unwrap();

        let err = service.deposit(wallet.id, dec("50.00")).await.unwrap_err();
        assert!(matches!(
            err.cause(),
            WalletError::Settlement(GatewayError::Declined { code: 1 })
        ));

        let account = service.wallet(wallet.id).await.unwrap();
        assert_eq!(account.balance, dec("0.00"));
        assert!(service.statements(wallet.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deposit_into_unknown_wallet_fails() {
        let (service, _calls) = service_with_counter();
        let err = service
            .deposit(uuid::Uuid::new_v4(), dec("10.00"))
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), WalletError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn transfer_rejects_same_wallet() {
        let (service, _calls) = service_with_counter();
        let wallet = service.create_wallet("Alice").await.unwrap();

        let err = service
            .transfer(wallet.id, wallet.id, dec("10.00"))
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), WalletError::SameWallet(_)));
    }

    #[tokio::test]
    async fn transfer_insufficient_funds_changes_nothing() {
        let (service, _calls) = service_with_counter();
        let alice = service.create_wallet("Alice").await.unwrap();
        let bob = service.create_wallet("Bob").await.unwrap();
        service.deposit(alice.id, dec("70.00")).await.unwrap();

        let err = service
            .transfer(alice.id, bob.id, dec("200.00"))
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), WalletError::InsufficientFunds { .. }));

        assert_eq!(service.wallet(alice.id).await.unwrap().balance, dec("70.00"));
        assert_eq!(service.wallet(bob.id).await.unwrap().balance, dec("0.00"));
        // Only the deposit statement exists; the failed transfer left none.
        assert_eq!(service.statements(alice.id, None).await.unwrap().len(), 1);
        assert!(service.statements(bob.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transfer_to_unknown_destination_fails_without_mutation() {
        let (service, _calls) = service_with_counter();
        let alice = service.create_wallet("Alice").await.unwrap();
        service.deposit(alice.id, dec("100.00")).await.unwrap();

        let err = service
            .transfer(alice.id, uuid::Uuid::new_v4(), dec("30.00"))
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), WalletError::AccountNotFound(_)));
        assert_eq!(
            service.wallet(alice.id).await.unwrap().balance,
            dec("100.00")
        );
    }
}
