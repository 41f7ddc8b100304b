//! Read side of the wallet service: lookups and statement queries

use crate::traits::*;
use crate::types::*;
use crate::wallet::service::WalletService;

impl<S, G> WalletService<S, G>
where
    S: LedgerStore,
    G: SettlementGateway,
{
    /// Look up a wallet by id.
    pub async fn wallet(&self, wallet_id: WalletId) -> WalletResult<Account> {
        self.store
            .get_account(wallet_id)
            .await?
            .ok_or(WalletError::AccountNotFound(wallet_id))
    }

    /// List every wallet.
    pub async fn wallets(&self) -> WalletResult<Vec<Account>> {
        Ok(self.store.list_accounts().await?)
    }

    /// The wallet's statements, most recent first. `limit = None` returns
    /// the full history.
    pub async fn statements(
        &self,
        wallet_id: WalletId,
        limit: Option<usize>,
    ) -> WalletResult<Vec<Statement>> {
        // Distinguish "no statements yet" from "no such wallet".
        self.wallet(wallet_id).await?;
        Ok(self.store.statements_for(wallet_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::utils::memory_store::MemoryLedgerStore;

    struct ApprovingGateway;

    #[async_trait]
    impl SettlementGateway for ApprovingGateway {
        async fn authorize(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn dec(value: &str) -> BigDecimal {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn statements_come_back_most_recent_first_and_honor_limit() {
        let service = WalletService::new(MemoryLedgerStore::new(), ApprovingGateway);
        let wallet = service.create_wallet("Alice").await.unwrap();

        service.deposit(wallet.id, dec("10.00")).await.unwrap();
        service.deposit(wallet.id, dec("20.00")).await.unwrap();
        service.deposit(wallet.id, dec("30.00")).await.unwrap();

        let all = service.statements(wallet.id, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].amount, dec("30.00"));
        assert_eq!(all[2].amount, dec("10.00"));

        let recent = service.statements(wallet.id, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount, dec("30.00"));
        assert_eq!(recent[1].amount, dec("20.00"));
    }

    #[tokio::test]
    async fn statements_for_unknown_wallet_is_an_error() {
        let service = WalletService::new(MemoryLedgerStore::new(), ApprovingGateway);
        let err = service
            .statements(uuid::Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn wallets_lists_every_account() {
        let service = WalletService::new(MemoryLedgerStore::new(), ApprovingGateway);
        service.create_wallet("Alice").await.unwrap();
        service.create_wallet("Bob").await.unwrap();

        let wallets = service.wallets().await.unwrap();
        assert_eq!(wallets.len(), 2);
    }
}
