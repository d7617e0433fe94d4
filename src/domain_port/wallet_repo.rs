use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait WalletRepo: Send + Sync {
    /// Newest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError>;

    async fn find_by_id_and_user(
        &self,
        wallet_id: WalletId,
        user_id: UserId,
    ) -> Result<Option<Wallet>, WalletError>;

    /// Is `address` registered to any wallet other than `excluding`?
    async fn address_exists(
        &self,
        address: &str,
        excluding: Option<WalletId>,
    ) -> Result<bool, WalletError>;

    /// Inserts `wallet`; a taken address yields [`WalletError::AddressTaken`].
    async fn insert(&self, wallet: &Wallet) -> Result<(), WalletError>;

    /// Overwrites tag, chain, address and `updated_at` of an existing wallet.
    async fn update(&self, wallet: &Wallet) -> Result<(), WalletError>;

    /// Returns whether a row was removed.
    async fn delete(&self, wallet_id: WalletId) -> Result<bool, WalletError>;
}
