use crate::domain_model::{Chain, UserId, Wallet, WalletId};

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("{0}")]
    Validation(String),
    #[error("Wallet not found")]
    NotFound,
    #[error("A wallet with this address already exists")]
    AddressTaken,
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone)]
pub struct CreateWalletInput {
    pub tag: Option<String>,
    pub chain: Chain,
    pub address: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateWalletInput {
    pub tag: Option<String>,
    pub chain: Option<Chain>,
    pub address: Option<String>,
}

#[async_trait::async_trait]
pub trait WalletService: Send + Sync {
    async fn list(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError>;
    async fn get(&self, user_id: UserId, wallet_id: WalletId) -> Result<Wallet, WalletError>;
    async fn create(
        &self,
        user_id: UserId,
        input: CreateWalletInput,
    ) -> Result<Wallet, WalletError>;
    async fn update(
        &self,
        user_id: UserId,
        wallet_id: WalletId,
        input: UpdateWalletInput,
    ) -> Result<Wallet, WalletError>;
    async fn delete(&self, user_id: UserId, wallet_id: WalletId) -> Result<(), WalletError>;
}
