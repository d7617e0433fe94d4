use crate::application_port::*;
use crate::domain_model::{Chain, UserId, Wallet, WalletId};
use crate::domain_port::WalletRepo;
use chrono::Utc;
use std::sync::Arc;

const MAX_TAG_LEN: usize = 100;

fn normalize_tag(tag: Option<String>) -> Result<Option<String>, WalletError> {
    let Some(tag) = tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(WalletError::Validation(format!(
            "Tag must be at most {MAX_TAG_LEN} characters"
        )));
    }
    Ok(Some(tag))
}

fn check_address(chain: Chain, address: &str) -> Result<(), WalletError> {
    if address.is_empty() {
        return Err(WalletError::Validation("Address is required".to_string()));
    }
    if !chain.accepts_address(address) {
        return Err(WalletError::Validation(format!(
            "Invalid {chain} address format"
        )));
    }
    Ok(())
}

pub struct RealWalletService {
    wallet_repo: Arc<dyn WalletRepo>,
}

impl RealWalletService {
    pub fn new(wallet_repo: Arc<dyn WalletRepo>) -> Self {
        RealWalletService { wallet_repo }
    }

    async fn owned(&self, user_id: UserId, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.wallet_repo
            .find_by_id_and_user(wallet_id, user_id)
            .await?
            .ok_or(WalletError::NotFound)
    }
}

#[async_trait::async_trait]
impl WalletService for RealWalletService {
    async fn list(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError> {
        self.wallet_repo.list_by_user(user_id).await
    }

    async fn get(&self, user_id: UserId, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.owned(user_id, wallet_id).await
    }

    async fn create(
        &self,
        user_id: UserId,
        input: CreateWalletInput,
    ) -> Result<Wallet, WalletError> {
        let address = input.address.trim().to_string();
        check_address(input.chain, &address)?;
        let tag = normalize_tag(input.tag)?;

        if self.wallet_repo.address_exists(&address, None).await? {
            return Err(WalletError::AddressTaken);
        }

        let now = Utc::now();
        let wallet = Wallet {
            id: WalletId::new(),
            user_id,
            tag,
            chain: input.chain,
            address,
            created_at: now,
            updated_at: now,
        };
        self.wallet_repo.insert(&wallet).await?;
        tracing::info!(user_id = %user_id, wallet_id = %wallet.id, chain = %wallet.chain, "wallet created");
        Ok(wallet)
    }

    async fn update(
        &self,
        user_id: UserId,
        wallet_id: WalletId,
        input: UpdateWalletInput,
    ) -> Result<Wallet, WalletError> {
        let mut wallet = self.owned(user_id, wallet_id).await?;

        if let Some(chain) = input.chain {
            wallet.chain = chain;
        }
        if let Some(address) = input.address {
            wallet.address = address.trim().to_string();
        }
        if input.tag.is_some() {
            wallet.tag = normalize_tag(input.tag)?;
        }
        check_address(wallet.chain, &wallet.address)?;

        if self
            .wallet_repo
            .address_exists(&wallet.address, Some(wallet.id))
            .await?
        {
            return Err(WalletError::AddressTaken);
        }

        wallet.updated_at = Utc::now();
        self.wallet_repo.update(&wallet).await?;
        tracing::info!(user_id = %user_id, wallet_id = %wallet.id, "wallet updated");
        Ok(wallet)
    }

    async fn delete(&self, user_id: UserId, wallet_id: WalletId) -> Result<(), WalletError> {
        self.owned(user_id, wallet_id).await?;
        if !self.wallet_repo.delete(wallet_id).await? {
            return Err(WalletError::NotFound);
        }
        tracing::info!(user_id = %user_id, wallet_id = %wallet_id, "wallet deleted");
        Ok(())
    }
}
