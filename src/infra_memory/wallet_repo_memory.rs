use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Default)]
pub struct InMemoryWalletRepo {
    wallets: DashMap<WalletId, Wallet>,
    by_address: DashMap<String, WalletId>,
}

impl InMemoryWalletRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_address(&self, address: &str, wallet_id: WalletId) -> Result<(), WalletError> {
        match self.by_address.entry(address.to_string()) {
            Entry::Occupied(slot) if *slot.get() != wallet_id => Err(WalletError::AddressTaken),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(wallet_id);
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl WalletRepo for InMemoryWalletRepo {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.value().clone())
            .collect();
        wallets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(wallets)
    }

    async fn find_by_id_and_user(
        &self,
        wallet_id: WalletId,
        user_id: UserId,
    ) -> Result<Option<Wallet>, WalletError> {
        Ok(self
            .wallets
            .get(&wallet_id)
            .filter(|w| w.user_id == user_id)
            .map(|w| w.value().clone()))
    }

    async fn address_exists(
        &self,
        address: &str,
        excluding: Option<WalletId>,
    ) -> Result<bool, WalletError> {
        Ok(self
            .by_address
            .get(address)
            .is_some_and(|id| Some(*id) != excluding))
    }

    async fn insert(&self, wallet: &Wallet) -> Result<(), WalletError> {
        self.claim_address(&wallet.address, wallet.id)?;
        self.wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn update(&self, wallet: &Wallet) -> Result<(), WalletError> {
        let previous = self
            .wallets
            .get(&wallet.id)
            .map(|w| w.address.clone())
            .ok_or(WalletError::NotFound)?;
        if previous != wallet.address {
            self.claim_address(&wallet.address, wallet.id)?;
            self.by_address.remove(&previous);
        }
        self.wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn delete(&self, wallet_id: WalletId) -> Result<bool, WalletError> {
        match self.wallets.remove(&wallet_id) {
            Some((_, wallet)) => {
                self.by_address.remove(&wallet.address);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
