use super::util::{is_dup_key, uuid_from_bytes};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlWalletRepo {
    pool: MySqlPool,
}

fn store_err(e: sqlx::Error) -> WalletError {
    if is_dup_key(&e) {
        WalletError::AddressTaken
    } else {
        WalletError::Store(e.to_string())
    }
}

impl MySqlWalletRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlWalletRepo { pool }
    }

    fn row_to_wallet(row: MySqlRow) -> Result<Wallet, WalletError> {
        let id_bytes: Vec<u8> = row.try_get("id").map_err(store_err)?;
        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(store_err)?;
        let chain: String = row.try_get("chain").map_err(store_err)?;

        Ok(Wallet {
            id: WalletId(uuid_from_bytes(&id_bytes).map_err(WalletError::Store)?),
            user_id: UserId(uuid_from_bytes(&user_id_bytes).map_err(WalletError::Store)?),
            tag: row.try_get("tag").map_err(store_err)?,
            chain: chain.parse::<Chain>().map_err(WalletError::Store)?,
            address: row.try_get("address").map_err(store_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(store_err)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(store_err)?,
        })
    }
}

#[async_trait::async_trait]
impl WalletRepo for MySqlWalletRepo {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError> {
        let rows = sqlx::query(
            r#"
SELECT id, user_id, tag, chain, address, created_at, updated_at
FROM wallets
WHERE user_id = ?
ORDER BY created_at DESC
"#,
        )
        .bind(user_id.0.as_bytes() as &[u8])
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Self::row_to_wallet).collect()
    }

    async fn find_by_id_and_user(
        &self,
        wallet_id: WalletId,
        user_id: UserId,
    ) -> Result<Option<Wallet>, WalletError> {
        let row_opt = sqlx::query(
            r#"
SELECT id, user_id, tag, chain, address, created_at, updated_at
FROM wallets
WHERE id = ? AND user_id = ?
"#,
        )
        .bind(wallet_id.0.as_bytes() as &[u8])
        .bind(user_id.0.as_bytes() as &[u8])
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_wallet).transpose()
    }

    async fn address_exists(
        &self,
        address: &str,
        excluding: Option<WalletId>,
    ) -> Result<bool, WalletError> {
        let count: i64 = match excluding {
            Some(wallet_id) => {
                sqlx::query_scalar::<_, i64>(
                    r#"SELECT COUNT(*) FROM wallets WHERE address = ? AND id <> ?"#,
                )
                    .bind(address)
                    .bind(wallet_id.0.as_bytes() as &[u8])
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM wallets WHERE address = ?"#)
                    .bind(address)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(store_err)?;

        Ok(count > 0)
    }

    async fn insert(&self, wallet: &Wallet) -> Result<(), WalletError> {
        sqlx::query(
            r#"
INSERT INTO wallets (id, user_id, tag, chain, address, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(wallet.id.0.as_bytes() as &[u8])
        .bind(wallet.user_id.0.as_bytes() as &[u8])
        .bind(&wallet.tag)
        .bind(wallet.chain.as_str())
        .bind(&wallet.address)
        .bind(wallet.created_at)
        .bind(wallet.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    async fn update(&self, wallet: &Wallet) -> Result<(), WalletError> {
        let result = sqlx::query(
            r#"
UPDATE wallets
SET tag = ?, chain = ?, address = ?, updated_at = ?
WHERE id = ?
"#,
        )
        .bind(&wallet.tag)
        .bind(wallet.chain.as_str())
        .bind(&wallet.address)
        .bind(wallet.updated_at)
        .bind(wallet.id.0.as_bytes() as &[u8])
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        // MySQL reports zero affected rows for a no-op update, so only a vanished
        // row is an error
        if result.rows_affected() == 0 && !self.exists(wallet.id).await? {
            return Err(WalletError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, wallet_id: WalletId) -> Result<bool, WalletError> {
        let result = sqlx::query(r#"DELETE FROM wallets WHERE id = ?"#)
            .bind(wallet_id.0.as_bytes() as &[u8])
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected() > 0)
    }
}

impl MySqlWalletRepo {
    async fn exists(&self, wallet_id: WalletId) -> Result<bool, WalletError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM wallets WHERE id = ?"#)
            .bind(wallet_id.0.as_bytes() as &[u8])
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(count > 0)
    }
}
