use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: DashMap<UserId, User>,
    by_email: DashMap<String, UserId>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };

        match self.by_email.entry(email.to_string()) {
            Entry::Occupied(_) => return Err(AuthError::EmailTaken),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Some(user_id) = self.by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(user_id).await
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&user_id).map(|user| user.clone()))
    }

    async fn delete(&self, user_id: UserId) -> Result<(), AuthError> {
        if let Some((_, user)) = self.users.remove(&user_id) {
            self.by_email.remove_if(&user.email, |_, id| *id == user_id);
        }
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.by_email.contains_key(email))
    }

    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
