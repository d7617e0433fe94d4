use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a new user. A taken email yields [`AuthError::EmailTaken`], also when
    /// a concurrent insert wins the race.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AuthError>;

    /// Exact, case-sensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError>;

    /// Removes a user. Deleting an unknown id is not an error.
    async fn delete(&self, user_id: UserId) -> Result<(), AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn ping(&self) -> Result<(), AuthError>;
}
