//! Credential store
//!
//! Persistence for users and pending OTPs. Email is unique in both collections.

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::StoreError;
use crate::models::{NewUser, PendingOtp, User};

/// Users and pending OTPs, read-after-write consistent
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    async fn find_pending_otp(&self, email: &str) -> Result<Option<PendingOtp>, StoreError>;

    /// Fails with `Duplicate` if a pending OTP or a user already exists for the email
    async fn create_pending_otp(&self, otp: &PendingOtp) -> Result<(), StoreError>;

    /// Overwrites the code, expiry and captured profile of the record for `otp.email`.
    /// Fails with `Missing` if there is no such record or the email is already registered.
    async fn update_pending_otp(&self, otp: &PendingOtp) -> Result<(), StoreError>;

    /// Create the user and consume the pending OTP for its email in one step
    async fn complete_signup(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Update name and/or phone; `None` if no such user
    async fn update_user_profile(
        &self,
        user_id: i64,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<User>, StoreError>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    db_pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT user_id, name, email, phone, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT user_id, name, email, phone, password_hash, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_pending_otp(&self, email: &str) -> Result<Option<PendingOtp>, StoreError> {
        let otp: Option<PendingOtp> = sqlx::query_as(
            r#"
            SELECT id, email, code, expires_at, name, phone, password_hash, created_at, updated_at
            FROM pending_otps
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(otp)
    }

    async fn create_pending_otp(&self, otp: &PendingOtp) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO pending_otps (id, email, code, expires_at, name, phone, password_hash, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE NOT EXISTS (SELECT 1 FROM users WHERE email = $2)
            "#,
        )
        .bind(otp.id)
        .bind(&otp.email)
        .bind(&otp.code)
        .bind(otp.expires_at)
        .bind(&otp.name)
        .bind(&otp.phone)
        .bind(&otp.password_hash)
        .bind(otp.created_at)
        .bind(otp.updated_at)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate);
        }

        Ok(())
    }

    async fn update_pending_otp(&self, otp: &PendingOtp) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_otps
            SET code = $1, expires_at = $2, name = $3, phone = $4, password_hash = $5, updated_at = $6
            WHERE email = $7
              AND NOT EXISTS (SELECT 1 FROM users WHERE email = $7)
            "#,
        )
        .bind(&otp.code)
        .bind(otp.expires_at)
        .bind(&otp.name)
        .bind(&otp.phone)
        .bind(&otp.password_hash)
        .bind(otp.updated_at)
        .bind(&otp.email)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing);
        }

        Ok(())
    }

    async fn complete_signup(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut tx = self.db_pool.begin().await?;

        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, phone, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING user_id, name, email, phone, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM pending_otps WHERE email = $1
            "#,
        )
        .bind(&user.email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn update_user_profile(
        &self,
        user_id: i64,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            UPDATE users
            SET name = COALESCE($1, name), phone = COALESCE($2, phone), updated_at = NOW()
            WHERE user_id = $3
            RETURNING user_id, name, email, phone, password_hash, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }
}

#[derive(Default)]
struct MemoryTables {
    users: HashMap<i64, User>,
    pending: HashMap<String, PendingOtp>,
    next_user_id: i64,
}

/// In-process credential store with the same uniqueness rules as the database.
/// Used by tests and for running without PostgreSQL.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    tables: Arc<RwLock<MemoryTables>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending OTP records
    pub async fn pending_count(&self) -> usize {
        self.tables.read().await.pending.len()
    }

    /// Number of registered users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_pending_otp(&self, email: &str) -> Result<Option<PendingOtp>, StoreError> {
        Ok(self.tables.read().await.pending.get(email).cloned())
    }

    async fn create_pending_otp(&self, otp: &PendingOtp) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.pending.contains_key(&otp.email)
            || tables.users.values().any(|u| u.email == otp.email)
        {
            return Err(StoreError::Duplicate);
        }
        tables.pending.insert(otp.email.clone(), otp.clone());
        Ok(())
    }

    async fn update_pending_otp(&self, otp: &PendingOtp) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == otp.email) {
            return Err(StoreError::Missing);
        }
        let existing = tables
            .pending
            .get_mut(&otp.email)
            .ok_or(StoreError::Missing)?;

        existing.code = otp.code.clone();
        existing.expires_at = otp.expires_at;
        existing.name = otp.name.clone();
        existing.phone = otp.phone.clone();
        existing.password_hash = otp.password_hash.clone();
        existing.updated_at = otp.updated_at;
        Ok(())
    }

    async fn complete_signup(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            user_id: tables.next_user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };

        tables.users.insert(created.user_id, created.clone());
        tables.pending.remove(&user.email);

        Ok(created)
    }

    async fn update_user_profile(
        &self,
        user_id: i64,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(phone) = phone {
            user.phone = phone.to_string();
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            password_hash: "$2b$04$hash".to_string(),
        }
    }

    fn pending(email: &str, code: &str) -> PendingOtp {
        let now = Utc::now();
        PendingOtp {
            id: Uuid::new_v4(),
            email: email.to_string(),
            code: code.to_string(),
            expires_at: now + Duration::minutes(5),
            name: "Ana".to_string(),
            phone: "555-0100".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_pending_otp_unique_per_email() {
        let store = InMemoryCredentialStore::new();
        store.create_pending_otp(&pending("a@b.com", "111111")).await.unwrap();

        let result = store.create_pending_otp(&pending("a@b.com", "222222")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(store.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_pending_otp_in_place() {
        let store = InMemoryCredentialStore::new();
        let original = pending("a@b.com", "111111");
        store.create_pending_otp(&original).await.unwrap();

        let refreshed = pending("a@b.com", "222222");
        store.update_pending_otp(&refreshed).await.unwrap();

        let stored = store.find_pending_otp("a@b.com").await.unwrap().unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.code, "222222");
        assert_eq!(store.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_pending_otp_without_record_is_missing() {
        let store = InMemoryCredentialStore::new();

        let result = store.update_pending_otp(&pending("a@b.com", "222222")).await;
        assert!(matches!(result, Err(StoreError::Missing)));
        assert_eq!(store.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_pending_otp_writes_refused_for_registered_email() {
        let store = InMemoryCredentialStore::new();
        store.create_pending_otp(&pending("a@b.com", "111111")).await.unwrap();
        store.complete_signup(&new_user("a@b.com")).await.unwrap();

        let updated = store.update_pending_otp(&pending("a@b.com", "222222")).await;
        assert!(matches!(updated, Err(StoreError::Missing)));

        let created = store.create_pending_otp(&pending("a@b.com", "333333")).await;
        assert!(matches!(created, Err(StoreError::Duplicate)));
        assert_eq!(store.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_complete_signup_consumes_pending() {
        let store = InMemoryCredentialStore::new();
        store.create_pending_otp(&pending("a@b.com", "111111")).await.unwrap();

        let user = store.complete_signup(&new_user("a@b.com")).await.unwrap();
        assert_eq!(user.user_id, 1);
        assert!(store.find_pending_otp("a@b.com").await.unwrap().is_none());
        assert_eq!(
            store.find_user_by_email("a@b.com").await.unwrap().unwrap().user_id,
            1
        );
    }

    #[tokio::test]
    async fn test_complete_signup_rejects_duplicate_email() {
        let store = InMemoryCredentialStore::new();
        store.complete_signup(&new_user("a@b.com")).await.unwrap();

        let result = store.complete_signup(&new_user("a@b.com")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_user_profile_partial() {
        let store = InMemoryCredentialStore::new();
        let user = store.complete_signup(&new_user("a@b.com")).await.unwrap();

        let updated = store
            .update_user_profile(user.user_id, None, Some("555-0199"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.phone, "555-0199");

        assert!(store
            .update_user_profile(999, Some("Bo"), None)
            .await
            .unwrap()
            .is_none());
    }
}
