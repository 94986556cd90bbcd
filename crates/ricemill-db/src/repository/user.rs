//! # User Repository
//!
//! Login accounts and password verification.
//!
//! ## Authentication Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  username + password                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT password_hash, role ... WHERE username = ? AND is_active = 1   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  argon2 verify (PHC string carries salt and parameters)                │
//! │       │                                                                 │
//! │       ├── mismatch / unknown / inactive ──► None                        │
//! │       └── match ──► Some(Actor { user_id, role })                       │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                  handed to every Ledger write                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use ricemill_core::validation::{validate_full_name, validate_password, validate_username};
use ricemill_core::{Actor, Role, User};

const USER_COLUMNS: &str = "id, username, role, full_name, is_active, created_at, updated_at";

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Credential(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account. The password is stored only as an argon2 hash.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        full_name: &str,
    ) -> DbResult<User> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;
        validate_full_name(full_name)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            role,
            full_name: full_name.trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let password_hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, full_name, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&password_hash)
        .bind(user.role)
        .bind(&user.full_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(id = %user.id, username = %user.username, role = user.role.as_str(), "User created");
        Ok(user)
    }

    /// Verifies credentials and returns the actor capability.
    ///
    /// Unknown usernames, wrong passwords and deactivated accounts all yield
    /// `Ok(None)`; the caller cannot tell them apart.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<Actor>> {
        let row: Option<(String, Role, String)> = sqlx::query_as(
            "SELECT id, role, password_hash FROM users WHERE username = ? AND is_active = 1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((id, role, hash)) if verify_password(password, &hash) => {
                debug!(user_id = %id, "Authentication succeeded");
                Ok(Some(Actor::new(id, role)))
            }
            _ => {
                warn!(username = %username.trim(), "Authentication failed");
                Ok(None)
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// All accounts, active or not, ordered by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Activates or deactivates an account. Accounts are never deleted so
    /// `actor_id` references on sales and movements stay resolvable.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, active, "User activation changed");
        Ok(())
    }

    /// Replaces a user's password.
    pub async fn change_password(&self, id: &str, new_password: &str) -> DbResult<()> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, "Password changed");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let db = test_db().await;
        let user = db
            .users()
            .create("cashier1", "secret1", Role::Cashier, "Counter One")
            .await
            .unwrap();

        let actor = db.users().authenticate("cashier1", "secret1").await.unwrap();
        assert_eq!(actor, Some(Actor::new(user.id.clone(), Role::Cashier)));

        assert!(db.users().authenticate("cashier1", "wrong").await.unwrap().is_none());
        assert!(db.users().authenticate("nobody", "secret1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_authenticate() {
        let db = test_db().await;
        let user = db
            .users()
            .create("admin", "admin123", Role::Admin, "Administrator")
            .await
            .unwrap();

        db.users().set_active(&user.id, false).await.unwrap();
        assert!(db.users().authenticate("admin", "admin123").await.unwrap().is_none());

        let stored = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_db().await;
        db.users()
            .create("admin", "admin123", Role::Admin, "Administrator")
            .await
            .unwrap();

        let err = db
            .users()
            .create("admin", "other123", Role::Cashier, "Someone")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_change_password() {
        let db = test_db().await;
        let user = db
            .users()
            .create("admin", "admin123", Role::Admin, "Administrator")
            .await
            .unwrap();

        db.users().change_password(&user.id, "n3w-pass").await.unwrap();

        assert!(db.users().authenticate("admin", "admin123").await.unwrap().is_none());
        assert!(db.users().authenticate("admin", "n3w-pass").await.unwrap().is_some());
        assert!(matches!(
            db.users().change_password(&user.id, "123").await,
            Err(DbError::Validation(_))
        ));
    }
}
