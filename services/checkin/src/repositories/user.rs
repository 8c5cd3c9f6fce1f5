//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult, is_unique_violation};
use crate::models::{EditableField, NewUser, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user
    ///
    /// The password is hashed with argon2 before it reaches the database.
    /// A duplicate student id surfaces as a validation error, not a 500.
    pub async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        info!("Creating new user: {}", new_user.username);

        let password_hash = hash_password(&new_user.password)?;

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, name, department, contact, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, name, department, contact, password_hash, is_admin, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.name)
        .bind(&new_user.department)
        .bind(&new_user.contact)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(
                "Student id is already registered".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Find a user by student id
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, department, contact, password_hash, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, department, contact, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List users for the admin table, ordered by id, one page at a time
    pub async fn list_paginated(&self, page: i64, per_page: i64) -> AppResult<Vec<User>> {
        let offset = (page.max(1) - 1) * per_page;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, department, contact, password_hash, is_admin, created_at
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Total number of registered users
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Delete a user by ID
    ///
    /// Check-in records are deliberately left in place; they are keyed by
    /// student id and remain valid history after the account is gone.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        info!("Deleting user {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update one editable profile field
    ///
    /// Each field maps to its own typed UPDATE; there is no dynamic
    /// column-name interpolation.
    pub async fn update_field(
        &self,
        id: i64,
        field: EditableField,
        value: &str,
    ) -> AppResult<bool> {
        info!("Updating {} for user {}", field.column(), id);

        let query = match field {
            EditableField::Name => sqlx::query("UPDATE users SET name = $1 WHERE id = $2"),
            EditableField::Department => {
                sqlx::query("UPDATE users SET department = $1 WHERE id = $2")
            }
            EditableField::Contact => sqlx::query("UPDATE users SET contact = $1 WHERE id = $2"),
        };

        let result = query.bind(value).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set a new password for a user, identified by student id
    pub async fn set_password(&self, username: &str, new_password: &str) -> AppResult<bool> {
        info!("Changing password for user {}", username);

        let password_hash = hash_password(new_password)?;

        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE username = $2")
            .bind(&password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Verify a user's password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&user.password_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password with argon2 and a fresh salt
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AppError::InternalServerError
        })?
        .to_string();

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_hash(hash: &str) -> User {
        User {
            id: 1,
            username: "202500010001".to_string(),
            name: "Test".to_string(),
            department: "Engineering".to_string(),
            contact: "12345".to_string(),
            password_hash: hash.to_string(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2!").unwrap();
        let user = user_with_hash(&hash);

        let repo = UserRepository {
            pool: PgPool::connect_lazy("postgresql://localhost/unused").unwrap(),
        };
        assert!(repo.verify_password(&user, "hunter2!"));
        assert!(!repo.verify_password(&user, "hunter3!"));
    }

    #[tokio::test]
    async fn test_verify_password_with_malformed_hash() {
        let user = user_with_hash("not-an-argon2-hash");

        let repo = UserRepository {
            pool: PgPool::connect_lazy("postgresql://localhost/unused").unwrap(),
        };
        assert!(!repo.verify_password(&user, "anything"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }
}
