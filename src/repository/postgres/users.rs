//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a user; an existing email is left untouched
    pub async fn insert_if_absent(&self, user: &NewUser) -> AppResult<(User, bool)> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role, forenames, surname, created_at)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.forenames)
        .bind(&user.surname)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(created) => Ok((created, true)),
            None => {
                let existing = self.get_by_email(&user.email).await?.ok_or_else(|| {
                    AppError::Internal(format!("User {} vanished after conflict", user.email))
                })?;
                Ok((existing, false))
            }
        }
    }
}
