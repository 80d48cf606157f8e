//! Authentication service: credentials, tokens and identity resolution

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        load_report::{LoadReport, UpsertOutcome, UserSeed},
        user::{Identity, NewUser, RegisterUser, Role, User, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and password and return a JWT token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((token, user))
    }

    /// Register a new reader account
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        let new_user = NewUser {
            email: request.email,
            password_hash: self.hash_password(&request.password)?,
            role: Role::User,
            forenames: request.forenames,
            surname: request.surname,
        };

        let (user, inserted) = self.repository.insert_user_if_absent(&new_user).await?;
        if !inserted {
            return Err(AppError::Conflict(format!("User {} already exists", new_user.email)));
        }
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Resolve a bearer token into the caller identity
    pub fn resolve_identity(&self, token: &str) -> AppResult<Identity> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?
            .into_identity()
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            exp: now + self.token_lifetime(),
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Seed users; existing emails are skipped
    pub async fn seed_users(&self, seeds: &[UserSeed]) -> AppResult<LoadReport> {
        let mut report = LoadReport::default();

        for (index, seed) in seeds.iter().enumerate() {
            if let Err(e) = seed.validate() {
                let e = AppError::from(e);
                report.fail(index, &seed.email, &e);
                continue;
            }

            if self.repository.get_user_by_email(&seed.email).await?.is_some() {
                tracing::debug!(email = %seed.email, "Skipping existing user");
                report.record(UpsertOutcome::Unchanged);
                continue;
            }

            let new_user = NewUser {
                email: seed.email.clone(),
                password_hash: self.hash_password(&seed.password)?,
                role: seed.role,
                forenames: seed.forenames.clone(),
                surname: seed.surname.clone(),
            };
            let (_, inserted) = self.repository.insert_user_if_absent(&new_user).await?;
            report.record(if inserted {
                UpsertOutcome::Created
            } else {
                UpsertOutcome::Unchanged
            });
        }

        tracing::info!(%report, "User seeding finished");
        Ok(report)
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
