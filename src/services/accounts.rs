//! Account service: authentication, password reset issuance and the
//! deactivation cancellation cascade.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use std::time::Duration as StdDuration;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::Repository,
    services::{email::EmailService, redis::RedisService},
};

/// Audit note written on every appointment cancelled by the cascade
pub const DEACTIVATION_NOTE: &str = "cancelled due to account deactivation";

const RESET_RATE_LIMIT_SECS: u64 = 900;

/// Outcome of a deactivation run. A second run for the same account reports
/// zero cancellations and `already_deactivated`, never an error.
#[derive(Debug, Clone, Copy, serde::Serialize, utoipa::ToSchema)]
pub struct DeactivationSummary {
    pub cancelled_appointments: u64,
    pub already_deactivated: bool,
}

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    config: AuthConfig,
    email: EmailService,
    redis: RedisService,
    email_send_timeout_secs: u64,
}

impl AccountsService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        email: EmailService,
        redis: RedisService,
        email_send_timeout_secs: u64,
    ) -> Self {
        Self { repository, config, email, redis, email_send_timeout_secs }
    }

    /// Authenticate by email and password, returning (jwt, refresh token, user)
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, String, User)> {
        let user = self
            .repository
            .users
            .find_active_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;

        let refresh_token = random_token();
        let expires_at = Utc::now() + Duration::days(self.config.refresh_token_days);
        self.repository
            .users
            .store_refresh_token(user.id, &hash_token(&refresh_token), expires_at)
            .await?;

        Ok((token, refresh_token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Issue a password-reset token and email it.
    ///
    /// The response never reveals whether the email resolves to an account.
    /// The token is persisted before the send attempt; the send itself runs
    /// under its own timeout because SMTP is a known slow dependency. If the
    /// send fails after persisting, the token stays valid and a retry emails
    /// it again (at most one extra email).
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let rate_key = format!("pwreset:{}", email.to_lowercase());
        if !self.redis.try_set_if_absent(&rate_key, RESET_RATE_LIMIT_SECS).await? {
            tracing::debug!("password reset for {} rate limited", email);
            return Ok(());
        }

        let user = match self.repository.users.find_active_by_email(email).await? {
            Some(user) => user,
            None => return Ok(()),
        };

        let token = random_token();
        let expires_at = Utc::now() + Duration::minutes(self.config.reset_token_minutes);
        self.repository
            .users
            .store_reset_token(user.id, &hash_token(&token), expires_at)
            .await?;

        let send = self.email.send_password_reset(&user.email, &token);
        match tokio::time::timeout(StdDuration::from_secs(self.email_send_timeout_secs), send).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::DependencyTimeout(
                "password reset email send timed out".to_string(),
            )),
        }
    }

    /// Deactivate an account: cancel every active appointment involving it
    /// (as customer or as stylist), revoke its tokens and mark it
    /// deactivated, all in one transaction. Idempotent.
    pub async fn deactivate_account(&self, user_id: i32) -> AppResult<DeactivationSummary> {
        // Resolve first so an unknown id is a 404, not a silent no-op
        self.repository.users.get_by_id(user_id).await?;

        let mut tx = self.repository.pool.begin().await?;

        let cancelled_appointments = self
            .repository
            .appointments
            .cancel_active_for_user(&mut tx, user_id, DEACTIVATION_NOTE)
            .await?;

        self.repository.users.revoke_refresh_tokens(&mut tx, user_id).await?;
        self.repository.users.invalidate_reset_tokens(&mut tx, user_id).await?;

        let newly_deactivated = self.repository.users.deactivate(&mut tx, user_id).await?;

        tx.commit().await?;

        tracing::info!(
            user_id,
            cancelled_appointments,
            newly_deactivated,
            "account deactivated"
        );

        Ok(DeactivationSummary {
            cancelled_appointments,
            already_deactivated: !newly_deactivated,
        })
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if let Some(ref hash) = user.password {
            let parsed_hash = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(false)
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

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

/// Tokens are stored hashed; a database leak does not leak usable tokens
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tokens_are_unique_and_sized() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 48);
        assert_ne!(a, b);
    }

    #[test]
    fn token_hash_is_stable_hex_sha256() {
        let h = hash_token("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_token("abc"));
        assert_ne!(h, hash_token("abd"));
    }
}
