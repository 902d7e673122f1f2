//! Application services: credential login and token refresh.

use std::sync::Arc;

use anyhow::Context;

use portal_auth::{Claims, PolicyResolver, TokenPair, TokenService};
use portal_infra::{PasswordVerifier, UserDirectory, UserRecord, DUMMY_PASSWORD_HASH};

use crate::app::errors::ApiError;
use crate::config::RunMode;

pub const INVALID_CREDENTIALS: &str = "Email hoặc mật khẩu không đúng.";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
    pub policies: Arc<PolicyResolver>,
    pub mode: RunMode,
}

impl AppState {
    pub fn new(
        tokens: TokenService,
        directory: Arc<dyn UserDirectory>,
        passwords: Arc<dyn PasswordVerifier>,
        mode: RunMode,
    ) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            auth: Arc::new(AuthService::new(Arc::clone(&tokens), directory, passwords)),
            tokens,
            policies: Arc::new(PolicyResolver::default()),
            mode,
        }
    }
}

/// Issues token pairs from credentials or a refresh token.
///
/// Both paths build claims from the directory's current view of the user, so
/// a refresh picks up role and grant changes made since the last login.
pub struct AuthService {
    tokens: Arc<TokenService>,
    directory: Arc<dyn UserDirectory>,
    passwords: Arc<dyn PasswordVerifier>,
}

impl AuthService {
    pub fn new(
        tokens: Arc<TokenService>,
        directory: Arc<dyn UserDirectory>,
        passwords: Arc<dyn PasswordVerifier>,
    ) -> Self {
        Self {
            tokens,
            directory,
            passwords,
        }
    }

    /// Verify credentials and issue a token pair.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller,
    /// in message and in hashing cost.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        let Some(user) = self.directory.find_by_email(email).await? else {
            self.verify_password(password, DUMMY_PASSWORD_HASH.to_string()).await?;
            tracing::info!("login rejected: unknown or inactive account");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !self.verify_password(password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.user_id, "login rejected: wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let pair = self.issue_for(user).await?;
        Ok(pair)
    }

    /// Exchange a valid refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.tokens.validate_refresh(refresh_token).map_err(|e| {
            tracing::info!(error = %e, "refresh rejected");
            ApiError::Unauthorized(INVALID_REFRESH_TOKEN.to_string())
        })?;

        let Some(user) = self.directory.find_by_id(claims.user_id()).await? else {
            tracing::warn!(user_id = %claims.user_id(), "refresh rejected: account no longer active");
            return Err(ApiError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        };

        self.issue_for(user).await
    }

    async fn verify_password(&self, password: &str, stored_hash: String) -> Result<bool, ApiError> {
        let verifier = Arc::clone(&self.passwords);
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verifier.verify(&password, &stored_hash))
            .await
            .context("password verification task failed")?;
        Ok(matches)
    }

    async fn issue_for(&self, user: UserRecord) -> Result<TokenPair, ApiError> {
        let permissions = self.directory.permissions_for(user.user_id).await?;
        let claims = Claims::new(user.user_id, user.email, user.role_id, permissions);

        let pair = self
            .tokens
            .issue_pair(&claims)
            .context("failed to sign token pair")?;

        tracing::info!(
            user_id = %claims.user_id(),
            role = claims.role_name(),
            permissions = claims.permissions().len(),
            "token pair issued"
        );
        Ok(pair)
    }
}
