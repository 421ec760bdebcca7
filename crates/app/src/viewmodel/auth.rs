//! Authentication view model

use std::sync::Arc;

use finagent_core::{CreateUser, SignIn, User};
use finagent_net::FinanceApi;
use tracing::{info, warn};

use crate::error::{AppError, Result};

pub struct AuthViewModel {
    api: Arc<FinanceApi>,
}

impl AuthViewModel {
    pub fn new(api: Arc<FinanceApi>) -> Self {
        Self { api }
    }

    /// Sign in and cache the user for display
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".into(),
            ));
        }

        let response = self
            .api
            .sign_in(&SignIn {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.api.session().store_user(&response.user)?;
        Ok(response.user)
    }

    /// Create an account, then sign in with the same password.
    ///
    /// If the automatic sign-in fails the new account is still cached, so the
    /// user lands on the dashboard without tokens.
    pub async fn create_account(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AppError::Validation(
                "Name, email and password are required".into(),
            ));
        }

        let created = self
            .api
            .create_user(&CreateUser {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!(user_id = %created.id, "Account created");

        let sign_in = SignIn {
            username: created.username.clone(),
            password: password.to_string(),
        };
        let user = match self.api.sign_in(&sign_in).await {
            Ok(response) => response.user,
            Err(e) => {
                warn!(error = %e, "Auto sign-in after account creation failed");
                created
            }
        };

        self.api.session().store_user(&user)?;
        Ok(user)
    }

    /// Clear tokens and the cached user
    pub fn sign_out(&self) -> Result<()> {
        self.api.sign_out()?;
        self.api.session().clear_user()?;
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.api.session().cached_user()
    }

    /// Token present and not expired
    pub fn check_auth_status(&self) -> bool {
        self.api.session().is_authenticated()
    }

    /// Route guard for dashboard commands
    pub fn require_session(&self) -> Result<User> {
        if !self.check_auth_status() {
            return Err(AppError::NotSignedIn);
        }
        self.current_user().ok_or(AppError::NotSignedIn)
    }

    /// Re-read the signed-in user from the backend and update the cache
    pub async fn refresh_profile(&self) -> Result<User> {
        let cached = self.current_user().ok_or(AppError::NotSignedIn)?;
        let user = self.api.get_user(&cached.id).await?;
        if user.id.is_empty() {
            // Body did not decode into a user; keep what we have
            return Ok(cached);
        }
        self.api.session().store_user(&user)?;
        Ok(user)
    }
}
