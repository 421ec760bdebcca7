//! User endpoints

use finagent_core::{AuthResponse, CreateUser, SignIn, User};
use tracing::{info, instrument, warn};

use super::FinanceApi;
use crate::error::{Error, Result};
use crate::gateway::{endpoint_path, RequestOptions};

impl FinanceApi {
    /// `POST /user/`
    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_user(&self, data: &CreateUser) -> Result<User> {
        self.gateway
            .request("/user/", RequestOptions::post(data)?)
            .await
    }

    /// `POST /user/signin`. Stores the returned token pair before returning.
    ///
    /// A success response without an access token or user id is rejected
    /// and nothing is stored.
    #[instrument(skip(self, data), fields(username = %data.username))]
    pub async fn sign_in(&self, data: &SignIn) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .gateway
            .request("/user/signin", RequestOptions::post(data)?)
            .await?;

        if response.access_token.is_empty() || response.user.id.is_empty() {
            warn!("Sign-in response carried no session");
            return Err(Error::Auth("Sign-in response did not include a session".into()));
        }

        self.session().store_tokens(&response.token_pair())?;
        info!(user_id = %response.user.id, "Signed in");
        Ok(response)
    }

    /// Drop the token pair. No request is made.
    pub fn sign_out(&self) -> Result<()> {
        self.session().clear_tokens()?;
        Ok(())
    }

    /// `GET /user/{id}`
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.gateway
            .request(&endpoint_path(&["user", user_id])?, RequestOptions::get())
            .await
    }
}
