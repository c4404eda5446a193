//! Auth endpoint surface: signup, password sign-in, identity lookup,
//! password update, sign-out, reset and verification mails.

use serde_json::json;

use super::RemoteClient;
use crate::errors::AppError;
use crate::models::{AuthSession, Identity};

impl RemoteClient {
    /// Create a new account. The backend sends the verification mail.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let resp = self
            .authorize(self.http.post(self.auth_url("signup")))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(resp.json::<Identity>().await?)
    }

    /// Password sign-in. Stores the session and publishes the new identity.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let url = format!("{}?grant_type=password", self.auth_url("token"));
        let resp = self
            .authorize(self.http.post(url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        let session = resp.json::<AuthSession>().await?;
        let identity = session.user.clone();
        self.store_session(session);
        Ok(identity)
    }

    /// Look up the current identity against the backend.
    ///
    /// Without a local session this resolves to `None` with no network call.
    /// A rejected token clears the session.
    pub async fn current_identity(&self) -> Result<Option<Identity>, AppError> {
        if self.access_token().is_none() {
            return Ok(None);
        }

        let resp = self
            .authorize(self.http.get(self.auth_url("user")))
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.clear_session();
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(Some(resp.json::<Identity>().await?))
    }

    /// Update the signed-in user's password.
    pub async fn update_password(&self, new_password: &str) -> Result<(), AppError> {
        if self.access_token().is_none() {
            return Err(AppError::Unauthorized("Please log in.".to_string()));
        }

        let resp = self
            .authorize(self.http.put(self.auth_url("user")))
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(())
    }

    /// Terminate the session. The local session is cleared even when the
    /// backend call fails; sign-out is never blocked on the network.
    pub async fn sign_out(&self) {
        if self.access_token().is_some() {
            let result = self
                .authorize(self.http.post(self.auth_url("logout")))
                .send()
                .await;
            if let Err(err) = result {
                tracing::warn!("sign-out request failed: {}", err);
            }
        }
        self.clear_session();
    }

    /// Request a password-reset mail for the given address.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let resp = self
            .authorize(self.http.post(self.auth_url("recover")))
            .json(&json!({ "email": email }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(())
    }

    /// Ask the backend to resend the signup verification mail.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AppError> {
        let resp = self
            .authorize(self.http.post(self.auth_url("resend")))
            .json(&json!({ "type": "signup", "email": email }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::reject(resp).await);
        }
        Ok(())
    }
}
