//! Account view: sign-up/sign-in, password changes, verification mail,
//! sign-out, and the account-deletion stub.

use std::sync::Arc;

use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::Identity;
use crate::session::{SessionResolver, SessionSnapshot};

pub struct AccountFlow {
    client: Arc<RemoteClient>,
    session: Arc<SessionResolver>,
}

impl AccountFlow {
    pub fn new(client: Arc<RemoteClient>, session: Arc<SessionResolver>) -> Self {
        Self { client, session }
    }

    /// Create an account. The backend sends the verification mail and
    /// provisions the profile.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        self.client.sign_up(email, password).await
    }

    /// Sign in and resolve the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionSnapshot, AppError> {
        self.client.sign_in(email, password).await?;
        Ok(self.session.resolve().await)
    }

    /// Change the signed-in user's password. No strength validation.
    pub async fn change_password(&self, new: &str, confirm: &str) -> Result<(), AppError> {
        if new != confirm {
            return Err(AppError::Validation(
                "New passwords do not match".to_string(),
            ));
        }
        self.client.update_password(new).await
    }

    /// Set a new password from the reset flow. Both fields are required
    /// and must match before anything is sent.
    pub async fn reset_password(&self, password: &str, confirm: &str) -> Result<(), AppError> {
        if password.is_empty() || confirm.is_empty() {
            return Err(AppError::Validation(
                "Please enter and confirm your new password.".to_string(),
            ));
        }
        if password != confirm {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        self.client.update_password(password).await
    }

    /// Request a password-reset mail.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        self.client.request_password_reset(email).await
    }

    /// Resend the verification mail to the signed-in address. No
    /// application-side rate limiting.
    pub async fn resend_verification(&self) -> Result<(), AppError> {
        let snapshot = self.session.snapshot();
        let identity = snapshot
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))?;
        let email = identity
            .email
            .ok_or_else(|| AppError::Validation("No email address on record.".to_string()))?;
        self.client.resend_verification(&email).await
    }

    /// Terminate the session and re-resolve (to the logged-out state).
    pub async fn sign_out(&self) -> SessionSnapshot {
        self.client.sign_out().await;
        self.session.resolve().await
    }

    /// Account deletion is not implemented: the backend exposes no
    /// deletion capability. Nothing is sent; the caller gets an
    /// acknowledgement to display after its confirmation prompt.
    pub fn request_account_deletion(&self) -> &'static str {
        "Account deletion request submitted. Deletion is not yet available on the backend."
    }
}
