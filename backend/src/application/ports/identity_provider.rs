// Driven port - identity provider account provisioning

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Password, User};

#[derive(Debug, Error)]
pub enum IdentityProviderError {
    #[error("identity provider request failed: {0}")]
    Transport(String),

    #[error("identity provider rejected {operation}: HTTP {status}")]
    Rejected { operation: &'static str, status: u16 },

    #[error("account {0} not found in identity provider")]
    AccountNotFound(String),
}

/// Account representation handed to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSpec {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enabled: bool,
    pub password: Option<Password>,
}

impl AccountSpec {
    pub fn for_user(user: &User, password: Option<Password>) -> Self {
        let profile = user.profile();
        Self {
            username: user.username().as_str().to_string(),
            first_name: profile.first_name.as_str().to_string(),
            last_name: profile.last_name.as_str().to_string(),
            email: profile.email.as_str().to_string(),
            enabled: user.enabled(),
            password,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, account: AccountSpec) -> Result<(), IdentityProviderError>;

    async fn update_account(&self, account: AccountSpec) -> Result<(), IdentityProviderError>;

    async fn deactivate_account(&self, username: String) -> Result<(), IdentityProviderError>;
}
