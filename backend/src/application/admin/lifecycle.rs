use std::sync::Arc;

use crate::application::admin::commands::{check_user, create_user, delete_user, list_users, read_user, update_user};
use crate::application::admin::input::UserInput;
use crate::application::admin::view::UserView;
use crate::application::deletion_eligibility::DeletionEligibilityEvaluator;
use crate::application::error::UserServiceError;
use crate::application::ports::{IdentityProvider, RemoteCountGateway, UserRepository};
use crate::domain::BearerToken;

/// Entry point for every user lifecycle operation.
///
/// The caller's credential is passed explicitly to the operations that
/// reach other services; nothing is read from ambient request state.
#[derive(Clone)]
pub struct UserLifecycleCoordinator {
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
    eligibility: DeletionEligibilityEvaluator,
}

impl UserLifecycleCoordinator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        identity: Arc<dyn IdentityProvider>,
        work_items: Arc<dyn RemoteCountGateway>,
    ) -> Self {
        Self {
            users,
            identity,
            eligibility: DeletionEligibilityEvaluator::new(work_items),
        }
    }

    pub async fn create(&self, input: UserInput) -> Result<UserView, UserServiceError> {
        create_user::execute(&*self.users, &*self.identity, input).await
    }

    pub async fn read_by_username(&self, username: &str) -> Result<UserView, UserServiceError> {
        read_user::execute(&*self.users, username).await
    }

    /// Live users ordered by first name.
    pub async fn read_all(&self) -> Result<Vec<UserView>, UserServiceError> {
        list_users::execute(&*self.users).await
    }

    pub async fn exists(&self, username: &str) -> Result<bool, UserServiceError> {
        check_user::execute(&*self.users, username).await
    }

    pub async fn update(&self, username: &str, input: UserInput) -> Result<UserView, UserServiceError> {
        update_user::execute(&*self.users, &*self.identity, username, input).await
    }

    pub async fn delete(&self, username: &str, auth: &BearerToken) -> Result<(), UserServiceError> {
        delete_user::execute(&*self.users, &*self.identity, &self.eligibility, username, auth).await
    }
}
