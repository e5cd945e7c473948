use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{RepositoryError, UserRepository};
use crate::domain::{User, UserId, Username};

/// Process-local user store with the same conditional-save rules as the
/// Postgres store. Used when no database is configured.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a stored user regardless of its deleted flag.
    pub fn find_by_id(&self, id: &UserId) -> Option<User> {
        self.users.read().get(id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_active_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| !user.is_deleted() && user.username() == username)
            .cloned())
    }

    async fn find_all_active(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .values()
            .filter(|user| !user.is_deleted())
            .cloned()
            .collect();

        users.sort_by(|a, b| {
            (a.profile().first_name.as_str(), a.username().as_str())
                .cmp(&(b.profile().first_name.as_str(), b.username().as_str()))
        });
        Ok(users)
    }

    async fn save(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.write();

        if users.get(user.id()).is_some_and(User::is_deleted) {
            return Err(RepositoryError::Stale(*user.id()));
        }
        if !user.is_deleted()
            && users
                .values()
                .any(|other| other.id() != user.id() && !other.is_deleted() && other.username() == user.username())
        {
            return Err(RepositoryError::Duplicate(user.username().as_str().to_string()));
        }

        users.insert(*user.id(), user.clone());
        Ok(user.clone())
    }
}
