pub mod create_user;
pub mod read_user;
pub mod list_users;
pub mod check_user;
pub mod update_user;
pub mod delete_user;

use crate::application::error::UserServiceError;
use crate::application::ports::UserRepository;
use crate::domain::{User, Username};

/// Looks up a live user, treating names that can't exist as absent.
pub(crate) async fn find_active<R: UserRepository + ?Sized>(
    repo: &R,
    username: &str,
) -> Result<Option<User>, UserServiceError> {
    let Ok(username) = Username::new(username.to_string()) else {
        return Ok(None);
    };
    Ok(repo.find_active_by_username(&username).await?)
}

pub(crate) async fn require_active<R: UserRepository + ?Sized>(
    repo: &R,
    username: &str,
) -> Result<User, UserServiceError> {
    find_active(repo, username)
        .await?
        .ok_or(UserServiceError::NotFound)
}
