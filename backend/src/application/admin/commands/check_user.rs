use crate::application::error::UserServiceError;
use crate::application::ports::UserRepository;

use super::find_active;

pub async fn execute<R: UserRepository + ?Sized>(repo: &R, username: &str) -> Result<bool, UserServiceError> {
    Ok(find_active(repo, username).await?.is_some())
}
