use crate::application::admin::view::UserView;
use crate::application::error::UserServiceError;
use crate::application::ports::UserRepository;

use super::require_active;

pub async fn execute<R: UserRepository + ?Sized>(repo: &R, username: &str) -> Result<UserView, UserServiceError> {
    let user = require_active(repo, username).await?;
    Ok(UserView::from(&user))
}
