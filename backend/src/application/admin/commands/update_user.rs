use tracing::info;

use crate::application::admin::input::UserInput;
use crate::application::admin::view::UserView;
use crate::application::error::UserServiceError;
use crate::application::ports::{AccountSpec, IdentityProvider, UserRepository};

use super::require_active;

/// `username` identifies the user; a username inside `input` is ignored.
pub async fn execute<R, I>(
    repo: &R,
    identity: &I,
    username: &str,
    input: UserInput,
) -> Result<UserView, UserServiceError>
where
    R: UserRepository + ?Sized,
    I: IdentityProvider + ?Sized,
{
    let mut user = require_active(repo, username).await?;
    let changes = input.validate_for_update()?;

    user.apply_update(changes.profile);

    identity
        .update_account(AccountSpec::for_user(&user, changes.password))
        .await?;
    let saved = repo.save(&user).await?;

    info!(username = %saved.username(), id = %saved.id(), "user updated");
    Ok(UserView::from(&saved))
}
