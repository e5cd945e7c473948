use tracing::{error, info};

use crate::application::admin::input::UserInput;
use crate::application::admin::view::UserView;
use crate::application::error::UserServiceError;
use crate::application::ports::{AccountSpec, IdentityProvider, UserRepository};
use crate::domain::User;

pub async fn execute<R, I>(repo: &R, identity: &I, input: UserInput) -> Result<UserView, UserServiceError>
where
    R: UserRepository + ?Sized,
    I: IdentityProvider + ?Sized,
{
    let new_user = input.validate_for_create()?;

    if repo.find_active_by_username(&new_user.username).await?.is_some() {
        info!(username = %new_user.username, "user already exists");
        return Err(UserServiceError::AlreadyExists);
    }

    let user = User::new(new_user.username, new_user.profile);

    identity
        .create_account(AccountSpec::for_user(&user, Some(new_user.password)))
        .await?;

    // The identity account is not rolled back if this fails.
    let saved = repo.save(&user).await.map_err(|e| {
        error!(username = %user.username(), error = %e, "identity account provisioned but user was not stored");
        e
    })?;

    info!(username = %saved.username(), id = %saved.id(), role = %saved.role(), "user created");
    Ok(UserView::from(&saved))
}
