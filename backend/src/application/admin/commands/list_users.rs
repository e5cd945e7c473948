use crate::application::admin::view::UserView;
use crate::application::error::UserServiceError;
use crate::application::ports::UserRepository;

pub async fn execute<R: UserRepository + ?Sized>(repo: &R) -> Result<Vec<UserView>, UserServiceError> {
    let users = repo.find_all_active().await?;
    Ok(users.iter().map(UserView::from).collect())
}
