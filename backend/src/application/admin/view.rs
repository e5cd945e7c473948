use serde::Serialize;

use crate::domain::{User, UserId, UserRole};

/// Read model returned for a user. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub enabled: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        let profile = user.profile();
        Self {
            id: *user.id(),
            username: user.username().as_str().to_string(),
            first_name: profile.first_name.as_str().to_string(),
            last_name: profile.last_name.as_str().to_string(),
            email: profile.email.as_str().to_string(),
            role: profile.role,
            enabled: user.enabled(),
        }
    }
}
