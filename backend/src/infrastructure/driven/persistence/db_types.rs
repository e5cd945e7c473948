use crate::application::ports::RepositoryError;
use crate::domain::{Email, PersonName, User, UserId, UserProfile, UserRole, Username};

#[derive(Debug, sqlx::FromRow)]
pub struct DbUser {
    pub id: uuid::Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub enabled: bool,
    pub is_deleted: bool,
}

impl TryFrom<DbUser> for User {
    type Error = RepositoryError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, reason: String| RepositoryError::Corrupt(format!("user {} {field}: {reason}", row.id));

        let profile = UserProfile {
            first_name: PersonName::new(row.first_name.clone()).map_err(|e| corrupt("first_name", e))?,
            last_name: PersonName::new(row.last_name.clone()).map_err(|e| corrupt("last_name", e))?,
            email: Email::new(row.email.clone()).map_err(|e| corrupt("email", e))?,
            role: row.role.parse::<UserRole>().map_err(|e| corrupt("role", e))?,
        };

        // live names can never carry the id suffix, deleted ones always do
        let username = Username::from_persistence(row.username);
        if username.is_tombstoned() != row.is_deleted {
            return Err(corrupt("username", format!("'{username}' does not match is_deleted={}", row.is_deleted)));
        }

        Ok(User::from_persistence(
            UserId::from_uuid(row.id),
            username,
            profile,
            row.enabled,
            row.is_deleted,
        ))
    }
}
