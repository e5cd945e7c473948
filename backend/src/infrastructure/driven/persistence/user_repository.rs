use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::PgPool;

use crate::application::ports::{RepositoryError, UserRepository};
use crate::domain::{User, Username};
use crate::infrastructure::driven::persistence::db_types::DbUser;

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, role, enabled, is_deleted";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(format!("Migration failed: {e}")))
    }
}

fn storage_error(user: &User, error: sqlx::Error) -> RepositoryError {
    match error.as_database_error().map(|db| db.kind()) {
        Some(ErrorKind::UniqueViolation) => RepositoryError::Duplicate(user.username().as_str().to_string()),
        _ => RepositoryError::Storage(format!("Failed to save user: {error}")),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_active_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let row: Option<DbUser> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND is_deleted = false"
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(format!("Database error: {e}")))?;

        row.map(User::try_from).transpose()
    }

    async fn find_all_active(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<DbUser> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_deleted = false ORDER BY first_name, username"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(format!("Database error: {e}")))?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn save(&self, user: &User) -> Result<User, RepositoryError> {
        let profile = user.profile();
        // The update branch only fires while the stored row is live, so a
        // concurrent delete or update of a deleted user yields no row.
        let row: Option<DbUser> = sqlx::query_as(&format!(
            "INSERT INTO users ({USER_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                enabled = EXCLUDED.enabled,
                is_deleted = EXCLUDED.is_deleted
             WHERE users.is_deleted = false
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id().as_uuid())
        .bind(user.username().as_str())
        .bind(profile.first_name.as_str())
        .bind(profile.last_name.as_str())
        .bind(profile.email.as_str())
        .bind(profile.role.as_str())
        .bind(user.enabled())
        .bind(user.is_deleted())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error(user, e))?;

        match row {
            Some(row) => User::try_from(row),
            None => Err(RepositoryError::Stale(*user.id())),
        }
    }
}
