use crate::domain::value_objects::*;

/// Fields an administrator may set on create and replace on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    profile: UserProfile,
    enabled: bool,
    is_deleted: bool,
}

impl User {
    pub fn new(username: Username, profile: UserProfile) -> Self {
        Self {
            id: UserId::new(),
            username,
            profile,
            enabled: true,
            is_deleted: false,
        }
    }

    pub fn from_persistence(
        id: UserId,
        username: Username,
        profile: UserProfile,
        enabled: bool,
        is_deleted: bool,
    ) -> Self {
        Self {
            id,
            username,
            profile,
            enabled,
            is_deleted,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn role(&self) -> UserRole {
        self.profile.role
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Replaces every mutable field; id and username are kept.
    pub fn apply_update(&mut self, profile: UserProfile) {
        self.profile = profile;
        self.enabled = true;
    }

    /// Marks the user deleted and frees the username for reuse.
    /// Returns the username the account held before deletion.
    pub fn soft_delete(&mut self) -> Username {
        let tombstone = self.username.tombstoned(&self.id);
        self.is_deleted = true;
        std::mem::replace(&mut self.username, tombstone)
    }
}
