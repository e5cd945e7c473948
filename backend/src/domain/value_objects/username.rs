use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 50;
const UUID_TEXT_LEN: usize = 36;

/// Login name, unique among live users.
///
/// A deleted user keeps a tombstoned form `<name>-<id>` so the original
/// name can be claimed again. Tombstoned names never pass [`Username::new`],
/// which keeps them out of reach of lookups and new accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub fn new(username: String) -> Result<Self, String> {
        let length = username.chars().count();
        if length < MIN_USERNAME_CHARS || length > MAX_USERNAME_CHARS {
            return Err(format!(
                "Username must be between {MIN_USERNAME_CHARS} and {MAX_USERNAME_CHARS} characters"
            ));
        }
        if username.chars().any(char::is_whitespace) {
            return Err("Username cannot contain whitespace".to_string());
        }
        if has_tombstone_suffix(&username) {
            return Err("Username cannot end with a reserved id suffix".to_string());
        }
        Ok(Self(username))
    }

    /// Rebuilds a username read back from storage, tombstoned or not.
    pub fn from_persistence(username: String) -> Self {
        Self(username)
    }

    pub fn tombstoned(&self, id: &UserId) -> Self {
        Self(format!("{}-{}", self.0, id))
    }

    pub fn is_tombstoned(&self) -> bool {
        has_tombstone_suffix(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn has_tombstone_suffix(username: &str) -> bool {
    let Some(split) = username.len().checked_sub(UUID_TEXT_LEN + 1) else {
        return false;
    };
    if !username.is_char_boundary(split) {
        return false;
    }
    let (_, suffix) = username.split_at(split);
    suffix
        .strip_prefix('-')
        .is_some_and(|id| uuid::Uuid::parse_str(id).is_ok())
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(Username::new("ab".to_string()).is_err());
        assert!(Username::new("abc".to_string()).is_ok());
        assert!(Username::new("a".repeat(51)).is_err());
    }

    #[test]
    fn test_username_rejects_whitespace() {
        assert!(Username::new("al ice".to_string()).is_err());
    }

    #[test]
    fn test_tombstoned_name_is_not_a_valid_username() {
        let id = UserId::new();
        let tombstone = Username::new("alice".to_string()).unwrap().tombstoned(&id);

        assert_eq!(tombstone.as_str(), format!("alice-{id}"));
        assert!(tombstone.is_tombstoned());
        assert!(Username::new(tombstone.as_str().to_string()).is_err());
    }

    #[test]
    fn test_hyphenated_names_are_not_tombstones() {
        let name = Username::new("mary-jane".to_string()).unwrap();
        assert!(!name.is_tombstoned());
    }

    proptest! {
        #[test]
        fn prop_tombstone_keeps_original_prefix(name in "[a-z][a-z0-9_.]{2,40}") {
            let id = UserId::new();
            let original = Username::new(name.clone()).unwrap();
            let tombstone = original.tombstoned(&id);

            let prefix = format!("{name}-");
            prop_assert!(tombstone.as_str().starts_with(&prefix));
            prop_assert!(tombstone.is_tombstoned());
            prop_assert!(!original.is_tombstoned());
        }
    }
}
