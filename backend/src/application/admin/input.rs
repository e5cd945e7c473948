use serde::Deserialize;

use crate::application::error::{FieldViolation, UserServiceError};
use crate::domain::{Email, Password, PersonName, UserProfile, UserRole, Username};

/// Unvalidated user fields as submitted by an administrator.
/// Absent fields deserialize as empty and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInput {
    #[serde(alias = "userName")]
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub password: Option<String>,
}

pub struct NewUser {
    pub username: Username,
    pub profile: UserProfile,
    pub password: Password,
}

pub struct UserChanges {
    pub profile: UserProfile,
    pub password: Option<Password>,
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn check<T>(&mut self, field: &'static str, raw: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(reason) => {
                self.0.push(FieldViolation {
                    field,
                    rejected_value: Some(raw.to_string()),
                    reason,
                });
                None
            }
        }
    }

    fn check_secret<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(reason) => {
                self.0.push(FieldViolation {
                    field,
                    rejected_value: None,
                    reason,
                });
                None
            }
        }
    }

    fn missing(&mut self, field: &'static str) {
        self.0.push(FieldViolation {
            field,
            rejected_value: None,
            reason: "must not be blank".to_string(),
        });
    }

    fn into_result<T>(self, value: Option<T>) -> Result<T, UserServiceError> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(UserServiceError::ValidationFailed(self.0)),
        }
    }
}

impl UserInput {
    pub fn validate_for_create(self) -> Result<NewUser, UserServiceError> {
        let mut violations = Violations::default();
        let username = match &self.username {
            Some(raw) => violations.check("username", raw, Username::new(raw.clone())),
            None => {
                violations.missing("username");
                None
            }
        };
        let profile = self.profile(&mut violations);
        let password = match &self.password {
            Some(raw) => violations.check_secret("password", Password::new(raw.clone())),
            None => {
                violations.missing("password");
                None
            }
        };

        let value = match (username, profile, password) {
            (Some(username), Some(profile), Some(password)) => Some(NewUser { username, profile, password }),
            _ => None,
        };
        violations.into_result(value)
    }

    /// Any username in the body is ignored; the caller supplies it separately.
    pub fn validate_for_update(self) -> Result<UserChanges, UserServiceError> {
        let mut violations = Violations::default();
        let profile = self.profile(&mut violations);
        let password = match &self.password {
            Some(raw) if !raw.is_empty() => violations.check_secret("password", Password::new(raw.clone())),
            _ => None,
        };
        violations.into_result(profile.map(|profile| UserChanges { profile, password }))
    }

    fn profile(&self, violations: &mut Violations) -> Option<UserProfile> {
        let first_name = violations.check("firstName", &self.first_name, PersonName::new(self.first_name.clone()));
        let last_name = violations.check("lastName", &self.last_name, PersonName::new(self.last_name.clone()));
        let email = violations.check("email", &self.email, Email::new(self.email.clone()));
        let role = violations.check("role", &self.role, self.role.parse::<UserRole>());

        Some(UserProfile {
            first_name: first_name?,
            last_name: last_name?,
            email: email?,
            role: role?,
        })
    }
}
