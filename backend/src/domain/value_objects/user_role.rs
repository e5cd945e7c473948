use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::work_items::WorkService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Manager,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Manager => "Manager",
            UserRole::Employee => "Employee",
        }
    }

    /// The upstream that owns work items assigned to this role, if any.
    pub fn work_service(&self) -> Option<WorkService> {
        match self {
            UserRole::Admin => None,
            UserRole::Manager => Some(WorkService::Project),
            UserRole::Employee => Some(WorkService::Task),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Admin" => Ok(UserRole::Admin),
            "Manager" => Ok(UserRole::Manager),
            "Employee" => Ok(UserRole::Employee),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
