pub mod user_id;
pub mod email;
pub mod person_name;
pub mod username;
pub mod user_role;
pub mod secrets;

pub use user_id::UserId;
pub use email::Email;
pub use person_name::PersonName;
pub use username::Username;
pub use user_role::UserRole;
pub use secrets::{BearerToken, Password};
