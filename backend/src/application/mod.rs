// Application layer - use cases organized by persona
// Orchestrates domain logic, depends on domain layer only

pub mod admin;
pub mod deletion_eligibility;
pub mod error;
pub mod ports;

pub use admin::{UserInput, UserLifecycleCoordinator, UserView};
pub use deletion_eligibility::DeletionEligibilityEvaluator;
pub use error::{FieldViolation, InternalError, UserServiceError};
