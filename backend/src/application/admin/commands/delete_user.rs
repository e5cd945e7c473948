use tracing::{error, info};

use crate::application::deletion_eligibility::DeletionEligibilityEvaluator;
use crate::application::error::UserServiceError;
use crate::application::ports::{IdentityProvider, UserRepository};
use crate::domain::{BearerToken, EligibilityDecision};

use super::require_active;

/// Soft-deletes a user once the owning work service confirms no active items.
///
/// Nothing is mutated unless the decision is `Allowed`. After that the
/// order is fixed: tombstone, deactivate the identity account, persist.
pub async fn execute<R, I>(
    repo: &R,
    identity: &I,
    eligibility: &DeletionEligibilityEvaluator,
    username: &str,
    auth: &BearerToken,
) -> Result<(), UserServiceError>
where
    R: UserRepository + ?Sized,
    I: IdentityProvider + ?Sized,
{
    let mut user = require_active(repo, username).await?;

    match eligibility.can_delete(&user, auth).await {
        EligibilityDecision::Allowed => {}
        EligibilityDecision::Denied { service, count } => {
            return Err(UserServiceError::Conflict { service, count });
        }
        EligibilityDecision::Undetermined { service, failure } => {
            return Err(UserServiceError::UpstreamUnavailable { service, failure });
        }
    }

    let original = user.soft_delete();
    identity.deactivate_account(original.as_str().to_string()).await?;

    repo.save(&user).await.map_err(|e| {
        error!(username = %original, error = %e, "identity account deactivated but deletion was not stored");
        e
    })?;

    info!(username = %original, tombstone = %user.username(), "user deleted");
    Ok(())
}
