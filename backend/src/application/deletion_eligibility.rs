use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::ports::RemoteCountGateway;
use crate::domain::{BearerToken, EligibilityDecision, RemoteCountQuery, User};

/// Decides whether a user may be deleted, based on the work items the
/// upstream responsible for the user's role still assigns to them.
///
/// At most one upstream is consulted per decision. The gateway owns retries;
/// this type never calls it twice for the same decision.
#[derive(Clone)]
pub struct DeletionEligibilityEvaluator {
    gateway: Arc<dyn RemoteCountGateway>,
}

impl DeletionEligibilityEvaluator {
    pub fn new(gateway: Arc<dyn RemoteCountGateway>) -> Self {
        Self { gateway }
    }

    pub async fn can_delete(&self, user: &User, auth: &BearerToken) -> EligibilityDecision {
        let Some(service) = user.role().work_service() else {
            debug!(username = %user.username(), role = %user.role(), "role holds no work items, deletion allowed");
            return EligibilityDecision::Allowed;
        };

        let result = self
            .gateway
            .get_count(RemoteCountQuery {
                service,
                owner: user.username().as_str().to_string(),
                auth: auth.clone(),
            })
            .await;

        let decision = EligibilityDecision::from_count(service, result);
        match &decision {
            EligibilityDecision::Allowed => {
                debug!(username = %user.username(), %service, "no active items, deletion allowed");
            }
            EligibilityDecision::Denied { count, .. } => {
                info!(username = %user.username(), %service, count, "user still linked to active items");
            }
            EligibilityDecision::Undetermined { failure, .. } => {
                warn!(username = %user.username(), %service, %failure, "active item count not retrievable");
            }
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockRemoteCountGateway;
    use crate::domain::*;

    fn user(name: &str, role: UserRole) -> User {
        User::new(
            Username::new(name.to_string()).unwrap(),
            UserProfile {
                first_name: PersonName::new("Test".to_string()).unwrap(),
                last_name: PersonName::new("User".to_string()).unwrap(),
                email: Email::new(format!("{name}@example.com")).unwrap(),
                role,
            },
        )
    }

    fn token() -> BearerToken {
        BearerToken::new("caller-token")
    }

    #[tokio::test]
    async fn test_admin_is_allowed_without_remote_call() {
        let mut gateway = MockRemoteCountGateway::new();
        gateway.expect_get_count().times(0);
        let evaluator = DeletionEligibilityEvaluator::new(Arc::new(gateway));

        let decision = evaluator.can_delete(&user("root", UserRole::Admin), &token()).await;

        assert_eq!(decision, EligibilityDecision::Allowed);
    }

    #[tokio::test]
    async fn test_manager_consults_project_service_with_caller_token() {
        let mut gateway = MockRemoteCountGateway::new();
        gateway
            .expect_get_count()
            .withf(|query| {
                query.service == WorkService::Project
                    && query.owner == "carol"
                    && query.auth.expose() == "caller-token"
            })
            .times(1)
            .returning(|_| RemoteCountResult::Success(3));
        let evaluator = DeletionEligibilityEvaluator::new(Arc::new(gateway));

        let decision = evaluator.can_delete(&user("carol", UserRole::Manager), &token()).await;

        assert_eq!(decision, EligibilityDecision::Denied { service: WorkService::Project, count: 3 });
    }

    #[tokio::test]
    async fn test_employee_consults_task_service() {
        let mut gateway = MockRemoteCountGateway::new();
        gateway
            .expect_get_count()
            .withf(|query| query.service == WorkService::Task && query.owner == "bob")
            .times(1)
            .returning(|_| RemoteCountResult::Success(0));
        let evaluator = DeletionEligibilityEvaluator::new(Arc::new(gateway));

        let decision = evaluator.can_delete(&user("bob", UserRole::Employee), &token()).await;

        assert_eq!(decision, EligibilityDecision::Allowed);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_reported_distinctly() {
        let mut gateway = MockRemoteCountGateway::new();
        gateway
            .expect_get_count()
            .times(1)
            .returning(|_| RemoteCountResult::Failure(CountFailure::Timeout));
        let evaluator = DeletionEligibilityEvaluator::new(Arc::new(gateway));

        let decision = evaluator.can_delete(&user("carol", UserRole::Manager), &token()).await;

        assert_eq!(
            decision,
            EligibilityDecision::Undetermined { service: WorkService::Project, failure: CountFailure::Timeout }
        );
    }
}
