// Driven port - active work item counts held by other services

use async_trait::async_trait;

use crate::domain::{RemoteCountQuery, RemoteCountResult};

/// Never returns an error: every failure is folded into
/// [`RemoteCountResult::Failure`] so callers cannot mistake it for a count.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCountGateway: Send + Sync {
    async fn get_count(&self, query: RemoteCountQuery) -> RemoteCountResult;
}
