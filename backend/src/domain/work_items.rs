//! Vocabulary for asking the work services whether a user still owns
//! active items, and for the decision derived from the answer.

use std::fmt;
use std::time::Duration;

use super::value_objects::BearerToken;

/// Remote service that owns work items assigned to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkService {
    Project,
    Task,
}

impl WorkService {
    pub fn name(&self) -> &'static str {
        match self {
            WorkService::Project => "project-service",
            WorkService::Task => "task-service",
        }
    }

    pub fn item_label(&self) -> &'static str {
        match self {
            WorkService::Project => "project(s)",
            WorkService::Task => "task(s)",
        }
    }
}

impl fmt::Display for WorkService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// "How many active items does `owner` have in `service`", asked on behalf
/// of the caller holding `auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCountQuery {
    pub service: WorkService,
    pub owner: String,
    pub auth: BearerToken,
}

/// Why a count could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountFailure {
    CircuitOpen { retry_after: Duration },
    Timeout,
    Transport(String),
    UpstreamStatus(u16),
    Unauthorized(u16),
    UpstreamReported(Option<String>),
    MalformedPayload(String),
    InvalidRequest(String),
}

impl CountFailure {
    /// Failures worth another attempt and counted against the circuit.
    pub fn is_transient(&self) -> bool {
        match self {
            CountFailure::Timeout | CountFailure::Transport(_) => true,
            CountFailure::UpstreamStatus(status) => *status >= 500,
            CountFailure::CircuitOpen { .. }
            | CountFailure::Unauthorized(_)
            | CountFailure::UpstreamReported(_)
            | CountFailure::MalformedPayload(_)
            | CountFailure::InvalidRequest(_) => false,
        }
    }
}

impl fmt::Display for CountFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountFailure::CircuitOpen { retry_after } => {
                write!(f, "circuit open (retry after {}ms)", retry_after.as_millis())
            }
            CountFailure::Timeout => f.write_str("request timed out"),
            CountFailure::Transport(detail) => write!(f, "transport error: {detail}"),
            CountFailure::UpstreamStatus(status) => write!(f, "upstream responded with HTTP {status}"),
            CountFailure::Unauthorized(status) => write!(f, "upstream rejected credential (HTTP {status})"),
            CountFailure::UpstreamReported(Some(message)) => write!(f, "upstream reported failure: {message}"),
            CountFailure::UpstreamReported(None) => f.write_str("upstream reported failure"),
            CountFailure::MalformedPayload(detail) => write!(f, "malformed count payload: {detail}"),
            CountFailure::InvalidRequest(detail) => write!(f, "invalid count request: {detail}"),
        }
    }
}

/// Outcome of one logical count lookup. A count is only ever present
/// alongside a success tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCountResult {
    Success(u64),
    Failure(CountFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityDecision {
    Allowed,
    /// The user still owns `count` active items in `service`.
    Denied { service: WorkService, count: u64 },
    /// The count could not be retrieved, so nothing is known about the links.
    Undetermined { service: WorkService, failure: CountFailure },
}

impl EligibilityDecision {
    pub fn from_count(service: WorkService, result: RemoteCountResult) -> Self {
        match result {
            RemoteCountResult::Success(0) => EligibilityDecision::Allowed,
            RemoteCountResult::Success(count) => EligibilityDecision::Denied { service, count },
            RemoteCountResult::Failure(failure) => EligibilityDecision::Undetermined { service, failure },
        }
    }
}
