use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use shared::ResponseWrapper;
use tokio_retry::RetryIf;
use tracing::{debug, warn};
use url::Url;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::retry::RetryPolicy;
use crate::application::ports::RemoteCountGateway;
use crate::domain::{BearerToken, CountFailure, RemoteCountQuery, RemoteCountResult, WorkService};

const OWNER_PLACEHOLDER: &str = "{owner}";

/// Where and how to reach one work service.
#[derive(Debug, Clone)]
pub struct UpstreamEndpoint {
    pub base_url: Url,
    /// Path of the count endpoint. `{owner}` is replaced by the encoded
    /// owner; without it the owner is sent as the `owner` query parameter.
    pub count_path: String,
    /// Per-attempt deadline covering connect, request and body.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

struct Upstream {
    service: WorkService,
    endpoint: UpstreamEndpoint,
    client: Client,
    breaker: CircuitBreaker,
}

impl Upstream {
    fn new(service: WorkService, endpoint: UpstreamEndpoint, breaker: CircuitBreakerConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(endpoint.timeout)
            .connect_timeout(endpoint.connect_timeout)
            .build()?;
        Ok(Self {
            service,
            endpoint,
            client,
            breaker: CircuitBreaker::new(service.name(), breaker),
        })
    }

    fn count_url(&self, owner: &str) -> Result<Url, CountFailure> {
        let invalid = |e: url::ParseError| CountFailure::InvalidRequest(e.to_string());
        let path = &self.endpoint.count_path;

        if path.contains(OWNER_PLACEHOLDER) {
            let encoded = utf8_percent_encode(owner, NON_ALPHANUMERIC).to_string();
            self.endpoint
                .base_url
                .join(&path.replace(OWNER_PLACEHOLDER, &encoded))
                .map_err(invalid)
        } else {
            let mut url = self.endpoint.base_url.join(path).map_err(invalid)?;
            url.query_pairs_mut().append_pair("owner", owner);
            Ok(url)
        }
    }

    async fn attempt(&self, url: &Url, auth: &BearerToken) -> Result<u64, CountFailure> {
        let permit = self
            .breaker
            .try_acquire()
            .map_err(|retry_after| CountFailure::CircuitOpen { retry_after })?;

        let outcome = self.fetch(url, auth).await;
        match &outcome {
            Err(failure) if failure.is_transient() => permit.failed(),
            _ => permit.succeeded(),
        }
        outcome
    }

    async fn fetch(&self, url: &Url, auth: &BearerToken) -> Result<u64, CountFailure> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(auth.expose())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CountFailure::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(CountFailure::UpstreamStatus(status.as_u16()));
        }

        let body: ResponseWrapper<u64> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CountFailure::Timeout
            } else {
                CountFailure::MalformedPayload(e.to_string())
            }
        })?;

        if !body.success {
            return Err(CountFailure::UpstreamReported(body.message));
        }
        body.data
            .ok_or_else(|| CountFailure::MalformedPayload("success without a count".to_string()))
    }
}

fn classify(error: reqwest::Error) -> CountFailure {
    if error.is_timeout() {
        CountFailure::Timeout
    } else {
        CountFailure::Transport(error.to_string())
    }
}

/// Count gateway over HTTP, with one circuit breaker per upstream and a
/// shared retry policy applied once per logical lookup.
pub struct HttpRemoteCountGateway {
    project: Upstream,
    task: Upstream,
    retry: RetryPolicy,
}

impl HttpRemoteCountGateway {
    pub fn new(
        project: UpstreamEndpoint,
        task: UpstreamEndpoint,
        retry: RetryPolicy,
        breaker: CircuitBreakerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            project: Upstream::new(WorkService::Project, project, breaker.clone())?,
            task: Upstream::new(WorkService::Task, task, breaker)?,
            retry,
        })
    }

    pub fn circuit_state(&self, service: WorkService) -> super::CircuitState {
        self.upstream(service).breaker.state()
    }

    fn upstream(&self, service: WorkService) -> &Upstream {
        match service {
            WorkService::Project => &self.project,
            WorkService::Task => &self.task,
        }
    }
}

#[async_trait]
impl RemoteCountGateway for HttpRemoteCountGateway {
    async fn get_count(&self, query: RemoteCountQuery) -> RemoteCountResult {
        let upstream = self.upstream(query.service);
        let url = match upstream.count_url(&query.owner) {
            Ok(url) => url,
            Err(failure) => return RemoteCountResult::Failure(failure),
        };

        let attempts = AtomicU32::new(0);
        let outcome = RetryIf::start(
            self.retry.delays(),
            || {
                attempts.fetch_add(1, Ordering::Relaxed);
                upstream.attempt(&url, &query.auth)
            },
            |failure: &CountFailure| {
                debug!(
                    service = %query.service,
                    attempt = attempts.load(Ordering::Relaxed),
                    %failure,
                    transient = failure.is_transient(),
                    "count attempt failed"
                );
                failure.is_transient()
            },
        )
        .await;

        match outcome {
            Ok(count) => {
                debug!(service = %query.service, owner = %query.owner, count, "active item count retrieved");
                RemoteCountResult::Success(count)
            }
            Err(failure) => {
                warn!(service = %query.service, owner = %query.owner, attempts = attempts.load(Ordering::Relaxed), %failure, "active item count unavailable");
                RemoteCountResult::Failure(failure)
            }
        }
    }
}
