// Service configuration - defaults, optional files, then USER_SERVICE__* environment

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::driven::work_services::{CircuitBreakerConfig, RetryPolicy, UpstreamEndpoint};
use super::driven::KeycloakSettings;
use crate::domain::BearerToken;

const CONFIG_PATH_VAR: &str = "USER_SERVICE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub upstreams: UpstreamsSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    pub identity: IdentitySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Absent selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: None, max_connections: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamsSettings {
    pub project: UpstreamSettings,
    pub task: UpstreamSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    pub base_url: String,
    #[serde(default = "default_count_path")]
    pub count_path: String,
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_count_path() -> String {
    "/count".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    2_000
}

fn default_connect_timeout_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: 3, initial_backoff_ms: 100, max_backoff_ms: 1_000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub window_secs: u64,
    pub open_cooldown_secs: u64,
    pub half_open_successes: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window_secs: 60,
            open_cooldown_secs: 30,
            half_open_successes: 2,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct IdentitySettings {
    pub base_url: String,
    pub realm: String,
    pub admin_token: String,
    #[serde(default = "default_identity_timeout_ms")]
    pub timeout_ms: u64,
}

impl std::fmt::Debug for IdentitySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySettings")
            .field("base_url", &self.base_url)
            .field("realm", &self.realm)
            .field("admin_token", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

fn default_identity_timeout_ms() -> u64 {
    5_000
}

impl Settings {
    /// Loads `config/default.toml` and the file named by `USER_SERVICE_CONFIG`
    /// when present, then `USER_SERVICE__SECTION__KEY` variables, and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));
        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            builder = builder.add_source(File::with_name(&path).required(false));
        }
        let builder = builder.add_source(
            Environment::with_prefix("USER_SERVICE")
                .separator("__")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1".to_string());
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return invalid("circuit_breaker.failure_threshold must be at least 1".to_string());
        }
        if self.circuit_breaker.half_open_successes == 0 {
            return invalid("circuit_breaker.half_open_successes must be at least 1".to_string());
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return invalid("retry.initial_backoff_ms exceeds retry.max_backoff_ms".to_string());
        }

        let request_timeout = self.request_timeout();
        for (name, upstream) in [("project", &self.upstreams.project), ("task", &self.upstreams.task)] {
            let endpoint = upstream.endpoint(name)?;
            if endpoint.timeout.is_zero() {
                return invalid(format!("upstreams.{name}.timeout_ms must be at least 1"));
            }
            let worst_case = endpoint.timeout * self.retry.max_attempts + self.retry_policy().max_total_backoff();
            if worst_case >= request_timeout {
                return invalid(format!(
                    "upstreams.{name}: worst-case count lookup of {}ms does not fit in server.request_timeout_ms ({}ms)",
                    worst_case.as_millis(),
                    request_timeout.as_millis()
                ));
            }
        }
        self.keycloak()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        let cb = &self.circuit_breaker;
        CircuitBreakerConfig {
            failure_threshold: cb.failure_threshold,
            window: Duration::from_secs(cb.window_secs),
            open_cooldown: Duration::from_secs(cb.open_cooldown_secs),
            half_open_successes: cb.half_open_successes,
        }
    }

    pub fn project_endpoint(&self) -> Result<UpstreamEndpoint, ConfigError> {
        self.upstreams.project.endpoint("project")
    }

    pub fn task_endpoint(&self) -> Result<UpstreamEndpoint, ConfigError> {
        self.upstreams.task.endpoint("task")
    }

    pub fn keycloak(&self) -> Result<KeycloakSettings, ConfigError> {
        let identity = &self.identity;
        let base_url = Url::parse(&identity.base_url)
            .map_err(|e| ConfigError::Invalid(format!("identity.base_url: {e}")))?;
        if identity.realm.trim().is_empty() {
            return Err(ConfigError::Invalid("identity.realm must not be blank".to_string()));
        }
        Ok(KeycloakSettings {
            base_url,
            realm: identity.realm.clone(),
            admin_token: BearerToken::new(identity.admin_token.clone()),
            timeout: Duration::from_millis(identity.timeout_ms),
        })
    }
}

impl UpstreamSettings {
    fn endpoint(&self, name: &str) -> Result<UpstreamEndpoint, ConfigError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("upstreams.{name}.base_url: {e}")))?;
        Ok(UpstreamEndpoint {
            base_url,
            count_path: self.count_path.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        })
    }
}
