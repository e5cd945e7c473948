// Driven adapter - active work item counts from the project and task services

pub mod circuit_breaker;
pub mod http_gateway;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use http_gateway::{HttpRemoteCountGateway, UpstreamEndpoint};
pub use retry::RetryPolicy;
