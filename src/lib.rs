//! Order service guarded by a circuit breaker around the parts service.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orders;
pub mod parts;
pub mod resilience;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
