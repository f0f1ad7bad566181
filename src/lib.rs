//! HTTP action routing and dispatch.
//!
//! Binds (method, path pattern) pairs to named actions on a caller-supplied
//! [`Processor`], checks at bind time that every named action exists, and
//! hands actions a uniform [`RequestView`] / [`ResponseBuilder`] pair.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use http::{HttpMethod, HttpServer, RequestView, ResponseBuilder};
pub use lifecycle::Shutdown;
pub use routing::{ActionResult, ActionTable, Dispatcher, Mapper, MappingError, Processor};
