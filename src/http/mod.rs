//! HTTP abstraction and transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, failure → status)
//!     → routing::Mapper (route lookup, dispatch)
//!     → request.rs (buffered RequestView handed to the action)
//!     → response.rs (ResponseBuilder finalized into the reply)
//!     → Send to client
//! ```

pub mod method;
pub mod request;
pub mod response;
pub mod server;

pub use method::HttpMethod;
pub use request::{FormPart, PathVariables, RequestError, RequestView, X_REQUEST_ID};
pub use response::{ResponseBuilder, ResponseError, RESPONSE_CODES};
pub use server::HttpServer;
