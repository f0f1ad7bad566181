//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Binding (at startup):
//!     Processor::actions → ActionTable
//!     Mapper::bind(method, pattern, action)
//!     → reject undefined actions, relative patterns, duplicates
//!     → add to the method's recognizer
//!
//! Incoming Request (method, path)
//!     → mapper.rs (best matching route, else static mounts)
//!     → dispatcher.rs (RequestView → action → ResponseBuilder::finalize)
//!     → no match: dispatcher.rs not_found (processor's or canned 404)
//! ```
//!
//! # Design Decisions
//! - Routes validated and compiled at startup, immutable at runtime
//! - Most specific pattern wins: static segments over variables over globs
//! - Unmatched requests always get a response, never an error

pub mod dispatcher;
pub mod error;
pub mod mapper;
pub mod processor;
pub mod statics;

pub use dispatcher::{Dispatcher, DEFAULT_BODY_LIMIT};
pub use error::{DispatchError, MappingError};
pub use mapper::{Mapper, Route};
pub use processor::{ActionFn, ActionResult, ActionTable, Processor, NOT_FOUND_ACTION};
pub use statics::StaticMount;
