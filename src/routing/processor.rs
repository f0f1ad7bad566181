//! Processor contract and its action table.
//!
//! A processor is any type that can list its actions by name. The table is
//! filled once, by the processor author, when the dispatcher is built; the
//! name lookups done by binding and by the not-found fallback go through it.

use axum::BoxError;
use std::collections::HashMap;
use std::fmt;

use crate::http::{RequestView, ResponseBuilder};

/// Outcome of an action.
pub type ActionResult = Result<ResponseBuilder, BoxError>;

/// A type-erased action bound to processor type `P`.
pub type ActionFn<P> = Box<dyn Fn(&P, &RequestView) -> ActionResult + Send + Sync>;

/// Name of the optional action used for unmatched requests.
pub const NOT_FOUND_ACTION: &str = "not_found";

/// A caller-supplied object exposing named actions.
///
/// ```ignore
/// struct Greeter;
///
/// impl Greeter {
///     fn hello(&self, req: &RequestView) -> ActionResult {
///         ResponseBuilder::ok_with(|res| {
///             res.set_body(format!("hello {}", req.path_variable("name").unwrap_or("world")));
///             Ok(())
///         })
///     }
/// }
///
/// impl Processor for Greeter {
///     fn actions(table: &mut ActionTable<Self>) {
///         table.register("hello", Self::hello);
///     }
/// }
/// ```
pub trait Processor: Send + Sync + 'static {
    /// Register every action this processor exposes.
    fn actions(table: &mut ActionTable<Self>)
    where
        Self: Sized;
}

/// Action names mapped to callable operations.
pub struct ActionTable<P> {
    actions: HashMap<String, ActionFn<P>>,
}

impl<P> ActionTable<P> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Register `action` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: Fn(&P, &RequestView) -> ActionResult + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Box::new(action));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ActionFn<P>> {
        self.actions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<P: Processor> ActionTable<P> {
    /// The table declared by `P`.
    pub fn for_processor() -> Self {
        let mut table = Self::new();
        P::actions(&mut table);
        table
    }
}

impl<P> Default for ActionTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for ActionTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.names())
            .finish()
    }
}
