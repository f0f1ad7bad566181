//! Action dispatch.
//!
//! # Responsibilities
//! - Turn (action name, raw request) into a finalized response
//! - Decide what unmatched requests get: the processor's `not_found`
//!   action if it has one, an empty 404 otherwise
//!
//! # Design Decisions
//! - Action existence is checked at bind time; dispatch only looks the
//!   action up and reports a missing one instead of panicking
//! - Action errors are returned untouched; turning them into responses is
//!   the transport's job

use axum::body::Body;
use axum::http::{Request, Response};
use std::time::Instant;

use crate::http::{PathVariables, RequestView, ResponseBuilder};
use crate::observability::metrics;
use crate::routing::error::DispatchError;
use crate::routing::processor::{ActionTable, Processor, NOT_FOUND_ACTION};

/// Default cap on buffered request bodies (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Invokes named actions on a processor.
#[derive(Debug)]
pub struct Dispatcher<P> {
    processor: P,
    actions: ActionTable<P>,
    body_limit: usize,
}

impl<P: Processor> Dispatcher<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            actions: ActionTable::for_processor(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap the number of body bytes buffered per request.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Whether the processor exposes `action`.
    pub fn implemented(&self, action: &str) -> bool {
        self.actions.contains(action)
    }

    /// Run `action` against `request` and finalize its response.
    pub async fn dispatch(
        &self,
        action: &str,
        request: Request<Body>,
        path_variables: PathVariables,
    ) -> Result<Response<Body>, DispatchError> {
        let start = Instant::now();
        let handler = self
            .actions
            .get(action)
            .ok_or_else(|| DispatchError::UnknownAction(action.to_string()))?;

        let view = RequestView::from_request(request, path_variables, self.body_limit)
            .await
            .map_err(DispatchError::Body)?;

        let builder = handler(&self.processor, &view).map_err(|source| DispatchError::Action {
            action: action.to_string(),
            source,
        })?;
        let response = builder.finalize();

        tracing::debug!(
            action = action,
            method = %view.method(),
            path = view.path(),
            status = response.status().as_u16(),
            "Dispatched action"
        );
        metrics::record_dispatch(action, response.status().as_u16(), start);

        Ok(response)
    }

    /// Answer a request that matched no route.
    pub async fn not_found(&self, request: Request<Body>) -> Result<Response<Body>, DispatchError> {
        metrics::record_not_found();

        if self.implemented(NOT_FOUND_ACTION) {
            self.dispatch(NOT_FOUND_ACTION, request, PathVariables::new())
                .await
        } else {
            Ok(ResponseBuilder::not_found_status().finalize())
        }
    }
}
