//! Route table.
//!
//! # Responsibilities
//! - Bind (method, path pattern) pairs to processor actions
//! - Refuse bindings to actions the processor does not expose
//! - Mount static directories
//! - Resolve each request to an action, a static file or the not-found path
//!
//! # Design Decisions
//! - One `route_recognizer::Router` per supported method, created up front
//! - Bindings are validated before anything is registered; a failed bind
//!   leaves the table untouched
//! - Immutable once serving starts; share it behind `Arc`
//! - A path that only matches under another method counts as unmatched

use axum::body::Body;
use axum::http::{Method, Request, Response};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::path::Path;

use crate::http::{HttpMethod, PathVariables};
use crate::routing::dispatcher::Dispatcher;
use crate::routing::error::{DispatchError, MappingError};
use crate::routing::processor::Processor;
use crate::routing::statics::StaticMount;

/// A bound route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: HttpMethod,
    pattern: String,
    action: String,
}

impl Route {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

/// Maps requests onto a processor's actions.
pub struct Mapper<P> {
    dispatcher: Dispatcher<P>,
    recognizers: HashMap<HttpMethod, route_recognizer::Router<String>>,
    routes: Vec<Route>,
    mounts: Vec<StaticMount>,
}

impl<P> std::fmt::Debug for Mapper<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("routes", &self.routes)
            .field("mounts", &self.mounts)
            .finish_non_exhaustive()
    }
}

macro_rules! method_binders {
    ($( $name:ident => $method:ident ),* $(,)?) => {
        impl<P: Processor> Mapper<P> {
            $(
                #[doc = concat!("Bind `", stringify!($method), "` requests on `path` to `action`.")]
                pub fn $name(&mut self, path: &str, action: &str) -> Result<&mut Self, MappingError> {
                    self.bind(HttpMethod::$method, path, action)
                }
            )*
        }
    };
}

method_binders! {
    get => Get,
    post => Post,
    put => Put,
    delete => Delete,
    patch => Patch,
    options => Options,
    head => Head,
    link => Link,
    unlink => Unlink,
}

impl<P: Processor> Mapper<P> {
    pub fn new(processor: P) -> Self {
        Self::with_dispatcher(Dispatcher::new(processor))
    }

    /// Build around a pre-configured dispatcher.
    pub fn with_dispatcher(dispatcher: Dispatcher<P>) -> Self {
        let recognizers = HttpMethod::ALL
            .into_iter()
            .map(|method| (method, route_recognizer::Router::new()))
            .collect();

        Self {
            dispatcher,
            recognizers,
            routes: Vec::new(),
            mounts: Vec::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    /// Bound routes in binding order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn mounts(&self) -> &[StaticMount] {
        &self.mounts
    }

    /// Bind `method` requests matching `path` to `action`.
    ///
    /// `path` may contain `:name` variable segments and a trailing `*name`
    /// glob. Fails without registering anything if the processor has no
    /// such action, the pattern is not absolute, or the pair is taken.
    pub fn bind(
        &mut self,
        method: HttpMethod,
        path: &str,
        action: &str,
    ) -> Result<&mut Self, MappingError> {
        if !self.dispatcher.implemented(action) {
            return Err(MappingError::UndefinedAction(action.to_string()));
        }
        if !path.starts_with('/') {
            return Err(MappingError::InvalidPattern(path.to_string()));
        }
        let shape = pattern_shape(path);
        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.method == method && pattern_shape(&r.pattern) == shape)
        {
            return Err(MappingError::DuplicateRoute {
                method,
                pattern: path.to_string(),
                action: existing.action.clone(),
            });
        }

        self.recognizers
            .entry(method)
            .or_insert_with(route_recognizer::Router::new)
            .add(path, action.to_string());
        self.routes.push(Route {
            method,
            pattern: path.to_string(),
            action: action.to_string(),
        });

        tracing::debug!(method = %method, path = path, action = action, "Route bound");
        Ok(self)
    }

    /// Serve files from `directory` under the URL prefix `path`.
    pub fn serve_static(
        &mut self,
        path: &str,
        directory: impl AsRef<Path>,
    ) -> Result<&mut Self, MappingError> {
        let directory = directory.as_ref();
        if !path.starts_with('/') {
            return Err(MappingError::InvalidPattern(path.to_string()));
        }
        if !directory.is_dir() {
            return Err(MappingError::MissingDirectory(directory.to_path_buf()));
        }

        self.mounts.push(StaticMount::new(path, directory));

        tracing::debug!(prefix = path, directory = %directory.display(), "Static directory mounted");
        Ok(self)
    }

    /// Resolve `request` and produce its response.
    ///
    /// Bound routes are tried first, then static mounts, then the
    /// dispatcher's not-found path.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response<Body>, DispatchError> {
        if let Some((action, path_variables, head_via_get)) =
            self.recognize(request.method(), request.uri().path())
        {
            let response = self
                .dispatcher
                .dispatch(action, request, path_variables)
                .await?;
            if head_via_get {
                let (parts, _) = response.into_parts();
                return Ok(Response::from_parts(parts, Body::empty()));
            }
            return Ok(response);
        }

        let (parts, body) = request.into_parts();
        for mount in &self.mounts {
            if let Some(response) = mount.serve(&parts).await {
                return Ok(response);
            }
        }

        tracing::debug!(method = %parts.method, path = parts.uri.path(), "No route matched");
        self.dispatcher
            .not_found(Request::from_parts(parts, body))
            .await
    }

    /// Action and decoded path variables for the best route matching `path`.
    ///
    /// `HEAD` requests with no `HEAD` binding fall back to `GET` routes; the
    /// flag in the result marks that fallback so the body can be dropped.
    fn recognize(&self, method: &Method, path: &str) -> Option<(&str, PathVariables, bool)> {
        let method = HttpMethod::from_method(method)?;
        let (matched, head_via_get) = match self.recognizers.get(&method)?.recognize(path) {
            Ok(matched) => (matched, false),
            Err(_) if method == HttpMethod::Head => {
                (self.recognizers.get(&HttpMethod::Get)?.recognize(path).ok()?, true)
            }
            Err(_) => return None,
        };

        let action: &String = *matched.handler();
        let path_variables = matched
            .params()
            .iter()
            .map(|(name, value)| {
                let value = percent_decode_str(value).decode_utf8_lossy();
                (name.to_string(), value.into_owned())
            })
            .collect();

        Some((action.as_str(), path_variables, head_via_get))
    }

    /// Wrap the mapper as an axum router that answers every request.
    pub fn into_router(self) -> axum::Router {
        crate::http::server::mapper_router(std::sync::Arc::new(self))
    }
}

/// `pattern` with variable and glob names erased, so `/items/:id` and
/// `/items/:name` compare equal.
fn pattern_shape(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.chars().next() {
            Some(':') => ":",
            Some('*') => "*",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}
