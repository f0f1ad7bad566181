//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap a [`Mapper`] as an Axum `Router` fallback
//! - Turn dispatch failures into 5xx/4xx responses and log them
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and run until shutdown

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::observability::metrics;
use crate::routing::{Dispatcher, Mapper, MappingError, Processor};

/// HTTP server exposing a route table.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server for `mapper`, applying the configured limits and mounts.
    ///
    /// Static mounts listed in the configuration are added to the mapper here.
    pub fn new<P: Processor>(config: ServerConfig, mut mapper: Mapper<P>) -> Result<Self, MappingError> {
        for mount in &config.static_mounts {
            mapper.serve_static(&mount.prefix, &mount.directory)?;
        }

        tracing::info!(
            routes = mapper.routes().len(),
            mounts = mapper.mounts().len(),
            "Route table ready"
        );

        let router = Self::build_router(&config, mapper_router(Arc::new(mapper)));
        Ok(Self { router, config })
    }

    /// Build a mapper for `processor` honouring the configured body limit.
    pub fn mapper_for<P: Processor>(config: &ServerConfig, processor: P) -> Mapper<P> {
        Mapper::with_dispatcher(
            Dispatcher::new(processor).with_body_limit(config.limits.max_body_bytes),
        )
    }

    /// Layer the middleware stack over `app`.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, app: Router) -> Router {
        app.layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Router sending every request through `mapper`.
pub fn mapper_router<P: Processor>(mapper: Arc<Mapper<P>>) -> Router {
    Router::new()
        .fallback(handle_request::<P>)
        .with_state(mapper)
}

async fn handle_request<P: Processor>(
    State(mapper): State<Arc<Mapper<P>>>,
    request: Request<Body>,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match mapper.handle(request).await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status_code();
            tracing::error!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                error = %e,
                "Dispatch failed"
            );
            metrics::record_failure(status.as_u16());
            status.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{RequestView, ResponseBuilder};
    use crate::routing::{ActionResult, ActionTable};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    struct Api;

    impl Api {
        fn ping(&self, req: &RequestView) -> ActionResult {
            ResponseBuilder::ok_with(|res| {
                res.set_body(req.request_id().unwrap_or("none"));
                Ok(())
            })
        }

        fn crash(&self, _req: &RequestView) -> ActionResult {
            Err("kaboom".into())
        }
    }

    impl Processor for Api {
        fn actions(table: &mut ActionTable<Self>) {
            table.register("ping", Self::ping).register("crash", Self::crash);
        }
    }

    fn server() -> HttpServer {
        let config = ServerConfig::default();
        let mut mapper = HttpServer::mapper_for(&config, Api);
        mapper
            .get("/ping", "ping")
            .and_then(|m| m.get("/crash", "crash"))
            .unwrap();
        HttpServer::new(config, mapper).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_request_id_assigned() {
        let response = server().router().oneshot(get("/ping")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers()["x-request-id"].to_str().unwrap().to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), header.as_bytes());
    }

    #[tokio::test]
    async fn test_action_failure_becomes_500() {
        let response = server().router().oneshot(get("/crash")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let response = server().router().oneshot(get("/nowhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
