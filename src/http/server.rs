//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, CORS)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
};

use crate::config::{AppConfig, ServerConfig};
use crate::health::{HealthEvaluator, MemoryPolicy, MemoryProbe, ProcessProbe};
use crate::http::request::{self, X_INSTANCE_ID, X_REQUEST_ID};
use crate::http::{ops, todos};
use crate::lifecycle::Shutdown;
use crate::store::{KeyValueStore, TaskStore};
use crate::stress::MemoryPressure;
use crate::tasks::TaskService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub instance: Arc<str>,
    pub tasks: Arc<TaskService>,
    pub pressure: Arc<MemoryPressure>,
    pub health: Arc<HealthEvaluator>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the service context measuring this process's memory.
    pub fn new(config: &AppConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let pressure = Arc::new(MemoryPressure::new(&config.stress));
        Self::with_probe(config, kv, pressure, Arc::new(ProcessProbe::new()))
    }

    /// Build the service context with an explicit memory probe.
    pub fn with_probe(
        config: &AppConfig,
        kv: Arc<dyn KeyValueStore>,
        pressure: Arc<MemoryPressure>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let tasks = Arc::new(TaskService::new(TaskStore::new(kv, config.store.key.clone())));
        let health = Arc::new(HealthEvaluator::new(
            config.instance.id.clone(),
            MemoryPolicy::from(&config.memory),
            probe,
            pressure.clone(),
            tasks.clone(),
            Duration::from_millis(config.store.timeout_ms),
        ));

        Self {
            instance: Arc::from(config.instance.id.as_str()),
            tasks,
            pressure,
            health,
            metrics: None,
        }
    }

    /// Serve `/metrics` from the given recorder handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// HTTP server for one task API instance.
pub struct HttpServer {
    router: Router,
    instance: Arc<str>,
}

impl HttpServer {
    /// Create a new HTTP server over the given state.
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        let instance = state.instance.clone();
        let router = Self::build_router(state, config);
        Self { router, instance }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
        let instance = state.instance.clone();

        let mut router = Router::new()
            .route("/", get(ops::index))
            .route("/api/todos", get(todos::list_tasks).post(todos::create_task))
            .route(
                "/api/todos/{id}",
                put(todos::update_task).delete(todos::delete_task),
            )
            .route("/api/stress", post(ops::stress))
            .route("/api/stress/clear", post(ops::clear_stress))
            .route("/api/health", get(ops::health))
            .route("/metrics", get(ops::render_metrics))
            .layer(middleware::from_fn_with_state(state.clone(), request::track_request))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

        match HeaderValue::from_str(&instance) {
            Ok(value) => {
                router = router.layer(SetResponseHeaderLayer::overriding(X_INSTANCE_ID.clone(), value));
            }
            Err(_) => {
                tracing::warn!(instance = %instance, "Instance id is not a valid header value, skipping x-instance-id");
            }
        }

        let mut router = router
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(request::trace_layer(instance))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid));

        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            instance = %self.instance,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
