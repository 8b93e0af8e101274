//! Shared utilities for integration tests.
//!
//! Instances run in-process on ephemeral ports. They share one process,
//! so each gets a probe that reports a fixed baseline plus whatever its
//! own stress pool holds, instead of the real process RSS.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

use todo_failover::config::AppConfig;
use todo_failover::health::MemoryProbe;
use todo_failover::http::{AppState, HttpServer};
use todo_failover::lifecycle::Shutdown;
use todo_failover::observability::metrics;
use todo_failover::store::{KeyValueStore, MemoryStore};
use todo_failover::stress::MemoryPressure;

const MIB: u64 = 1024 * 1024;

/// Resident memory before any stress.
pub const BASELINE_MB: u64 = 2;

/// Memory probe driven by the instance's own stress pool.
pub struct PoolProbe {
    baseline: u64,
    pressure: Arc<MemoryPressure>,
}

impl MemoryProbe for PoolProbe {
    fn resident_bytes(&self) -> u64 {
        self.baseline + self.pressure.allocated_bytes() as u64
    }
}

/// Small sizing: 10 MB limit at 80%, one stress call adds 8 x 1 MiB.
pub fn test_config(id: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.instance.id = id.to_string();
    config.memory.limit_mb = 10;
    config.memory.threshold_percent = 80;
    config.stress.chunk_mb = 1;
    config.stress.chunks = 8;
    config.store.timeout_ms = 500;
    config
}

/// One running API instance.
pub struct TestInstance {
    pub id: String,
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown: Shutdown,
}

impl TestInstance {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stress_chunks(&self) -> usize {
        self.state.pressure.block_count()
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start an instance on an ephemeral port over `kv`.
pub async fn spawn_instance(id: &str, kv: Arc<dyn KeyValueStore>) -> TestInstance {
    let config = test_config(id);
    let pressure = Arc::new(MemoryPressure::new(&config.stress));
    let probe = Arc::new(PoolProbe {
        baseline: BASELINE_MB * MIB,
        pressure: pressure.clone(),
    });
    let state = AppState::with_probe(&config, kv, pressure, probe)
        .with_metrics(metrics::install_recorder().unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(state.clone(), &config.server);
    let handle = shutdown.clone();
    tokio::spawn(async move {
        server.run(listener, handle).await.unwrap();
    });

    TestInstance {
        id: id.to_string(),
        addr,
        state,
        shutdown,
    }
}

/// Start an instance with its own in-memory store.
pub async fn spawn_standalone(id: &str) -> (TestInstance, MemoryStore) {
    let kv = MemoryStore::new();
    let instance = spawn_instance(id, Arc::new(kv.clone())).await;
    (instance, kv)
}

struct BalancerState {
    backends: Vec<SocketAddr>,
    plan: Mutex<VecDeque<usize>>,
    healthy: Mutex<Vec<bool>>,
    routed: Mutex<Vec<usize>>,
    next: AtomicUsize,
    client: reqwest::Client,
}

impl BalancerState {
    /// Next planned backend, else round-robin over healthy ones.
    fn pick(&self) -> Option<usize> {
        if let Some(index) = self.plan.lock().unwrap().pop_front() {
            return Some(index);
        }
        let healthy = self.healthy.lock().unwrap();
        let candidates: Vec<usize> = (0..self.backends.len()).filter(|i| healthy[*i]).collect();
        if candidates.is_empty() {
            return None;
        }
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Some(candidates[n % candidates.len()])
    }
}

/// Health-checking balancer with a scriptable routing order.
///
/// Health is refreshed only when the test asks, so routing decisions
/// are deterministic.
pub struct TestBalancer {
    pub addr: SocketAddr,
    state: Arc<BalancerState>,
}

impl TestBalancer {
    pub async fn start(backends: &[&TestInstance]) -> Self {
        let state = Arc::new(BalancerState {
            backends: backends.iter().map(|b| b.addr).collect(),
            plan: Mutex::new(VecDeque::new()),
            healthy: Mutex::new(vec![true; backends.len()]),
            routed: Mutex::new(Vec::new()),
            next: AtomicUsize::new(0),
            client: reqwest::Client::new(),
        });

        let router = Router::new().fallback(forward).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    /// API root as the demo client sees it.
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Route the next requests to these backend indexes, in order.
    pub fn plan(&self, order: &[usize]) {
        self.state.plan.lock().unwrap().extend(order.iter().copied());
    }

    /// Backend index each forwarded request went to.
    pub fn routed(&self) -> Vec<usize> {
        self.state.routed.lock().unwrap().clone()
    }

    /// Probe every backend's health endpoint; only 200 stays in rotation.
    pub async fn refresh_health(&self) -> Vec<bool> {
        let mut results = Vec::with_capacity(self.state.backends.len());
        for addr in &self.state.backends {
            let ok = match self
                .state
                .client
                .get(format!("http://{}/api/health", addr))
                .send()
                .await
            {
                Ok(response) => response.status() == StatusCode::OK,
                Err(_) => false,
            };
            results.push(ok);
        }
        *self.state.healthy.lock().unwrap() = results.clone();
        results
    }
}

async fn forward(State(lb): State<Arc<BalancerState>>, request: Request) -> Response {
    let Some(index) = lb.pick() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "no healthy backend").into_response();
    };
    lb.routed.lock().unwrap().push(index);

    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let body = axum::body::to_bytes(body, 1024 * 1024).await.unwrap();

    let mut upstream = lb
        .client
        .request(parts.method, format!("http://{}{}", lb.backends[index], path))
        .body(body);
    if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
        upstream = upstream.header(header::CONTENT_TYPE, content_type);
    }

    match upstream.send().await {
        Ok(response) => {
            let status = response.status();
            let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
            let bytes = response.bytes().await.unwrap_or_default();
            let mut out = Response::new(Body::from(bytes));
            *out.status_mut() = status;
            if let Some(value) = content_type {
                out.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            out
        }
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}
