//! Network module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. This separation allows the rest of the application to
//! configure shared state between `start()` and `serve()`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use kvs_core::KvStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    get_handler, health_handler, liveness_handler, method_not_allowed_handler, post_handler,
    readiness_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;

/// Manages the full HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- allocates shared state (store, shutdown controller)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    store: Arc<KvStore>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, store: Arc<KvStore>) -> Self {
        Self {
            config,
            listener: None,
            store,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    ///
    /// Other modules use this to check health state or trigger shutdown.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /-/health` -- detailed health JSON
    /// - `GET /-/health/live` -- liveness probe
    /// - `GET /-/health/ready` -- readiness probe
    /// - `GET|POST /{*key}` -- the key/value surface; any other method is 405
    #[must_use]
    pub fn build_router(&self) -> Router {
        let state = AppState {
            store: Arc::clone(&self.store),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };

        build_router_with_state(&self.config, state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Starts serving connections until the shutdown signal fires.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// After the shutdown signal:
    /// 1. Health state transitions to Draining
    /// 2. Waits up to `drain_timeout` for in-flight requests to complete
    /// 3. Health state transitions to Stopped
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .expect("start() must be called before serve()");
        let shutdown_ctrl = self.shutdown;
        let config = self.config;

        let state = AppState {
            store: self.store,
            shutdown: Arc::clone(&shutdown_ctrl),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        };

        let router = build_router_with_state(&config, state);

        shutdown_ctrl.set_ready();

        info!("Serving HTTP connections");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        drain(&shutdown_ctrl, config.drain_timeout).await;
        Ok(())
    }
}

fn build_router_with_state(config: &NetworkConfig, state: AppState) -> Router {
    let layers = build_http_layers(config);

    Router::new()
        .route("/-/health", get(health_handler))
        .route("/-/health/live", get(liveness_handler))
        .route("/-/health/ready", get(readiness_handler))
        .route(
            "/{*key}",
            get(get_handler)
                .post(post_handler)
                .fallback(method_not_allowed_handler),
        )
        .route(
            "/",
            get(get_handler)
                .post(post_handler)
                .fallback(method_not_allowed_handler),
        )
        .layer(layers)
        .with_state(state)
}

/// Waits for in-flight requests to drain, logging whether it finished
/// within `drain_timeout`.
async fn drain(shutdown_ctrl: &ShutdownController, drain_timeout: std::time::Duration) {
    shutdown_ctrl.trigger_shutdown();

    let drained = shutdown_ctrl.wait_for_drain(drain_timeout).await;
    if drained {
        info!("All in-flight requests drained successfully");
    } else {
        warn!("Drain timeout expired with in-flight requests remaining");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_module_without_binding() {
        let module = NetworkModule::new(NetworkConfig::default(), crate::test_support::test_kv_store());
        assert!(module.listener.is_none());
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = NetworkModule::new(NetworkConfig::default(), crate::test_support::test_kv_store());
        let s1 = module.shutdown_controller();
        let s2 = module.shutdown_controller();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[test]
    fn build_router_creates_router() {
        let module = NetworkModule::new(NetworkConfig::default(), crate::test_support::test_kv_store());
        let _router = module.build_router();
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let config = NetworkConfig {
            port: 0,
            ..NetworkConfig::default()
        };
        let mut module = NetworkModule::new(config, crate::test_support::test_kv_store());
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "start() must be called before serve()")]
    async fn serve_panics_without_start() {
        let module = NetworkModule::new(NetworkConfig::default(), crate::test_support::test_kv_store());
        let _ = module.serve(std::future::pending::<()>()).await;
    }

    /// Scenario-level tests driven through the real `Router` and its
    /// middleware stack via `oneshot`, rather than calling handler
    /// functions directly. Covers spec.md §8's six literal scenarios.
    mod http_scenarios {
        use super::*;
        use axum::body::to_bytes;
        use axum::http::{Request, StatusCode};
        use kvs_core::clock::TestClock;
        use kvs_core::{Clock, KvStore, KvStoreConfig};
        use tower::ServiceExt;

        fn config(slab_capacity: usize, ttl_millis: u64) -> KvStoreConfig {
            KvStoreConfig {
                partition_count: 16,
                slab_capacity,
                max_live_slabs: 64,
                ttl_millis,
                nonce: [0u8; 32],
            }
        }

        fn router_with(store: Arc<KvStore>) -> Router {
            NetworkModule::new(NetworkConfig::default(), store).build_router()
        }

        async fn post(router: &Router, path: &str, body: Vec<u8>) -> StatusCode {
            let request = Request::builder()
                .method("POST")
                .uri(path)
                .body(axum::body::Body::from(body))
                .unwrap();
            router.clone().oneshot(request).await.unwrap().status()
        }

        async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
            let request = Request::builder()
                .method("GET")
                .uri(path)
                .body(axum::body::Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body.to_vec())
        }

        #[tokio::test]
        async fn post_then_get_round_trips_within_ttl() {
            let store = Arc::new(KvStore::new(config(1 << 20, 30 * 60 * 1000), Arc::new(kvs_core::SystemClock)).unwrap());
            let router = router_with(store);

            assert_eq!(post(&router, "/foo", b"hello".to_vec()).await, StatusCode::OK);

            let (status, body) = get(&router, "/foo").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(&body[..], b"hello");
        }

        #[tokio::test]
        async fn get_on_unknown_key_is_404_with_empty_body() {
            let store = Arc::new(KvStore::new(config(1 << 20, 30 * 60 * 1000), Arc::new(kvs_core::SystemClock)).unwrap());
            let router = router_with(store);

            let (status, body) = get(&router, "/missing").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body.is_empty());
        }

        #[tokio::test]
        async fn key_is_unreadable_once_its_ttl_elapses() {
            let clock = Arc::new(TestClock::new(1_000_000));
            let store = Arc::new(
                KvStore::new(config(1 << 20, 100), Arc::clone(&clock) as Arc<dyn Clock>).unwrap(),
            );
            let router = router_with(Arc::clone(&store));

            assert_eq!(post(&router, "/k", b"v".to_vec()).await, StatusCode::OK);
            assert_eq!(get(&router, "/k").await.0, StatusCode::OK);

            clock.advance(150);
            let (status, body) = get(&router, "/k").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body.is_empty());

            // A maintenance pass observes the same expiration and retires the
            // underlying record without changing what clients can already see.
            store.clean(&|| false);
            assert_eq!(get(&router, "/k").await.0, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn arena_rotation_preserves_both_keys() {
            let store = Arc::new(KvStore::new(config(64, 30 * 60 * 1000), Arc::new(kvs_core::SystemClock)).unwrap());
            let router = router_with(store);

            let value_a = vec![b'a'; 40];
            let value_b = vec![b'b'; 40];

            assert_eq!(post(&router, "/a", value_a.clone()).await, StatusCode::OK);
            assert_eq!(post(&router, "/b", value_b.clone()).await, StatusCode::OK);

            let (status_a, body_a) = get(&router, "/a").await;
            let (status_b, body_b) = get(&router, "/b").await;
            assert_eq!(status_a, StatusCode::OK);
            assert_eq!(status_b, StatusCode::OK);
            assert_eq!(body_a, value_a);
            assert_eq!(body_b, value_b);
        }

        #[tokio::test]
        async fn value_larger_than_slab_capacity_is_507() {
            let store = Arc::new(KvStore::new(config(64, 30 * 60 * 1000), Arc::new(kvs_core::SystemClock)).unwrap());
            let router = router_with(store);

            let status = post(&router, "/big", vec![0u8; 128]).await;
            assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
        }

        #[tokio::test]
        async fn unsupported_method_is_405() {
            let store = Arc::new(KvStore::new(config(1 << 20, 30 * 60 * 1000), Arc::new(kvs_core::SystemClock)).unwrap());
            let router = router_with(store);

            let request = Request::builder()
                .method("PUT")
                .uri("/x")
                .body(axum::body::Body::empty())
                .unwrap();
            let response = router.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }
}
