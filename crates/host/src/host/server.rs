// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::body::Body;
use tonic::server::NamedService;
use tonic::transport::Server;
use tower::Service;
use tracing::{debug, error, info, warn};

use super::dispatch::{DispatchLayer, PoolStats, WorkerPool};
use super::error::{ConfigurationError, HostError};
use super::registry::{HandlerRegistration, Registry};
use super::signal::shutdown_signal;
use super::state::{HostState, Lifecycle};
use crate::config::HostConfig;

/// Upper bound for each cleanup step after grace period expired:
/// first waiting for cancelled handlers, then for the serving task
pub const CLEANUP_BOUND: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Nothing to drain for this call: host never started, or already stopping
    Idle,
    /// All calls finished within grace period
    Graceful,
    /// Grace period expired, remaining calls were cancelled
    Forced { cancelled: usize },
}

#[derive(Debug)]
struct Running {
    local_addr: SocketAddr,
    draining: CancellationToken,
    pool: WorkerPool,
    serve: JoinHandle<()>,
}

#[derive(Debug)]
struct ServiceHostImpl {
    config: HostConfig,
    /// Writes happen only before start, so a std mutex with short critical
    /// sections is enough; serving path never touches it.
    registry: Mutex<Registry>,
    running: Mutex<Option<Running>>,
    local_addr: Mutex<Option<SocketAddr>>,
    lifecycle: Arc<Lifecycle>,
}

/// gRPC server shell: owns listener, worker pool and registered handlers.
/// Cloning gives another handle to the same host.
#[derive(Debug, Clone)]
pub struct ServiceHost {
    inner: Arc<ServiceHostImpl>,
}

impl ServiceHost {
    #[must_use]
    pub fn new(config: HostConfig) -> Self {
        Self {
            inner: Arc::new(ServiceHostImpl {
                config,
                registry: Mutex::new(Registry::new()),
                running: Mutex::new(None),
                local_addr: Mutex::new(None),
                lifecycle: Arc::new(Lifecycle::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn state(&self) -> HostState {
        self.inner.lifecycle.current()
    }

    /// Registered services, in order of registration
    #[must_use]
    pub fn services(&self) -> Vec<HandlerRegistration> {
        self.inner.registry.lock().unwrap().contents()
    }

    /// Address actually bound, once started
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.inner.local_addr.lock().unwrap()
    }

    /// Worker pool snapshot, while host is running
    #[must_use]
    pub fn stats(&self) -> Option<PoolStats> {
        self.inner
            .running
            .lock()
            .unwrap()
            .as_ref()
            .map(|running| running.pool.stats())
    }

    /// Register handler under its gRPC service name
    /// # Errors
    /// Fails if host already started, or name is empty or taken
    pub fn register<S>(&self, service: S) -> Result<(), HostError>
    where
        S: Service<http::Request<Body>, Response = http::Response<Body>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let mut registry = self.inner.registry.lock().unwrap();
        let state = self.inner.lifecycle.current();
        if !state.accepts_registration() {
            return Err(ConfigurationError::RegistrationClosed(state).into());
        }
        registry.register(service)?;
        self.inner.lifecycle.advance(HostState::Configured);
        Ok(())
    }

    /// Bind listener and start serving in background.
    /// Returns bound address as soon as listener accepts connections.
    /// # Errors
    /// Fails on second start, on empty worker pool, or if address can't be bound.
    /// On failure host holds no socket and stays unstarted.
    pub async fn start(&self) -> Result<SocketAddr, HostError> {
        let state = self.inner.lifecycle.current();
        if !state.accepts_registration() {
            return Err(ConfigurationError::AlreadyStarted(state).into());
        }
        let workers = self.inner.config.workers;
        if workers == 0 {
            return Err(ConfigurationError::NoWorkers.into());
        }

        let addr = self.inner.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HostError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| HostError::Bind { addr, source })?;

        // From here everything is synchronous and done under registry lock,
        // so concurrent `register` either lands before sealing or fails
        let mut registry = self.inner.registry.lock().unwrap();
        let state = self.inner.lifecycle.current();
        if !state.accepts_registration() {
            // Lost the race against another `start`, listener is dropped here
            return Err(ConfigurationError::AlreadyStarted(state).into());
        }
        let routes = registry.seal();
        let names: Vec<String> = registry.contents().into_iter().map(|e| e.name).collect();

        let pool = WorkerPool::new(workers);
        let draining = CancellationToken::new();
        let router = Server::builder()
            .layer(DispatchLayer::new(pool.clone()))
            .add_routes(routes);
        let serving = router.serve_with_incoming_shutdown(
            TcpListenerStream::new(listener),
            draining.clone().cancelled_owned(),
        );

        // Running before spawn: a serving loop failing right away must end in Stopped
        let mut running = self.inner.running.lock().unwrap();
        self.inner.lifecycle.advance(HostState::Running);
        let lifecycle = Arc::clone(&self.inner.lifecycle);
        let serve = tokio::spawn(async move {
            if let Err(err) = serving.await {
                error!("Serving loop failed: {err}");
                lifecycle.fail(err);
            }
            // While draining, `shutdown` moves host to Stopped once handlers are gone
            if !lifecycle.transition(HostState::Running, HostState::Stopped) {
                debug!("Serving loop finished, host is draining");
            }
        });
        *running = Some(Running {
            local_addr,
            draining,
            pool,
            serve,
        });
        *self.inner.local_addr.lock().unwrap() = Some(local_addr);
        drop(running);
        drop(registry);

        info!(
            "{} running on {local_addr} with {workers} workers",
            names.join(", ")
        );
        Ok(local_addr)
    }

    /// Wait until host is stopped. Returns immediately if it already is.
    /// # Errors
    /// Returns `HostError::Serve` if serving loop terminated with error
    pub async fn await_termination(&self) -> Result<(), HostError> {
        self.inner.lifecycle.stopped().await;
        match self.inner.lifecycle.failure() {
            Some(err) => Err(HostError::Serve(err)),
            None => Ok(()),
        }
    }

    /// Stop accepting connections and drain in-flight calls.
    /// Calls still running after `grace` are cancelled; whole operation
    /// takes at most `grace + 2 * CLEANUP_BOUND`.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownOutcome {
        let running = {
            let mut slot = self.inner.running.lock().unwrap();
            let running = slot.take();
            // Still under lock, so a concurrent caller finds either us or Draining.
            // Serving loop may have died on its own already, then this is a no-op.
            if running.is_some() {
                self.inner
                    .lifecycle
                    .transition(HostState::Running, HostState::Draining);
            }
            running
        };
        let Some(mut running) = running else {
            if self.state() == HostState::Draining {
                debug!("Shutdown already in progress, waiting for it");
                self.inner.lifecycle.stopped().await;
            }
            return ShutdownOutcome::Idle;
        };

        info!(
            "Draining {}, grace period {grace:?}, {:?}",
            running.local_addr,
            running.pool.stats()
        );
        running.draining.cancel();

        let outcome = if timeout(grace, &mut running.serve).await.is_ok() {
            // Connections are gone; only handlers of abandoned calls may linger
            let _ = timeout(CLEANUP_BOUND, running.pool.wait_idle()).await;
            ShutdownOutcome::Graceful
        } else {
            let cancelled = running.pool.cancel_all(CLEANUP_BOUND).await;
            warn!("Grace period {grace:?} exceeded, cancelled {cancelled} calls");
            if timeout(CLEANUP_BOUND, &mut running.serve).await.is_err() {
                warn!("Serving task still alive after cancellation, aborting it");
                running.serve.abort();
                let _ = running.serve.await;
            }
            ShutdownOutcome::Forced { cancelled }
        };

        self.inner.lifecycle.advance(HostState::Stopped);
        info!("Host on {} stopped: {outcome:?}", running.local_addr);
        outcome
    }

    /// Shutdown host with configured grace period once `trigger` resolves.
    /// Task finishes by itself if host is stopped by other means.
    pub fn shutdown_on<F>(&self, trigger: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let host = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = trigger => {
                    let _ = host.shutdown(host.config().grace_period).await;
                }
                _ = host.await_termination() => {}
            }
        })
    }

    /// Shutdown host with configured grace period on SIGINT or SIGTERM
    pub fn shutdown_on_signal(&self) -> JoinHandle<()> {
        self.shutdown_on(async {
            if let Err(err) = shutdown_signal().await {
                error!("Can't listen for termination signals: {err}");
                // Host then stops only by explicit shutdown
                std::future::pending::<()>().await;
            }
        })
    }
}
