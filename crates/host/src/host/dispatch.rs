// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded worker pool sitting between tonic's connection handling and
//! the registered handlers.
//!
//! Every inbound call first waits for a worker permit. Tokio semaphores are
//! fair, so saturated calls are admitted in arrival order and nothing is
//! rejected. Admitted call runs as its own task, which gives true parallelism
//! on multi-threaded runtime and contains handler panics to that call.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::AbortHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tonic::body::Body;
use tonic::codegen::BoxFuture;
use tonic::{Code, Status};
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, trace, warn};

use super::error::CallError;

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub in_flight: usize,
    pub queued: usize,
}

#[derive(Debug)]
struct PoolInner {
    workers: usize,
    slots: Arc<Semaphore>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    in_flight: AtomicUsize,
    queued: AtomicUsize,
}

#[derive(Debug, Clone)]
pub(crate) struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                workers,
                slots: Arc::new(Semaphore::new(workers)),
                cancel: CancellationToken::new(),
                tracker: TaskTracker::new(),
                in_flight: AtomicUsize::new(0),
                queued: AtomicUsize::new(0),
            }),
        }
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.inner.workers,
            in_flight: self.inner.in_flight.load(Ordering::Acquire),
            queued: self.inner.queued.load(Ordering::Acquire),
        }
    }

    /// Cancel every queued and running call, and stop admitting new ones.
    /// Waits up to `bound` for handler tasks to unwind.
    /// Returns number of calls which were cancelled.
    pub(crate) async fn cancel_all(&self, bound: Duration) -> usize {
        let stats = self.stats();
        self.inner.cancel.cancel();
        self.inner.slots.close();
        self.inner.tracker.close();
        if timeout(bound, self.inner.tracker.wait()).await.is_err() {
            warn!(
                "{} handlers still running {bound:?} after cancellation",
                self.inner.tracker.len()
            );
        }
        stats.in_flight + stats.queued
    }

    /// Wait until all handler tasks spawned so far are finished
    pub(crate) async fn wait_idle(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    async fn dispatch<S, B>(
        &self,
        inner: S,
        req: http::Request<B>,
    ) -> Result<http::Response<Body>, S::Error>
    where
        S: Service<http::Request<B>, Response = http::Response<Body>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Send + 'static,
        B: Send + 'static,
    {
        let path = req.uri().path().to_owned();

        let waiting = QueuedCall::enter(&self.inner);
        let permit = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => None,
            permit = Arc::clone(&self.inner.slots).acquire_owned() => permit.ok(),
        };
        drop(waiting);

        // Nothing new is started once cancellation began, even if permit was granted
        let permit = match permit {
            Some(permit) if !self.inner.cancel.is_cancelled() => permit,
            _ => {
                debug!("Rejecting {path}, host is cancelling calls");
                return Ok(reply(CallError::Cancelled));
            }
        };

        let call = InFlightCall::start(path.clone(), permit, Arc::clone(&self.inner));
        let mut handle = self.inner.tracker.spawn(async move {
            let _call = call;
            inner.oneshot(req).await
        });
        // Caller may go away (client cancelled), then handler goes too
        let _guard = AbortOnDrop(handle.abort_handle());

        tokio::select! {
            joined = &mut handle => match joined {
                Ok(Ok(response)) => {
                    log_failed_call(&path, &response);
                    Ok(response)
                }
                Ok(Err(err)) => Err(err),
                Err(err) if err.is_panic() => {
                    warn!("Handler for {path} panicked, replying with error");
                    Ok(reply(CallError::Panicked))
                }
                Err(_) => Ok(reply(CallError::Cancelled)),
            },
            () = self.inner.cancel.cancelled() => {
                handle.abort();
                debug!("Cancelled running call {path}");
                Ok(reply(CallError::Cancelled))
            }
        }
    }
}

fn reply(err: CallError) -> http::Response<Body> {
    Status::from(err).into_http()
}

fn log_failed_call(path: &str, response: &http::Response<Body>) {
    // Unary errors travel as trailers-only response, so status is in headers
    if let Some(status) = Status::from_header_map(response.headers()) {
        if status.code() != Code::Ok {
            debug!(
                "Call {path} failed with {:?}: {}",
                status.code(),
                status.message()
            );
        }
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct QueuedCall<'a>(&'a PoolInner);

impl<'a> QueuedCall<'a> {
    fn enter(pool: &'a PoolInner) -> Self {
        pool.queued.fetch_add(1, Ordering::AcqRel);
        Self(pool)
    }
}

impl Drop for QueuedCall<'_> {
    fn drop(&mut self) {
        self.0.queued.fetch_sub(1, Ordering::AcqRel);
    }
}

/// One call occupying one worker. Owned by the task running the handler;
/// dropping it frees the worker for the next queued call.
struct InFlightCall {
    path: String,
    started: Instant,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl InFlightCall {
    fn start(path: String, permit: OwnedSemaphorePermit, pool: Arc<PoolInner>) -> Self {
        pool.in_flight.fetch_add(1, Ordering::AcqRel);
        trace!("Dispatching {path}");
        Self {
            path,
            started: Instant::now(),
            pool,
            _permit: permit,
        }
    }
}

impl Drop for InFlightCall {
    fn drop(&mut self) {
        self.pool.in_flight.fetch_sub(1, Ordering::AcqRel);
        trace!("Call {} done in {:?}", self.path, self.started.elapsed());
    }
}

/// Tower layer installing the worker pool in front of tonic routes
#[derive(Debug, Clone)]
pub(crate) struct DispatchLayer {
    pool: WorkerPool,
}

impl DispatchLayer {
    pub(crate) fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }
}

impl<S> Layer<S> for DispatchLayer {
    type Service = DispatchService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DispatchService {
            inner,
            pool: self.pool.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DispatchService<S> {
    inner: S,
    pool: WorkerPool,
}

impl<S, B> Service<http::Request<B>> for DispatchService<S>
where
    S: Service<http::Request<B>, Response = http::Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of inner service is awaited by the worker, right before the call
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let pool = self.pool.clone();
        Box::pin(async move { pool.dispatch(inner, req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::service_fn;

    fn request() -> http::Request<Body> {
        http::Request::builder()
            .uri("/siriuslingo.probe.ProbeService/Hold")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_panic_becomes_internal() {
        let pool = WorkerPool::new(1);
        let svc = service_fn(|_req: http::Request<Body>| async move {
            if true {
                panic!("boom");
            }
            Ok::<_, Infallible>(http::Response::new(Body::empty()))
        });
        let response = pool.dispatch(svc, request()).await.unwrap();
        let status = Status::from_header_map(response.headers()).unwrap();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(pool.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_cancelled_pool_rejects() {
        let pool = WorkerPool::new(2);
        assert_eq!(pool.cancel_all(Duration::from_millis(10)).await, 0);

        let svc = service_fn(|_req: http::Request<Body>| async move {
            Ok::<_, Infallible>(http::Response::new(Body::empty()))
        });
        let response = pool.dispatch(svc, request()).await.unwrap();
        let status = Status::from_header_map(response.headers()).unwrap();
        assert_eq!(status.code(), Code::Cancelled);
    }

    #[tokio::test]
    async fn test_stats_track_queue() {
        let pool = WorkerPool::new(1);
        let gate = Arc::new(tokio::sync::Notify::new());
        let svc = {
            let gate = gate.clone();
            service_fn(move |_req: http::Request<Body>| {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok::<_, Infallible>(http::Response::new(Body::empty()))
                }
            })
        };

        let first = tokio::spawn({
            let (pool, svc) = (pool.clone(), svc.clone());
            async move { pool.dispatch(svc, request()).await }
        });
        let second = tokio::spawn({
            let (pool, svc) = (pool.clone(), svc.clone());
            async move { pool.dispatch(svc, request()).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            pool.stats(),
            PoolStats {
                workers: 1,
                in_flight: 1,
                queued: 1
            }
        );

        gate.notify_one();
        let _ = first.await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.notify_one();
        let _ = second.await.unwrap();
        pool.wait_idle().await;
        assert_eq!(pool.stats().in_flight, 0);
        assert_eq!(pool.stats().queued, 0);
    }
}
