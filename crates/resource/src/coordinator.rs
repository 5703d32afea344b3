//! Latest-issued-wins request coordination.
//!
//! Every call records a fresh [`IssuanceStamp`] for the request's identifier
//! *before* the transport is touched. When the round trip finishes, the stamp
//! is compared with the registry's current value; a mismatch means a newer
//! request for the same identifier exists and the response is discarded as
//! [`Outcome::Superseded`]. Transport failures skip that comparison and are
//! always reported.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::breadcrumbs::{Breadcrumb, Breadcrumbs};
use crate::config::ResourceConfig;
use crate::metrics::{MetricsSnapshot, RequestMetrics};
use crate::outcome::{Outcome, RequestError};
use crate::protocol::ResponseEnvelope;
use crate::registry::{IssuanceRegistry, IssuanceStamp};
use crate::request::{Method, RequestDescriptor};
use crate::reqwest_transport::ReqwestTransport;
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// Issues requests through a [`Transport`] and delivers one [`Outcome`] each.
///
/// Cloning is cheap and clones share the same registry, so a clone handed to
/// another task still supersedes (and is superseded by) the original.
#[derive(Clone, Debug)]
pub struct RequestCoordinator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ResourceConfig,
    transport: Arc<dyn Transport>,
    registry: Mutex<IssuanceRegistry>,
    breadcrumbs: Mutex<Breadcrumbs>,
    metrics: Mutex<RequestMetrics>,
}

impl RequestCoordinator {
    pub fn new(config: ResourceConfig, transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    pub fn with_shared_transport(config: ResourceConfig, transport: Arc<dyn Transport>) -> Self {
        let breadcrumbs = Breadcrumbs::with_capacity(config.breadcrumb_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                registry: Mutex::new(IssuanceRegistry::new()),
                breadcrumbs: Mutex::new(breadcrumbs),
                metrics: Mutex::new(RequestMetrics::new()),
            }),
        }
    }

    /// Coordinator over a fresh [`ReqwestTransport`], configured from the
    /// environment.
    pub fn from_env() -> Result<Self, TransportError> {
        Ok(Self::new(ResourceConfig::from_env(), ReqwestTransport::new()?))
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.inner.config
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        self.inner.config.url_for(endpoint)
    }

    /// Issue a request and return a future for its outcome.
    ///
    /// The stamp is recorded and the transport invoked before this returns,
    /// not when the future is first polled. A request issued later therefore
    /// supersedes this one even if this future has not been polled yet.
    ///
    /// The round trip runs on its own tokio task, so it completes and is
    /// judged even if the returned [`PendingRequest`] is dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn fetch(&self, descriptor: RequestDescriptor) -> PendingRequest {
        let stamp = self.inner.registry.lock().issue(&descriptor.id);
        self.inner.metrics.lock().record_issued();

        let url = self.url_for(&descriptor.endpoint);
        debug!(
            id = %descriptor.id,
            %stamp,
            method = %descriptor.method,
            %url,
            "issuing request"
        );

        let request = TransportRequest::for_descriptor(url.clone(), &descriptor);
        let issued = Issued {
            id: descriptor.id.clone(),
            stamp,
            method: descriptor.method,
            url,
            body: request.body.clone(),
        };
        let started = Instant::now();
        let response = self.inner.transport.send(request);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = response.await;
            inner.settle(issued, result, started)
        });
        PendingRequest {
            id: descriptor.id,
            stamp,
            task,
        }
    }

    /// Issue a request and deliver its outcome to `callback` on a tokio task.
    ///
    /// The callback runs exactly once with `Ok(data)` on success and `Err`
    /// otherwise; [`RequestError::is_superseded`] tells the two kinds of `Err`
    /// apart. Issuance happens synchronously, as with [`Self::fetch`].
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn request<F>(&self, descriptor: RequestDescriptor, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Option<Value>, RequestError>) + Send + 'static,
    {
        let pending = self.fetch(descriptor);
        tokio::spawn(async move {
            let id = pending.id().to_string();
            let outcome = pending.await;
            callback(outcome.into_result(&id));
        })
    }

    /// [`Self::request`] with the outcome discarded.
    pub fn dispatch(&self, descriptor: RequestDescriptor) -> JoinHandle<()> {
        self.request(descriptor, |_| {})
    }

    /// Most recent stamp issued for `id`, if any.
    pub fn latest_stamp(&self, id: &str) -> Option<IssuanceStamp> {
        self.inner.registry.lock().latest(id)
    }

    /// Recent request/response pairs, oldest first.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.inner.breadcrumbs.lock().entries()
    }

    pub fn drain_breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.inner.breadcrumbs.lock().drain()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.lock().snapshot()
    }
}

/// What `settle` needs to know about the request it is judging.
struct Issued {
    id: String,
    stamp: IssuanceStamp,
    method: Method,
    url: String,
    body: Option<String>,
}

impl Inner {
    fn settle(
        &self,
        issued: Issued,
        result: Result<TransportResponse, TransportError>,
        started: Instant,
    ) -> Outcome {
        let status = result.as_ref().ok().map(|resp| resp.status.as_u16());
        let outcome = match result {
            Err(err) => {
                warn!(id = %issued.id, stamp = %issued.stamp, "transport failed: {err}");
                Outcome::TransportError(err)
            }
            Ok(_) if !self.registry.lock().is_current(&issued.id, issued.stamp) => {
                debug!(id = %issued.id, stamp = %issued.stamp, "discarding superseded response");
                Outcome::Superseded
            }
            Ok(response) => match ResponseEnvelope::from_response(&response) {
                Ok(envelope) => Outcome::Success(envelope.data),
                Err(err) => {
                    warn!(
                        id = %issued.id,
                        stamp = %issued.stamp,
                        status = response.status.as_u16(),
                        "malformed response: {err}"
                    );
                    Outcome::MalformedResponse(err)
                }
            },
        };

        let elapsed = started.elapsed();
        self.metrics.lock().record_settled(outcome.kind(), elapsed);
        self.breadcrumbs.lock().record(Breadcrumb {
            id: issued.id,
            stamp: issued.stamp,
            method: issued.method,
            url: issued.url,
            request_body: issued.body,
            status,
            outcome: outcome.kind(),
            elapsed,
        });
        outcome
    }
}

/// An issued request whose outcome has not been observed yet.
///
/// Dropping it does not un-issue the request: its stamp stays recorded and
/// the round trip keeps running in the background, still leaving its
/// breadcrumb and metrics when it settles.
#[must_use = "the outcome is only observed by awaiting the request"]
pub struct PendingRequest {
    id: String,
    stamp: IssuanceStamp,
    task: JoinHandle<Outcome>,
}

impl PendingRequest {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stamp(&self) -> IssuanceStamp {
        self.stamp
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("stamp", &self.stamp)
            .finish_non_exhaustive()
    }
}

impl Future for PendingRequest {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        Pin::new(&mut self.task).poll(cx).map(|joined| {
            joined.unwrap_or_else(|err| {
                Outcome::TransportError(TransportError::with_source("request task failed", err))
            })
        })
    }
}
