//! Tracing chain element.
//!
//! Opens a span per registry call carrying the context's log fields, then logs
//! the call's duration and outcome. Results pass through unchanged. Placed
//! inside a [`SetLogOption`](crate::setlogoption::SetLogOption) it reports the
//! fields that element attached.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use registry_core::{
    ExecutionContext, NetworkService, NetworkServiceEndpoint, NetworkServiceEndpointQuery,
    NetworkServiceQuery, RegistryError,
};
use tower::Layer;
use tracing::{Instrument, Span};

use crate::registry::{
    FindServer, NetworkServiceEndpointRegistryServer, NetworkServiceRegistryServer,
};

// ---------------------------------------------------------------------------
// TraceRegistryLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps registries with [`TraceRegistry`].
#[derive(Debug, Clone, Default)]
pub struct TraceRegistryLayer;

impl<S> Layer<S> for TraceRegistryLayer {
    type Service = TraceRegistry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceRegistry { next: inner }
    }
}

// ---------------------------------------------------------------------------
// TraceRegistry
// ---------------------------------------------------------------------------

/// Registry wrapper that records each call in a `tracing` span.
#[derive(Debug, Clone)]
pub struct TraceRegistry<S> {
    next: S,
}

impl<S> TraceRegistry<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }
}

async fn traced<R, F>(span: Span, fut: F) -> Result<R, RegistryError>
where
    F: Future<Output = Result<R, RegistryError>> + Send,
{
    async move {
        let start = Instant::now();
        let result = fut.await;

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                duration_ms = duration_ms,
                outcome = "ok",
                "registry call complete"
            ),
            Err(err) => tracing::warn!(
                duration_ms = duration_ms,
                outcome = "error",
                error = %err,
                "registry call failed"
            ),
        }
        result
    }
    .instrument(span)
    .await
}

#[async_trait]
impl<S> NetworkServiceEndpointRegistryServer for TraceRegistry<S>
where
    S: NetworkServiceEndpointRegistryServer,
{
    async fn register(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<NetworkServiceEndpoint, RegistryError> {
        traced(ctx.span("nse/register"), self.next.register(ctx, endpoint)).await
    }

    async fn find(
        &self,
        query: NetworkServiceEndpointQuery,
        server: &dyn FindServer<NetworkServiceEndpoint>,
    ) -> Result<(), RegistryError> {
        traced(
            server.context().span("nse/find"),
            self.next.find(query, server),
        )
        .await
    }

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<(), RegistryError> {
        traced(
            ctx.span("nse/unregister"),
            self.next.unregister(ctx, endpoint),
        )
        .await
    }
}

#[async_trait]
impl<S> NetworkServiceRegistryServer for TraceRegistry<S>
where
    S: NetworkServiceRegistryServer,
{
    async fn register(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<NetworkService, RegistryError> {
        traced(ctx.span("ns/register"), self.next.register(ctx, service)).await
    }

    async fn find(
        &self,
        query: NetworkServiceQuery,
        server: &dyn FindServer<NetworkService>,
    ) -> Result<(), RegistryError> {
        traced(
            server.context().span("ns/find"),
            self.next.find(query, server),
        )
        .await
    }

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<(), RegistryError> {
        traced(ctx.span("ns/unregister"), self.next.unregister(ctx, service)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
