//! Registry chain-link contracts.
//!
//! Every chain element implements the same trait it consumes, so elements can
//! wrap each other in any order. Unary calls receive their
//! [`ExecutionContext`] as an argument; `find` reads it from the stream handle.

use std::sync::Arc;

use async_trait::async_trait;
use registry_core::{
    ExecutionContext, NetworkService, NetworkServiceEndpoint, NetworkServiceEndpointQuery,
    NetworkServiceQuery, RegistryError,
};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// FindServer
// ---------------------------------------------------------------------------

/// Server side of a streaming `find` call.
#[async_trait]
pub trait FindServer<T: Send + 'static>: Send + Sync {
    /// Emits one result item to the caller.
    async fn send(&self, item: T) -> Result<(), RegistryError>;

    /// Context of the streaming call.
    fn context(&self) -> &ExecutionContext;
}

// ---------------------------------------------------------------------------
// Registry server traits
// ---------------------------------------------------------------------------

/// Endpoint registry operations.
#[async_trait]
pub trait NetworkServiceEndpointRegistryServer: Send + Sync {
    async fn register(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<NetworkServiceEndpoint, RegistryError>;

    async fn find(
        &self,
        query: NetworkServiceEndpointQuery,
        server: &dyn FindServer<NetworkServiceEndpoint>,
    ) -> Result<(), RegistryError>;

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<(), RegistryError>;
}

/// Network service registry operations.
#[async_trait]
pub trait NetworkServiceRegistryServer: Send + Sync {
    async fn register(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<NetworkService, RegistryError>;

    async fn find(
        &self,
        query: NetworkServiceQuery,
        server: &dyn FindServer<NetworkService>,
    ) -> Result<(), RegistryError>;

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<(), RegistryError>;
}

// ---------------------------------------------------------------------------
// Smart pointer forwarding
// ---------------------------------------------------------------------------

macro_rules! forward_registry {
    ($ptr:ident, $registry:ident, $item:ty, $query:ty, $server:ty) => {
        #[async_trait]
        impl<T: $registry + ?Sized> $registry for $ptr<T> {
            async fn register(
                &self,
                ctx: ExecutionContext,
                item: $item,
            ) -> Result<$item, RegistryError> {
                (**self).register(ctx, item).await
            }

            async fn find(&self, query: $query, server: &$server) -> Result<(), RegistryError> {
                (**self).find(query, server).await
            }

            async fn unregister(
                &self,
                ctx: ExecutionContext,
                item: $item,
            ) -> Result<(), RegistryError> {
                (**self).unregister(ctx, item).await
            }
        }
    };
}

forward_registry!(
    Arc,
    NetworkServiceEndpointRegistryServer,
    NetworkServiceEndpoint,
    NetworkServiceEndpointQuery,
    dyn FindServer<NetworkServiceEndpoint>
);
forward_registry!(
    Box,
    NetworkServiceEndpointRegistryServer,
    NetworkServiceEndpoint,
    NetworkServiceEndpointQuery,
    dyn FindServer<NetworkServiceEndpoint>
);
forward_registry!(
    Arc,
    NetworkServiceRegistryServer,
    NetworkService,
    NetworkServiceQuery,
    dyn FindServer<NetworkService>
);
forward_registry!(
    Box,
    NetworkServiceRegistryServer,
    NetworkService,
    NetworkServiceQuery,
    dyn FindServer<NetworkService>
);

// ---------------------------------------------------------------------------
// ChannelFindServer
// ---------------------------------------------------------------------------

/// Stream handle that forwards sent items into a bounded mpsc channel.
///
/// The receiving half plays the role of the remote caller: items arrive in
/// send order, and `send` waits for capacity when the receiver falls behind.
#[derive(Debug)]
pub struct ChannelFindServer<T> {
    ctx: ExecutionContext,
    tx: mpsc::Sender<T>,
}

impl<T> ChannelFindServer<T> {
    /// Creates a handle for a call running under `ctx`, together with the
    /// receiver that observes the stream.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0. [`RegistryConfig`](crate::RegistryConfig)
    /// rejects that value when it is loaded.
    #[must_use]
    pub fn new(ctx: ExecutionContext, capacity: usize) -> (Self, mpsc::Receiver<T>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { ctx, tx }, rx)
    }
}

#[async_trait]
impl<T: Send + 'static> FindServer<T> for ChannelFindServer<T> {
    async fn send(&self, item: T) -> Result<(), RegistryError> {
        self.tx
            .send(item)
            .await
            .map_err(|_| RegistryError::StreamClosed)
    }

    fn context(&self) -> &ExecutionContext {
        &self.ctx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
