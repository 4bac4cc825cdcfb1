//! In-memory registry: the terminal element of a chain.
//!
//! Entries are keyed by name. `find` streams a snapshot of the matching
//! entries in name order; watch queries end after the snapshot.

use async_trait::async_trait;
use dashmap::DashMap;
use registry_core::{
    ExecutionContext, NetworkService, NetworkServiceEndpoint, NetworkServiceEndpointQuery,
    NetworkServiceQuery, RegistryError,
};

use crate::registry::{
    FindServer, NetworkServiceEndpointRegistryServer, NetworkServiceRegistryServer,
};

/// Registry storing endpoints and network services in concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    endpoints: DashMap<String, NetworkServiceEndpoint>,
    services: DashMap<String, NetworkService>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

fn check_call(ctx: &ExecutionContext, name: &str) -> Result<(), RegistryError> {
    if let Some(err) = ctx.err() {
        return Err(err.into());
    }
    if name.is_empty() {
        return Err(RegistryError::InvalidArgument(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Sends `items` in order, stopping as soon as the stream's context ends.
///
/// A send blocked on a slow receiver is abandoned when the context is
/// cancelled or its deadline passes.
async fn stream_all<T: Send + 'static>(
    server: &dyn FindServer<T>,
    items: Vec<T>,
) -> Result<(), RegistryError> {
    let ctx = server.context();
    for item in items {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            sent = server.send(item) => sent?,
        }
    }
    Ok(())
}

fn log_watch_ignored(ctx: &ExecutionContext) {
    tracing::debug!(
        fields = %ctx.fields(),
        "watch not supported, sending snapshot only"
    );
}

/// Clones matching entries out of `map`, sorted by name.
///
/// No map guard is held once this returns, so the caller may await freely.
fn snapshot<T: Clone>(map: &DashMap<String, T>, matches: impl Fn(&T) -> bool) -> Vec<T> {
    let mut found: Vec<(String, T)> = map
        .iter()
        .filter(|entry| matches(entry.value()))
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl NetworkServiceEndpointRegistryServer for MemoryRegistry {
    async fn register(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<NetworkServiceEndpoint, RegistryError> {
        check_call(&ctx, &endpoint.name)?;
        self.endpoints
            .insert(endpoint.name.clone(), endpoint.clone());
        tracing::debug!(
            name = %endpoint.name,
            fields = %ctx.fields(),
            "endpoint registered"
        );
        Ok(endpoint)
    }

    async fn find(
        &self,
        query: NetworkServiceEndpointQuery,
        server: &dyn FindServer<NetworkServiceEndpoint>,
    ) -> Result<(), RegistryError> {
        if query.watch {
            log_watch_ignored(server.context());
        }
        let found = snapshot(&self.endpoints, |nse| query.matches(nse));
        stream_all(server, found).await
    }

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<(), RegistryError> {
        check_call(&ctx, &endpoint.name)?;
        if self.endpoints.remove(&endpoint.name).is_some() {
            tracing::debug!(
                name = %endpoint.name,
                fields = %ctx.fields(),
                "endpoint unregistered"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkServiceRegistryServer for MemoryRegistry {
    async fn register(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<NetworkService, RegistryError> {
        check_call(&ctx, &service.name)?;
        self.services.insert(service.name.clone(), service.clone());
        tracing::debug!(
            name = %service.name,
            fields = %ctx.fields(),
            "network service registered"
        );
        Ok(service)
    }

    async fn find(
        &self,
        query: NetworkServiceQuery,
        server: &dyn FindServer<NetworkService>,
    ) -> Result<(), RegistryError> {
        if query.watch {
            log_watch_ignored(server.context());
        }
        let found = snapshot(&self.services, |ns| query.matches(ns));
        stream_all(server, found).await
    }

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<(), RegistryError> {
        check_call(&ctx, &service.name)?;
        self.services.remove(&service.name);
        Ok(())
    }
}
