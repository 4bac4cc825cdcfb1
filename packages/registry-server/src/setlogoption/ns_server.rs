use async_trait::async_trait;
use registry_core::{ExecutionContext, NetworkService, NetworkServiceQuery, RegistryError};

use super::{ContextOverride, SetLogOption};
use crate::registry::{FindServer, NetworkServiceRegistryServer};

#[async_trait]
impl<S> NetworkServiceRegistryServer for SetLogOption<S>
where
    S: NetworkServiceRegistryServer,
{
    async fn register(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<NetworkService, RegistryError> {
        let ctx = self.with_fields(&ctx);
        self.next.register(ctx, service).await
    }

    async fn find(
        &self,
        query: NetworkServiceQuery,
        server: &dyn FindServer<NetworkService>,
    ) -> Result<(), RegistryError> {
        let ctx = self.with_fields(server.context());
        let server = ContextOverride::new(server, ctx);
        self.next.find(query, &server).await
    }

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        service: NetworkService,
    ) -> Result<(), RegistryError> {
        let ctx = self.with_fields(&ctx);
        self.next.unregister(ctx, service).await
    }
}
