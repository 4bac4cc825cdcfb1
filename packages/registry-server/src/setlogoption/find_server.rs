//! Stream handle wrapper that substitutes the call context.

use async_trait::async_trait;
use registry_core::{ExecutionContext, RegistryError};

use crate::registry::FindServer;

/// Wraps a [`FindServer`] for the duration of one `find` call, replacing the
/// context it reports.
///
/// `send` goes straight to the wrapped handle: same item, same result, no
/// buffering. Only [`context`](FindServer::context) differs.
pub struct ContextOverride<'a, T: Send + 'static> {
    inner: &'a dyn FindServer<T>,
    ctx: ExecutionContext,
}

impl<'a, T: Send + 'static> ContextOverride<'a, T> {
    pub fn new(inner: &'a dyn FindServer<T>, ctx: ExecutionContext) -> Self {
        Self { inner, ctx }
    }
}

#[async_trait]
impl<'a, T: Send + 'static> FindServer<T> for ContextOverride<'a, T> {
    async fn send(&self, item: T) -> Result<(), RegistryError> {
        self.inner.send(item).await
    }

    fn context(&self) -> &ExecutionContext {
        &self.ctx
    }
}
