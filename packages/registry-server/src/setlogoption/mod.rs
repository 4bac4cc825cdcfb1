//! Chain element that attaches a fixed set of log fields to every call.
//!
//! [`SetLogOption`] wraps the next registry in the chain. Unary calls have the
//! configured fields merged into their [`ExecutionContext`] before being
//! delegated; `find` calls get their stream handle wrapped in a
//! [`ContextOverride`] so that the next element reads the enriched context from
//! the handle while sends still reach the original stream. Results and errors
//! come back from the next element untouched.
//!
//! Fields set by an element closer to the handler override same-named fields
//! set by elements further out.

mod find_server;
mod layer;
mod ns_server;
mod nse_server;

pub use find_server::ContextOverride;
pub use layer::SetLogOptionLayer;

use registry_core::{ExecutionContext, LogFields};

/// Registry decorator that enriches each call's context with `options`.
///
/// Implements [`NetworkServiceEndpointRegistryServer`] and
/// [`NetworkServiceRegistryServer`] whenever `S` does.
///
/// [`NetworkServiceEndpointRegistryServer`]: crate::registry::NetworkServiceEndpointRegistryServer
/// [`NetworkServiceRegistryServer`]: crate::registry::NetworkServiceRegistryServer
#[derive(Debug, Clone)]
pub struct SetLogOption<S> {
    options: LogFields,
    next: S,
}

impl<S> SetLogOption<S> {
    /// Wraps `next`, attaching `options` to every call. An empty `options`
    /// makes the element a pass-through.
    pub fn new(options: impl Into<LogFields>, next: S) -> Self {
        Self {
            options: options.into(),
            next,
        }
    }

    #[must_use]
    pub fn options(&self) -> &LogFields {
        &self.options
    }

    /// The wrapped chain element.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.next
    }

    fn with_fields(&self, ctx: &ExecutionContext) -> ExecutionContext {
        ctx.with_fields(&self.options)
    }
}
