//! Registry core: endpoint and network service model, execution context, and log fields.

pub mod context;
pub mod error;
pub mod fields;
pub mod types;

pub use context::ExecutionContext;
pub use error::{ContextError, RegistryError};
pub use fields::LogFields;
pub use types::{
    NetworkService, NetworkServiceEndpoint, NetworkServiceEndpointQuery, NetworkServiceLabels,
    NetworkServiceQuery,
};
