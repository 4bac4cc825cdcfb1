//! Registry server chain elements.
//!
//! - [`registry`]: chain-link contracts and the channel-backed `find` stream handle
//! - [`setlogoption`]: attaches configured log fields to every call's context
//! - [`trace`]: per-call tracing spans
//! - [`memory`]: in-memory terminal registry
//! - [`config`], [`telemetry`]: configuration and log sink setup

pub mod config;
pub mod memory;
pub mod registry;
pub mod setlogoption;
pub mod telemetry;
pub mod trace;

pub use config::{ConfigError, RegistryConfig};
pub use memory::MemoryRegistry;
pub use registry::{
    ChannelFindServer, FindServer, NetworkServiceEndpointRegistryServer,
    NetworkServiceRegistryServer,
};
pub use setlogoption::{ContextOverride, SetLogOption, SetLogOptionLayer};
pub use trace::{TraceRegistry, TraceRegistryLayer};
