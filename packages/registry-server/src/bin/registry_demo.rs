//! Runs a small in-memory registry chain and exercises every operation.
//!
//! Example:
//! `RUST_LOG=debug registry-demo --node-id n1 --log-option cluster=c1 --log-format json`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use registry_core::{
    ExecutionContext, LogFields, NetworkServiceEndpoint, NetworkServiceEndpointQuery,
};
use registry_server::config::parse_log_option;
use registry_server::telemetry::{init_tracing, LogFormat};
use registry_server::{
    ChannelFindServer, MemoryRegistry, NetworkServiceEndpointRegistryServer, RegistryConfig,
    SetLogOptionLayer, TraceRegistryLayer,
};
use tower::ServiceBuilder;

#[derive(Debug, Parser)]
#[command(name = "registry-demo", about = "Exercise a registry chain with log options")]
struct Args {
    /// JSON config file.
    #[arg(long, env = "REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "REGISTRY_NODE_ID")]
    node_id: Option<String>,

    /// Extra context field, repeatable.
    #[arg(long = "log-option", value_name = "KEY=VALUE", value_parser = parse_log_option)]
    log_options: Vec<(String, String)>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Number of endpoints to register.
    #[arg(long, default_value_t = 3)]
    endpoints: usize,
}

fn load_config(args: &Args) -> anyhow::Result<RegistryConfig> {
    let mut config = match &args.config {
        Some(path) => RegistryConfig::from_file(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(node_id) = &args.node_id {
        config.node_id.clone_from(node_id);
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }
    if !args.log_options.is_empty() {
        let overrides: LogFields = args.log_options.iter().cloned().collect();
        config.log_options = config.log_options.merged(&overrides);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(config.log_format, &config.log_level)?;

    let memory = Arc::new(MemoryRegistry::new());
    let chain = ServiceBuilder::new()
        .layer(SetLogOptionLayer::new(config.effective_log_options()))
        .layer(TraceRegistryLayer)
        .service(Arc::clone(&memory));

    let ctx = ExecutionContext::background();
    for i in 0..args.endpoints {
        let endpoint = NetworkServiceEndpoint {
            name: format!("nse-{i}"),
            network_service_names: vec!["icmp-responder".to_string()],
            url: format!("tcp://127.0.0.1:{}", 5000 + i),
            ..NetworkServiceEndpoint::default()
        };
        chain.register(ctx.clone(), endpoint).await?;
    }

    let (server, mut rx) = ChannelFindServer::new(ctx.clone(), config.find_channel_capacity);
    let consumer = tokio::spawn(async move {
        let mut found = Vec::new();
        while let Some(endpoint) = rx.recv().await {
            found.push(endpoint);
        }
        found
    });
    chain
        .find(NetworkServiceEndpointQuery::default(), &server)
        .await?;
    drop(server);
    let found = consumer.await?;
    tracing::info!(count = found.len(), "find returned endpoints");

    for endpoint in found {
        chain.unregister(ctx.clone(), endpoint).await?;
    }
    tracing::info!(remaining = memory.endpoint_count(), "demo complete");
    Ok(())
}
