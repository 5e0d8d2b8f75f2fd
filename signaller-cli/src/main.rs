use anyhow::{Context, Result};
use clap::Parser;
use signaller::server::{ServerConfig, serve};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// WebRTC signaling relay: brokers SDP offers/answers and ICE candidates between a
/// room's source and its clients.
#[derive(Parser, Debug)]
#[command(name = "signaller", author, version, about, long_about = None)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long, env = "SIGNALLER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "SIGNALLER_BIND")]
    bind: Option<SocketAddr>,

    /// Port to listen on, keeping the configured host
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// JSON key holding the envelope type
    #[arg(long, env = "SIGNALLER_TYPE_KEY")]
    type_key: Option<String>,

    /// JSON key holding the envelope contents
    #[arg(long, env = "SIGNALLER_CONTENTS_KEY")]
    contents_key: Option<String>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, env = "SIGNALLER_LOG")]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.bind.set_port(port);
        }
        if let Some(key) = self.type_key {
            config.envelope.type_key = key;
        }
        if let Some(key) = self.contents_key {
            config.envelope.contents_key = key;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;
    init_tracing(&config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        type_key = %config.envelope.type_key,
        contents_key = %config.envelope.contents_key,
        "Starting signaling relay"
    );

    serve(config, shutdown_signal()).await
}
