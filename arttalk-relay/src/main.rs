//! Art Talks relay server.
//!
//! An axum server that hosts one discussion room per artwork over WebSocket
//! and serves the artwork catalog over REST.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080
//! cargo run --bin arttalk-relay
//!
//! # Run on a custom address
//! cargo run --bin arttalk-relay -- --bind 127.0.0.1:3001
//!
//! # Or pick just the port
//! PORT=3001 cargo run --bin arttalk-relay
//! ```

use std::sync::Arc;

use arttalk_relay::catalog::StaticCatalog;
use arttalk_relay::config::{RelayCliArgs, RelayConfig};
use arttalk_relay::relay::{self, RelayState};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // A panic anywhere takes the whole process down.
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "relay panicked");
        std::process::exit(1);
    }));

    tracing::debug!(config_file = ?cli.config, "resolved relay configuration");
    tracing::info!(
        addr = %config.bind_addr,
        max_frame_size = config.max_frame_size,
        "starting arttalk relay server"
    );

    let state = Arc::new(RelayState::with_config(config.max_frame_size));
    let catalog = Arc::new(StaticCatalog::new());

    let (bound_addr, mut handle) =
        match relay::start_server_with_state(&config.bind_addr, Arc::clone(&state), catalog).await
        {
            Ok(started) => started,
            Err(e) => {
                tracing::error!(error = %e, "failed to start relay server");
                std::process::exit(1);
            }
        };
    tracing::info!(addr = %bound_addr, "relay server listening");

    let stopped_early = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            None
        }
        result = &mut handle => Some(result),
    };

    // Shutdown returns only after the sockets have flushed their close
    // frames, so returning from main afterwards cannot cut them off.
    let finished = match stopped_early {
        Some(result) => result,
        None => {
            state.shutdown().await;
            handle.await
        }
    };

    if let Err(e) = finished {
        tracing::error!(error = %e, "relay server task failed");
    }
}
