mod cli;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use irc_relay::{Dialer, Proxy, ProxyConfig, TcpDialer, TlsDialer};
use irc_sanitizer::STANDARD_RULES;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Load config, then merge CLI overrides.
    let loaded = config::load(&cli.config)?;
    let config_found = loaded.is_some();
    let mut cfg = loaded.unwrap_or_default();
    cfg.merge_cli(&cli);

    // 3. Init tracing-subscriber with JSON format.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    if !config_found {
        warn!(
            path = %cli.config.display(),
            "configuration file not found; using defaults"
        );
    }

    cfg.validate()?;

    info!(
        config_file = %cli.config.display(),
        listen = %cfg.network.listen_addr,
        upstream = %cfg.upstream.addr,
        tls = cfg.upstream.tls,
        "ircscrub starting"
    );

    // 4. Build the upstream dialer.
    let dialer: Arc<dyn Dialer> = if cfg.upstream.tls {
        Arc::new(
            TlsDialer::new(cfg.upstream.server_name.clone())
                .context("failed to build TLS client configuration")?,
        )
    } else {
        Arc::new(TcpDialer)
    };

    // 5. Shutdown signal (ctrl_c + SIGTERM).
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(());
    });

    // 6. Bind and serve.
    let proxy = Proxy::bind(ProxyConfig {
        listen_addr: cfg.network.listen_addr.clone(),
        upstream_addr: cfg.upstream.addr.clone(),
        dialer,
        rules: &STANDARD_RULES,
        max_line_length: cfg.codec.max_line_length,
    })
    .await
    .with_context(|| format!("failed to bind {}", cfg.network.listen_addr))?;

    proxy
        .serve(shutdown_rx)
        .await
        .context("accept loop failed")?;

    info!("ircscrub shutting down");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT (ctrl-c)"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler; SIGINT only");
                ctrl_c.await.ok();
                info!("received SIGINT (ctrl-c)");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT (ctrl-c)");
    }
}
