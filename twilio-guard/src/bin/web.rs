//! Twilio Guard Web Server - demo SMS endpoint behind the webhook guard.
//!
//! This binary provides a small web server that:
//! - Verifies that inbound SMS webhooks were signed by Twilio
//! - Replies with TwiML echoing the message body
//! - Exposes a health check

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use twilio_guard::{web::router, GuardConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = GuardConfig::from_env();
    config.validate().context("Invalid configuration")?;
    info!(
        port = config.port,
        auth_token_configured = config.auth_token.is_some(),
        skip_signature_validation = config.skip_signature_validation,
        debug = config.debug,
        local_scheme = %config.local_scheme,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    if config.debug {
        warn!("sms_debug_enabled_invalid_signatures_will_be_accepted");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(Arc::new(config));

    // Bind to address
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
