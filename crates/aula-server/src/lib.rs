//! aula-server: HTTP API for secure lecture playback.
//!
//! This crate ties the aula crates into a running server application:
//!
//! - Axum-based HTTP API with bearer authentication and rate limiting
//! - Access guard + session issuer minting signed, time-limited media URLs
//! - Checkpoint store endpoints recording watched progress
//! - Token-gated media streaming with HTTP range support
//! - Graceful shutdown via signal handling

pub mod access;
pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod session;
pub mod signer;

use std::net::SocketAddr;
use std::sync::Arc;

use aula_core::config::Config;

use crate::context::AppContext;
use crate::middleware::rate_limit::create_limiter;
use crate::session::SessionIssuer;

/// Requests per minute allowed on the session issuance endpoint.
const PLAY_RATE_LIMIT_PER_MINUTE: u32 = 120;

/// Start the aula server.
///
/// Initializes the database, constructs the [`AppContext`], bootstraps the
/// admin account if configured, and serves HTTP until a shutdown signal is
/// received.
pub async fn start(config: Config) -> aula_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Initialize database.
    let db_path = &config.server.db_path;
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = aula_db::pool::init_pool(&db_str)?;
    tracing::info!("Database ready at {db_str}");

    // Bootstrap the admin account if configured and missing.
    {
        let conn = aula_db::pool::get_conn(&db)?;
        ensure_admin(&conn, &config)?;
    }

    let issuer = Arc::new(SessionIssuer::from_config(&config));

    let ctx = AppContext {
        db,
        config: Arc::new(config.clone()),
        issuer,
        play_limiter: create_limiter(PLAY_RATE_LIMIT_PER_MINUTE),
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| aula_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let app = router::build_router(ctx, config.server.static_dir.clone());

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| aula_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| aula_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Create the bootstrap admin from config when no real admin exists yet.
fn ensure_admin(conn: &rusqlite::Connection, config: &Config) -> aula_core::Result<()> {
    if aula_db::queries::users::admin_exists(conn)? {
        return Ok(());
    }

    let (Some(username), Some(hash)) = (
        config.auth.admin_username.as_deref(),
        config.auth.admin_password_hash.as_deref(),
    ) else {
        if config.auth.enabled {
            tracing::warn!(
                "No admin account exists and no auth.admin_username/admin_password_hash \
                 configured; admin endpoints will be unreachable"
            );
        }
        return Ok(());
    };

    aula_db::queries::users::create_user(conn, username, hash, username, "admin")?;
    tracing::info!("Bootstrapped admin account '{username}'");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
