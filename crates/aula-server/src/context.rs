//! Service-oriented application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state. It is cheaply cloneable because it only holds `Arc`s and a
//! pooled handle.

use std::sync::Arc;

use aula_core::config::Config;
use aula_db::pool::DbPool;

use crate::middleware::rate_limit::SharedLimiter;
use crate::session::SessionIssuer;

/// Application context shared by all request handlers (via Axum state).
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Playback session issuer (access guard + token signer).
    pub issuer: Arc<SessionIssuer>,
    /// Rate limiter applied to session issuance.
    pub play_limiter: SharedLimiter,
}
