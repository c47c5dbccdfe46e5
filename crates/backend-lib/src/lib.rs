// ============================
// social-backend/src/lib.rs
// ============================
//! Core library for the social network REST backend.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{generate_secret, AuthRateLimiter, TokenService};
use crate::config::{ConfigError, Settings, StorageBackend};
use crate::middleware::RateLimiter;
use crate::storage::{init_database, DocumentStore, FlatFileStore, MemoryStore};

pub use router::create_router;

/// How often expired limiter entries are swept
pub const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers
pub struct AppState {
    /// Document store backend
    pub store: Arc<dyn DocumentStore>,
    /// Bearer token issuer and verifier
    pub tokens: Arc<TokenService>,
    /// Validated settings
    pub settings: Arc<Settings>,
    /// Per-client request limiter
    pub rate_limiter: Arc<RateLimiter>,
    /// Per-account login lockout
    pub login_limiter: AuthRateLimiter,
}

impl AppState {
    /// Build state around an already bootstrapped store.
    pub fn new(store: Arc<dyn DocumentStore>, settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let secret = match &settings.auth.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!("auth.jwt_secret not set; generated a random secret, tokens will not survive a restart");
                generate_secret()
            },
        };
        let tokens = Arc::new(TokenService::new(
            secret.as_bytes(),
            settings.auth.token_ttl_secs,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            Duration::from_secs(settings.rate_limit.window_secs),
            settings.rate_limit.max_requests,
        ));
        let login_limiter = AuthRateLimiter::new(
            settings.auth.max_login_attempts,
            Duration::from_secs(settings.auth.lockout_secs),
        );

        Ok(Self {
            store,
            tokens,
            settings: Arc::new(settings),
            rate_limiter,
            login_limiter,
        })
    }

    /// Drop expired request windows and login lockouts.
    pub fn sweep_limiters(&self) {
        self.rate_limiter.cleanup();
        self.login_limiter.cleanup();
        tracing::debug!(
            clients = self.rate_limiter.tracked_clients(),
            accounts = self.login_limiter.tracked_accounts(),
            "rate limiters swept"
        );
    }

    /// Sweep the limiters every `every` until the state is dropped.
    pub fn spawn_limiter_cleanup(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let state = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                state.sweep_limiters();
            }
        })
    }

    /// Open the configured store, bootstrap its collections and build state.
    pub async fn open(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match settings.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => {
                Arc::new(FlatFileStore::open(settings.storage.database_dir()).await?)
            },
        };
        init_database(store.as_ref()).await?;
        tracing::info!(
            backend = ?settings.storage.backend,
            database = %settings.storage.database,
            "document store ready"
        );
        Ok(Self::new(store, settings)?)
    }
}
