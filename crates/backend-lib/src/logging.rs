//! Logging setup and structured domain log lines.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{Operation, Resource};
use crate::config::LogSettings;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    info!(level = %settings.level, json = settings.json, "logging initialized");
    Ok(())
}

/// Log a successful admin-gated mutation
pub fn log_admin_action(user_id: &str, resource: Resource, operation: Operation, target_id: &str) {
    info!(
        user_id,
        resource = %resource,
        operation = %operation,
        target_id,
        "admin action performed"
    );
}

/// Log a membership change on an event or group
pub fn log_membership(user_id: &str, resource: Resource, target_id: &str, action: &str) {
    info!(
        user_id,
        resource = %resource,
        target_id,
        action,
        "membership changed"
    );
}
