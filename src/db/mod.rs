use std::time::Duration;

use tracing::info;

pub mod store;

use crate::error::HookshotError;
pub use store::{DispatchRecord, EventRecorder, EventStore, RedisEventStore};

/// List holding the most recent correlation ids, newest first
pub const RECENT_KEY: &str = "recent";
/// List consumed by the log pipeline
pub const LOGSTASH_KEY: &str = "logstash";

/// Build the Redis-backed event store for `redis_host` (`host` or `host:port`).
///
/// Connections are opened lazily per write, so Redis being down at startup
/// is not fatal.
pub fn init_store(redis_host: &str, timeout: Duration) -> Result<RedisEventStore, HookshotError> {
    let url = format!("redis://{}/", redis_host.trim_end_matches('/'));
    info!("Using Redis event store at {}", url);

    let client = redis::Client::open(url.as_str())
        .map_err(|e| HookshotError::ConfigError(format!("Invalid Redis host '{}': {}", redis_host, e)))?;
    Ok(RedisEventStore::new(client, timeout))
}
