//! Picks a live Jenkins master out of the pool

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::error::HookshotError;
use crate::jenkins::BuildEngine;
use crate::registry::{BuildInstance, Registry};
use crate::utils::select_healthy;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Resolves the pool on every call and returns a random instance that
/// passed its health check. Nothing is cached between calls.
#[derive(Clone)]
pub struct InstanceLocator {
    registry: Arc<dyn Registry>,
    engine: Arc<dyn BuildEngine>,
    max_attempts: usize,
}

impl InstanceLocator {
    pub fn new(registry: Arc<dyn Registry>, engine: Arc<dyn BuildEngine>) -> Self {
        Self {
            registry,
            engine,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn locate(&self, pool: &str) -> Result<BuildInstance, HookshotError> {
        let tasks = self.registry.tasks(pool).await?;
        if tasks.is_empty() {
            return Err(HookshotError::EmptyPool(pool.to_string()));
        }

        let pick = || tasks[rand::thread_rng().gen_range(0..tasks.len())].clone();
        let healthy = |instance: BuildInstance| async move {
            let alive = self.engine.probe(&instance).await;
            if !alive {
                warn!("Jenkins master {} failed its health check", instance);
            }
            alive
        };

        match select_healthy(self.max_attempts, pick, healthy).await {
            Some(instance) => {
                info!("Selected Jenkins master {} from pool '{}'", instance, pool);
                Ok(instance)
            }
            None => Err(HookshotError::PoolExhausted {
                pool: pool.to_string(),
                attempts: self.max_attempts,
            }),
        }
    }
}
