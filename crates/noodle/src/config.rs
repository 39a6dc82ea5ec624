//! # Engine Configuration
//!
//! Runtime knobs read from the `[engine]` table of a game description.
//! Every field has a default, so the table may be omitted entirely.

use serde::{Deserialize, Serialize};

use noodle_core::DEFAULT_BUCKET_COUNT;

use crate::error::{LoadError, LoadResult};
use crate::tick::DEFAULT_TICK_RATE;

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Buckets per store.
    pub buckets: usize,
    /// Threads running handlers during collecting.
    pub workers: usize,
    /// Ticks per second; zero runs unpaced.
    pub tick_rate: u32,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKET_COUNT,
            workers: 4,
            tick_rate: DEFAULT_TICK_RATE,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// [`LoadError::Invalid`] if `buckets` or `workers` is zero.
    pub fn validate(&self) -> LoadResult<()> {
        if self.buckets == 0 {
            return Err(LoadError::Invalid("engine.buckets must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(LoadError::Invalid("engine.workers must be at least 1".into()));
        }
        Ok(())
    }
}
