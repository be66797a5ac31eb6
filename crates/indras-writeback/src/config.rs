//! Buffer pool configuration

use serde::{Deserialize, Serialize};

use crate::error::{WritebackError, WritebackResult};

/// Configuration for [`SharedBufferPool`](crate::SharedBufferPool)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity of freshly allocated buffers
    pub initial_capacity: usize,
    /// Maximum number of idle buffers kept on the free list
    pub max_retained: usize,
    /// Buffers that grew beyond this capacity are dropped on release
    pub max_buffer_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 4 * 1024,
            max_retained: 64,
            max_buffer_capacity: 1024 * 1024,
        }
    }
}

impl PoolConfig {
    /// Parse a configuration from a JSON object; missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> WritebackResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(WritebackError::invalid_config(
                "pool configuration must be a JSON object",
            ));
        }
        let config: PoolConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the limits are consistent with each other
    pub fn validate(&self) -> WritebackResult<()> {
        if self.max_buffer_capacity == 0 {
            return Err(WritebackError::invalid_config(
                "max_buffer_capacity must be positive",
            ));
        }
        if self.initial_capacity > self.max_buffer_capacity {
            return Err(WritebackError::invalid_config(format!(
                "initial_capacity ({}) exceeds max_buffer_capacity ({})",
                self.initial_capacity, self.max_buffer_capacity
            )));
        }
        Ok(())
    }
}
