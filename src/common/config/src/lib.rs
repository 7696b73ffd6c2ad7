//! Configuration management for Quarry.
//!
//! Provides session configuration for plan conversion and execution.

use common_error::{QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};

/// Default number of rows per partition when a single batch is registered.
pub const DEFAULT_PARTITION_ROWS: usize = 8192;

/// Session-wide Quarry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuarryConfig {
    /// Plan conversion configuration.
    pub conversion: ConversionConfig,
    /// Execution configuration.
    pub execution: ExecutionConfig,
}

impl QuarryConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> QuarryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> QuarryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> QuarryResult<()> {
        if self.execution.partition_rows == 0 {
            return Err(QuarryError::invalid_parameter(
                "execution.partition_rows must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Plan conversion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Assert that the root result matches the plan's row type exactly.
    pub check_terminal_schema: bool,
    /// Record per-node conversion metrics.
    pub collect_metrics: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            check_terminal_schema: true,
            collect_metrics: true,
        }
    }
}

/// Execution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Maximum rows per partition when splitting a registered batch.
    pub partition_rows: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            partition_rows: DEFAULT_PARTITION_ROWS,
        }
    }
}

impl ExecutionConfig {
    /// Set the partition size.
    #[must_use]
    pub const fn with_partition_rows(mut self, partition_rows: usize) -> Self {
        self.partition_rows = partition_rows;
        self
    }
}
