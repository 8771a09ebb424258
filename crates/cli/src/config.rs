//! Configuration management for the CLI

use anyhow::Result;
use scaler_lib::store::{StateParameters, FLEET_STATE_PARAMETER, WORKLOAD_STATE_PARAMETER};
use serde::Deserialize;

/// CLI configuration, loaded from `FLEET_SCALER_*` environment
/// variables. Controls where the two captured-state blobs live in the
/// parameter store.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Store entry holding captured workload replica counts
    #[serde(default = "default_workload_state_parameter")]
    pub workload_state_parameter: String,

    /// Store entry holding captured Auto Scaling Group capacity
    #[serde(default = "default_fleet_state_parameter")]
    pub fleet_state_parameter: String,
}

fn default_workload_state_parameter() -> String {
    WORKLOAD_STATE_PARAMETER.to_string()
}

fn default_fleet_state_parameter() -> String {
    FLEET_STATE_PARAMETER.to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            workload_state_parameter: default_workload_state_parameter(),
            fleet_state_parameter: default_fleet_state_parameter(),
        }
    }
}

impl CliConfig {
    /// Load configuration from the environment, falling back to the
    /// defaults when nothing is set.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FLEET_SCALER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    pub fn state_parameters(&self) -> StateParameters {
        StateParameters {
            workload_state: self.workload_state_parameter.clone(),
            fleet_state: self.fleet_state_parameter.clone(),
        }
    }
}
