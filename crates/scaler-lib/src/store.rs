//! Parameter store adapter
//!
//! The durable key-value store carries the two captured-state blobs
//! between a scale-down and a later scale-up. Reads treat a missing
//! parameter as empty state; writes merge new keys on top of whatever
//! is already stored so successive partial scale-downs accumulate
//! instead of clobbering each other.

use crate::error::{Result, ScalerError};
use crate::retry;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Default store entry holding captured workload replica counts.
pub const WORKLOAD_STATE_PARAMETER: &str = "/fleet-scaler/k8s-replica-counts";
/// Default store entry holding captured Auto Scaling Group capacity.
pub const FLEET_STATE_PARAMETER: &str = "/fleet-scaler/asg-config";

/// Names of the two state entries, overridable through configuration.
#[derive(Debug, Clone)]
pub struct StateParameters {
    pub workload_state: String,
    pub fleet_state: String,
}

impl Default for StateParameters {
    fn default() -> Self {
        Self {
            workload_state: WORKLOAD_STATE_PARAMETER.to_string(),
            fleet_state: FLEET_STATE_PARAMETER.to_string(),
        }
    }
}

/// Durable named key-value storage for the captured-state blobs.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch the raw value of a parameter. `Ok(None)` when the
    /// parameter does not exist; that is state, not an error.
    async fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write the full value of a parameter, replacing any previous
    /// content. Callers wanting merge semantics go through
    /// [`merge_persist`].
    async fn put(&self, name: &str, value: &str) -> Result<()>;
}

/// Shallow-merge `entries` into the stored JSON object under `name`.
///
/// Existing keys not named by `entries` are preserved; colliding keys
/// are overwritten with the new value. A missing parameter starts from
/// an empty object.
pub async fn merge_persist<T: Serialize>(
    store: &dyn ParameterStore,
    name: &str,
    entries: &BTreeMap<String, T>,
) -> Result<()> {
    let mut merged: Map<String, Value> = match store.get(name).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| ScalerError::InvalidState {
            name: name.to_string(),
            source,
        })?,
        None => {
            debug!(parameter = name, "no existing state, initializing new entry");
            Map::new()
        }
    };

    let fresh = serde_json::to_value(entries).map_err(|source| ScalerError::InvalidState {
        name: name.to_string(),
        source,
    })?;
    if let Value::Object(fresh) = fresh {
        for (key, value) in fresh {
            merged.insert(key, value);
        }
    }

    let serialized = Value::Object(merged).to_string();
    store.put(name, &serialized).await?;
    info!(parameter = name, entries = entries.len(), "persisted captured state");
    Ok(())
}

/// Read a state blob and decode it into its typed shape. `Ok(None)`
/// when the parameter has never been written.
pub async fn read_state<T: DeserializeOwned>(
    store: &dyn ParameterStore,
    name: &str,
) -> Result<Option<T>> {
    match store.get(name).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ScalerError::InvalidState {
                name: name.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// AWS SSM Parameter Store implementation.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        retry::with_backoff("ssm.get_parameter", || async move {
            match self.client.get_parameter().name(name).send().await {
                Ok(output) => Ok(output.parameter.and_then(|p| p.value)),
                Err(err)
                    if err
                        .as_service_error()
                        .map(|e| e.is_parameter_not_found())
                        .unwrap_or(false) =>
                {
                    Ok(None)
                }
                Err(err) => Err(ScalerError::Store(
                    aws_sdk_ssm::error::DisplayErrorContext(err).to_string(),
                )),
            }
        })
        .await
    }

    async fn put(&self, name: &str, value: &str) -> Result<()> {
        retry::with_backoff("ssm.put_parameter", || async move {
            self.client
                .put_parameter()
                .name(name)
                .value(value)
                .r#type(aws_sdk_ssm::types::ParameterType::String)
                .overwrite(true)
                .send()
                .await
                .map(|_| ())
                .map_err(|err| {
                    ScalerError::Store(aws_sdk_ssm::error::DisplayErrorContext(err).to_string())
                })
        })
        .await
    }
}
