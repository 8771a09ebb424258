//! Fleet manager adapter
//!
//! Wraps the AWS Auto Scaling API behind the trait the engines use:
//! describing groups (all or by name) and rewriting a group's
//! {min, desired, max} capacity.

use crate::error::{Result, ScalerError};
use crate::models::{FleetCapacity, FleetGroup};
use crate::retry;
use async_trait::async_trait;
use aws_sdk_autoscaling::types::AutoScalingGroup;
use tracing::debug;

#[async_trait]
pub trait FleetManager: Send + Sync {
    /// Describe every Auto Scaling Group visible to the account.
    async fn list_groups(&self) -> Result<Vec<FleetGroup>>;

    /// Describe one explicitly named group. A missing group is a
    /// `GroupNotFound` error.
    async fn describe_group(&self, name: &str) -> Result<FleetGroup>;

    /// Overwrite the group's capacity bounds.
    async fn set_capacity(&self, name: &str, capacity: FleetCapacity) -> Result<()>;
}

/// `FleetManager` backed by the AWS Auto Scaling API.
pub struct AwsFleetManager {
    client: aws_sdk_autoscaling::Client,
}

impl AwsFleetManager {
    pub fn new(client: aws_sdk_autoscaling::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FleetManager for AwsFleetManager {
    async fn list_groups(&self) -> Result<Vec<FleetGroup>> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let token = next_token.clone();
            let output = retry::with_backoff("autoscaling.describe_auto_scaling_groups", || {
                let token = token.clone();
                async move {
                    self.client
                        .describe_auto_scaling_groups()
                        .set_next_token(token)
                        .send()
                        .await
                        .map_err(fleet_error)
                }
            })
            .await?;

            groups.extend(output.auto_scaling_groups().iter().map(from_asg));
            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        debug!(count = groups.len(), "described auto scaling groups");
        Ok(groups)
    }

    async fn describe_group(&self, name: &str) -> Result<FleetGroup> {
        let output = retry::with_backoff("autoscaling.describe_auto_scaling_groups", || async move {
            self.client
                .describe_auto_scaling_groups()
                .auto_scaling_group_names(name)
                .send()
                .await
                .map_err(fleet_error)
        })
        .await?;

        output
            .auto_scaling_groups()
            .first()
            .map(from_asg)
            .ok_or_else(|| ScalerError::GroupNotFound(name.to_string()))
    }

    async fn set_capacity(&self, name: &str, capacity: FleetCapacity) -> Result<()> {
        retry::with_backoff("autoscaling.update_auto_scaling_group", || async move {
            self.client
                .update_auto_scaling_group()
                .auto_scaling_group_name(name)
                .min_size(capacity.min_size)
                .desired_capacity(capacity.desired_capacity)
                .max_size(capacity.max_size)
                .send()
                .await
                .map(|_| ())
                .map_err(fleet_error)
        })
        .await
    }
}

fn from_asg(group: &AutoScalingGroup) -> FleetGroup {
    FleetGroup {
        name: group
            .auto_scaling_group_name()
            .unwrap_or_default()
            .to_string(),
        capacity: FleetCapacity {
            min_size: group.min_size().unwrap_or(0),
            desired_capacity: group.desired_capacity().unwrap_or(0),
            max_size: group.max_size().unwrap_or(0),
        },
    }
}

fn fleet_error<E>(err: aws_sdk_autoscaling::error::SdkError<E>) -> ScalerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ScalerError::Fleet(aws_sdk_autoscaling::error::DisplayErrorContext(err).to_string())
}
