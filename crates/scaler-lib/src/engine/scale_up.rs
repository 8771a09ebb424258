//! Restore engine

use crate::cluster::ClusterOrchestrator;
use crate::error::Result;
use crate::fleet::FleetManager;
use crate::models::{parse_capture_key, FleetCapacity, WorkloadKind};
use crate::store::{self, ParameterStore, StateParameters};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Counts of what a scale-up run actually restored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleUpSummary {
    pub workloads_restored: usize,
    pub cronjobs_resumed: usize,
    pub groups_restored: usize,
    /// Stored keys skipped because they were malformed or named a
    /// kind that is never captured.
    pub keys_skipped: usize,
}

impl fmt::Display for ScaleUpSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} workloads restored, {} cronjobs resumed, {} auto scaling groups restored",
            self.workloads_restored, self.cronjobs_resumed, self.groups_restored
        )?;
        if self.keys_skipped > 0 {
            write!(f, " ({} stored keys skipped)", self.keys_skipped)?;
        }
        Ok(())
    }
}

/// Replay the captured capacity back onto the live fleet.
///
/// Both state blobs tolerate absence: a parameter that was never
/// written means "nothing to restore" on that axis. Stored values are
/// written back unconditionally, with no guard against the live object
/// having drifted in the meantime. Every CronJob visible on the
/// platform is resumed, not only those suspended by a prior
/// scale-down. The blobs are NOT cleared afterwards, so a repeated
/// scale-up converges to the same captured values.
pub async fn scale_up(
    cluster: &dyn ClusterOrchestrator,
    fleet: &dyn FleetManager,
    store: &dyn ParameterStore,
    parameters: &StateParameters,
) -> Result<ScaleUpSummary> {
    info!("scaling up workloads and auto scaling groups");
    let mut summary = ScaleUpSummary::default();

    match store::read_state::<BTreeMap<String, FleetCapacity>>(store, &parameters.fleet_state)
        .await?
    {
        Some(state) => {
            for (name, capacity) in &state {
                info!(
                    group = %name,
                    min = capacity.min_size,
                    desired = capacity.desired_capacity,
                    max = capacity.max_size,
                    "restoring auto scaling group"
                );
                fleet.set_capacity(name, *capacity).await?;
                summary.groups_restored += 1;
            }
        }
        None => info!("no stored auto scaling group state found"),
    }

    match store::read_state::<BTreeMap<String, i32>>(store, &parameters.workload_state).await? {
        Some(state) => {
            for (key, replicas) in &state {
                let reference = match parse_capture_key(key) {
                    Ok(reference) => reference,
                    Err(err) => {
                        warn!(key = %key, error = %err, "skipping malformed capture key");
                        summary.keys_skipped += 1;
                        continue;
                    }
                };
                match reference.kind {
                    WorkloadKind::Deployment | WorkloadKind::StatefulSet => {
                        info!(workload = %reference, replicas, "restoring replica count");
                        cluster.set_replicas(&reference, *replicas).await?;
                        summary.workloads_restored += 1;
                    }
                    // CronJobs are never captured into this blob; a key
                    // claiming otherwise is treated like a malformed one.
                    WorkloadKind::CronJob => {
                        warn!(key = %key, "cronjob key in workload state, skipping");
                        summary.keys_skipped += 1;
                    }
                }
            }
        }
        None => info!("no stored workload state found"),
    }

    // Intentionally broader than the captured set: any CronJob
    // suspended by any means is resumed.
    for cron_job in cluster.list_workloads(WorkloadKind::CronJob).await? {
        info!(workload = %cron_job.reference, "resuming cronjob");
        cluster.set_suspended(&cron_job.reference, false).await?;
        summary.cronjobs_resumed += 1;
    }

    Ok(summary)
}
