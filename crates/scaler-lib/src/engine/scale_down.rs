//! Capture-and-suspend engine

use crate::cluster::ClusterOrchestrator;
use crate::error::Result;
use crate::fleet::FleetManager;
use crate::models::{FleetCapacity, WorkloadKind, WorkloadRef};
use crate::select;
use crate::store::{self, ParameterStore, StateParameters};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Working-set selection for a scale-down run. `None` on an axis means
/// "everything visible"; exclusion lists are applied afterwards.
#[derive(Debug, Clone, Default)]
pub struct ScaleDownRequest {
    pub workloads: Option<Vec<WorkloadRef>>,
    pub exclude_workloads: Option<Vec<WorkloadRef>>,
    pub groups: Option<Vec<String>>,
    pub exclude_groups: Option<Vec<String>>,
}

/// Counts of what a scale-down run actually touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleDownSummary {
    pub workloads_scaled: usize,
    pub cronjobs_suspended: usize,
    pub groups_scaled: usize,
}

impl fmt::Display for ScaleDownSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} workloads scaled to zero, {} cronjobs suspended, {} auto scaling groups scaled to zero",
            self.workloads_scaled, self.cronjobs_suspended, self.groups_scaled
        )
    }
}

/// Capture live capacity and force the working set down to zero.
///
/// Replicated workloads at zero and fleet groups already at {0,0,0}
/// are full no-ops: no record, no patch. Re-running scale-down can
/// therefore never overwrite a previously captured value with zero.
/// CronJobs are suspended unconditionally and never captured. The two
/// accumulators are merge-persisted once each, only when non-empty.
pub async fn scale_down(
    cluster: &dyn ClusterOrchestrator,
    fleet: &dyn FleetManager,
    store: &dyn ParameterStore,
    parameters: &StateParameters,
    request: &ScaleDownRequest,
) -> Result<ScaleDownSummary> {
    info!("scaling down workloads and auto scaling groups");
    let mut summary = ScaleDownSummary::default();

    let selected = select::workloads(cluster, request.workloads.as_deref()).await?;
    let selected = select::filter_excluded_workloads(selected, request.exclude_workloads.as_deref());

    let mut captured: BTreeMap<String, i32> = BTreeMap::new();
    for workload in &selected {
        let reference = &workload.reference;
        match reference.kind {
            WorkloadKind::Deployment | WorkloadKind::StatefulSet => {
                if workload.replicas > 0 {
                    info!(workload = %reference, replicas = workload.replicas, "scaling down");
                    captured.insert(reference.capture_key(), workload.replicas);
                    cluster.set_replicas(reference, 0).await?;
                    summary.workloads_scaled += 1;
                } else {
                    info!(workload = %reference, "already at zero replicas, skipping");
                }
            }
            WorkloadKind::CronJob => {
                info!(workload = %reference, "suspending cronjob");
                cluster.set_suspended(reference, true).await?;
                summary.cronjobs_suspended += 1;
            }
        }
    }
    if !captured.is_empty() {
        store::merge_persist(store, &parameters.workload_state, &captured).await?;
    }

    let groups = select::fleet_groups(fleet, request.groups.as_deref()).await?;
    let groups = select::filter_excluded_groups(groups, request.exclude_groups.as_deref());

    let mut captured: BTreeMap<String, FleetCapacity> = BTreeMap::new();
    for group in &groups {
        if group.capacity.is_all_zero() {
            info!(group = %group.name, "already scaled down to zero, skipping");
            continue;
        }
        info!(
            group = %group.name,
            min = group.capacity.min_size,
            desired = group.capacity.desired_capacity,
            max = group.capacity.max_size,
            "scaling down auto scaling group"
        );
        captured.insert(group.name.clone(), group.capacity);
        fleet.set_capacity(&group.name, FleetCapacity::ZERO).await?;
        summary.groups_scaled += 1;
    }
    if !captured.is_empty() {
        store::merge_persist(store, &parameters.fleet_state, &captured).await?;
    }

    Ok(summary)
}
