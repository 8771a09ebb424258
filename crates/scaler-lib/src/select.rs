//! Resource selection and exclusion filtering
//!
//! Selection has two independent axes (cluster workloads, fleet
//! groups), each with an optional inclusion list and an optional
//! exclusion list. No inclusion list means "everything currently
//! visible"; an explicitly listed resource that does not exist aborts
//! the run. Exclusion is order-preserving and a no-op when absent.

use crate::cluster::ClusterOrchestrator;
use crate::error::Result;
use crate::fleet::FleetManager;
use crate::models::{FleetGroup, Workload, WorkloadKind, WorkloadRef};
use tracing::{debug, info};

/// Resolve the working set of workloads.
///
/// With no inclusion list, every Deployment, StatefulSet and CronJob
/// visible to the cluster is selected. With one, each named reference
/// is read individually and a missing reference surfaces as
/// `WorkloadNotFound`.
pub async fn workloads(
    cluster: &dyn ClusterOrchestrator,
    include: Option<&[WorkloadRef]>,
) -> Result<Vec<Workload>> {
    match include {
        None => {
            info!("no inclusion list, selecting all workloads");
            let mut selected = Vec::new();
            for kind in WorkloadKind::ALL {
                selected.extend(cluster.list_workloads(kind).await?);
            }
            Ok(selected)
        }
        Some(references) => {
            info!(count = references.len(), "selecting explicitly listed workloads");
            let mut selected = Vec::with_capacity(references.len());
            for reference in references {
                selected.push(cluster.get_workload(reference).await?);
            }
            Ok(selected)
        }
    }
}

/// Drop workloads whose identity matches an exclusion entry. Kind is
/// compared case-insensitively (normalized at parse time); namespace
/// and name are exact.
pub fn filter_excluded_workloads(
    workloads: Vec<Workload>,
    exclude: Option<&[WorkloadRef]>,
) -> Vec<Workload> {
    let Some(exclude) = exclude else {
        return workloads;
    };
    if exclude.is_empty() {
        return workloads;
    }
    let filtered: Vec<Workload> = workloads
        .into_iter()
        .filter(|workload| !exclude.contains(&workload.reference))
        .collect();
    debug!(remaining = filtered.len(), "applied workload exclusion list");
    filtered
}

/// Resolve the working set of fleet groups. Same contract as
/// [`workloads`]: absent inclusion list means every group, a named
/// group that does not exist surfaces as `GroupNotFound`.
pub async fn fleet_groups(
    fleet: &dyn FleetManager,
    include: Option<&[String]>,
) -> Result<Vec<FleetGroup>> {
    match include {
        None => {
            info!("no inclusion list, selecting all auto scaling groups");
            fleet.list_groups().await
        }
        Some(names) => {
            info!(count = names.len(), "selecting explicitly listed auto scaling groups");
            let mut selected = Vec::with_capacity(names.len());
            for name in names {
                selected.push(fleet.describe_group(name).await?);
            }
            Ok(selected)
        }
    }
}

/// Drop fleet groups whose name matches an exclusion entry.
pub fn filter_excluded_groups(
    groups: Vec<FleetGroup>,
    exclude: Option<&[String]>,
) -> Vec<FleetGroup> {
    let Some(exclude) = exclude else {
        return groups;
    };
    if exclude.is_empty() {
        return groups;
    }
    let filtered: Vec<FleetGroup> = groups
        .into_iter()
        .filter(|group| !exclude.contains(&group.name))
        .collect();
    debug!(remaining = filtered.len(), "applied group exclusion list");
    filtered
}
