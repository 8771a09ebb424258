//! Engine tests against in-memory collaborator fakes
//!
//! These exercise the capture/restore properties end to end:
//! idempotence, exact round-trips, merge-not-overwrite persistence,
//! zero-skips, cronjob resume breadth and NotFound tolerance.

use super::*;
use crate::cluster::ClusterOrchestrator;
use crate::error::{Result, ScalerError};
use crate::fleet::FleetManager;
use crate::models::{FleetCapacity, FleetGroup, Workload, WorkloadKind, WorkloadRef};
use crate::store::testing::MemoryStore;
use crate::store::StateParameters;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

struct FakeCluster {
    workloads: Mutex<Vec<Workload>>,
}

impl FakeCluster {
    fn with(workloads: Vec<Workload>) -> Self {
        Self {
            workloads: Mutex::new(workloads),
        }
    }

    fn replicas_of(&self, reference: &WorkloadRef) -> i32 {
        self.workloads
            .lock()
            .unwrap()
            .iter()
            .find(|w| &w.reference == reference)
            .map(|w| w.replicas)
            .expect("workload should exist")
    }

    fn suspended(&self, name: &str) -> bool {
        self.workloads
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.reference.name == name)
            .map(|w| w.suspended)
            .expect("workload should exist")
    }
}

#[async_trait]
impl ClusterOrchestrator for FakeCluster {
    async fn list_workloads(&self, kind: WorkloadKind) -> Result<Vec<Workload>> {
        Ok(self
            .workloads
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.reference.kind == kind)
            .cloned()
            .collect())
    }

    async fn get_workload(&self, reference: &WorkloadRef) -> Result<Workload> {
        self.workloads
            .lock()
            .unwrap()
            .iter()
            .find(|w| &w.reference == reference)
            .cloned()
            .ok_or_else(|| ScalerError::WorkloadNotFound {
                kind: reference.kind,
                namespace: reference.namespace.clone(),
                name: reference.name.clone(),
            })
    }

    async fn set_replicas(&self, reference: &WorkloadRef, replicas: i32) -> Result<()> {
        let mut workloads = self.workloads.lock().unwrap();
        let workload = workloads
            .iter_mut()
            .find(|w| &w.reference == reference)
            .ok_or_else(|| ScalerError::WorkloadNotFound {
                kind: reference.kind,
                namespace: reference.namespace.clone(),
                name: reference.name.clone(),
            })?;
        workload.replicas = replicas;
        Ok(())
    }

    async fn set_suspended(&self, reference: &WorkloadRef, suspended: bool) -> Result<()> {
        let mut workloads = self.workloads.lock().unwrap();
        let workload = workloads
            .iter_mut()
            .find(|w| &w.reference == reference)
            .ok_or_else(|| ScalerError::WorkloadNotFound {
                kind: reference.kind,
                namespace: reference.namespace.clone(),
                name: reference.name.clone(),
            })?;
        workload.suspended = suspended;
        Ok(())
    }
}

struct FakeFleet {
    groups: Mutex<Vec<FleetGroup>>,
}

impl FakeFleet {
    fn with(groups: Vec<FleetGroup>) -> Self {
        Self {
            groups: Mutex::new(groups),
        }
    }

    fn empty() -> Self {
        Self::with(Vec::new())
    }

    fn capacity_of(&self, name: &str) -> FleetCapacity {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.capacity)
            .expect("group should exist")
    }
}

#[async_trait]
impl FleetManager for FakeFleet {
    async fn list_groups(&self) -> Result<Vec<FleetGroup>> {
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn describe_group(&self, name: &str) -> Result<FleetGroup> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.name == name)
            .cloned()
            .ok_or_else(|| ScalerError::GroupNotFound(name.to_string()))
    }

    async fn set_capacity(&self, name: &str, capacity: FleetCapacity) -> Result<()> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| ScalerError::GroupNotFound(name.to_string()))?;
        group.capacity = capacity;
        Ok(())
    }
}

fn deployment(namespace: &str, name: &str, replicas: i32) -> Workload {
    Workload {
        reference: WorkloadRef::new(namespace, WorkloadKind::Deployment, name),
        replicas,
        suspended: false,
    }
}

fn stateful_set(namespace: &str, name: &str, replicas: i32) -> Workload {
    Workload {
        reference: WorkloadRef::new(namespace, WorkloadKind::StatefulSet, name),
        replicas,
        suspended: false,
    }
}

fn cron_job(namespace: &str, name: &str, suspended: bool) -> Workload {
    Workload {
        reference: WorkloadRef::new(namespace, WorkloadKind::CronJob, name),
        replicas: 0,
        suspended,
    }
}

fn group(name: &str, min: i32, desired: i32, max: i32) -> FleetGroup {
    FleetGroup {
        name: name.to_string(),
        capacity: FleetCapacity {
            min_size: min,
            desired_capacity: desired,
            max_size: max,
        },
    }
}

fn workload_state(store: &MemoryStore, parameters: &StateParameters) -> BTreeMap<String, i32> {
    serde_json::from_str(&store.raw(&parameters.workload_state).unwrap()).unwrap()
}

#[tokio::test]
async fn round_trip_restores_exact_capacity() {
    let cluster = FakeCluster::with(vec![
        deployment("default", "web", 5),
        stateful_set("prod", "db", 2),
        cron_job("default", "nightly", false),
    ]);
    let fleet = FakeFleet::with(vec![group("workers", 1, 3, 5)]);
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let down = scale_down(&cluster, &fleet, &store, &parameters, &ScaleDownRequest::default())
        .await
        .unwrap();
    assert_eq!(down.workloads_scaled, 2);
    assert_eq!(down.cronjobs_suspended, 1);
    assert_eq!(down.groups_scaled, 1);

    let state = workload_state(&store, &parameters);
    assert_eq!(state.get("deployment/default/web"), Some(&5));
    assert_eq!(state.get("statefulset/prod/db"), Some(&2));
    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("default", WorkloadKind::Deployment, "web")),
        0
    );
    assert!(cluster.suspended("nightly"));
    assert!(fleet.capacity_of("workers").is_all_zero());

    let up = scale_up(&cluster, &fleet, &store, &parameters).await.unwrap();
    assert_eq!(up.workloads_restored, 2);
    assert_eq!(up.cronjobs_resumed, 1);
    assert_eq!(up.groups_restored, 1);

    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("default", WorkloadKind::Deployment, "web")),
        5
    );
    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("prod", WorkloadKind::StatefulSet, "db")),
        2
    );
    assert!(!cluster.suspended("nightly"));
    assert_eq!(
        fleet.capacity_of("workers"),
        FleetCapacity {
            min_size: 1,
            desired_capacity: 3,
            max_size: 5
        }
    );
}

#[tokio::test]
async fn repeated_scale_down_never_captures_zero() {
    let cluster = FakeCluster::with(vec![deployment("default", "web", 5)]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    scale_down(&cluster, &fleet, &store, &parameters, &ScaleDownRequest::default())
        .await
        .unwrap();
    let second = scale_down(&cluster, &fleet, &store, &parameters, &ScaleDownRequest::default())
        .await
        .unwrap();

    assert_eq!(second, ScaleDownSummary::default());
    // The captured value survives the second run untouched.
    assert_eq!(
        workload_state(&store, &parameters).get("deployment/default/web"),
        Some(&5)
    );
}

#[tokio::test]
async fn capture_merges_into_prior_state() {
    let parameters = StateParameters::default();
    let store = MemoryStore::seeded(&parameters.workload_state, r#"{"deployment/ns/a": 3}"#);
    let cluster = FakeCluster::with(vec![deployment("ns", "b", 2)]);
    let fleet = FakeFleet::empty();

    scale_down(&cluster, &fleet, &store, &parameters, &ScaleDownRequest::default())
        .await
        .unwrap();

    let state = workload_state(&store, &parameters);
    assert_eq!(state.get("deployment/ns/a"), Some(&3));
    assert_eq!(state.get("deployment/ns/b"), Some(&2));
}

#[tokio::test]
async fn zero_replica_workloads_produce_no_record_and_no_write() {
    let cluster = FakeCluster::with(vec![deployment("default", "idle", 0)]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let summary = scale_down(&cluster, &fleet, &store, &parameters, &ScaleDownRequest::default())
        .await
        .unwrap();

    assert_eq!(summary.workloads_scaled, 0);
    // Empty accumulator: the store is never written at all.
    assert!(store.raw(&parameters.workload_state).is_none());
}

#[tokio::test]
async fn all_zero_groups_produce_no_record_and_no_update() {
    let cluster = FakeCluster::with(vec![]);
    let fleet = FakeFleet::with(vec![group("drained", 0, 0, 0)]);
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let summary = scale_down(&cluster, &fleet, &store, &parameters, &ScaleDownRequest::default())
        .await
        .unwrap();

    assert_eq!(summary.groups_scaled, 0);
    assert!(store.raw(&parameters.fleet_state).is_none());
}

#[tokio::test]
async fn scale_up_resumes_every_visible_cronjob() {
    // Suspended by hand, never captured by any scale-down.
    let cluster = FakeCluster::with(vec![cron_job("ops", "backup", true)]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let summary = scale_up(&cluster, &fleet, &store, &parameters).await.unwrap();

    assert_eq!(summary.workloads_restored, 0);
    assert_eq!(summary.groups_restored, 0);
    assert_eq!(summary.cronjobs_resumed, 1);
    assert!(!cluster.suspended("backup"));
}

#[tokio::test]
async fn scale_up_tolerates_missing_state() {
    let cluster = FakeCluster::with(vec![]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let summary = scale_up(&cluster, &fleet, &store, &parameters).await.unwrap();
    assert_eq!(summary, ScaleUpSummary::default());
}

#[tokio::test]
async fn malformed_capture_keys_are_skipped() {
    let parameters = StateParameters::default();
    let store = MemoryStore::seeded(
        &parameters.workload_state,
        r#"{"bogus": 1, "cronjob/default/x": 2, "deployment/default/web": 4}"#,
    );
    let cluster = FakeCluster::with(vec![deployment("default", "web", 0)]);
    let fleet = FakeFleet::empty();

    let summary = scale_up(&cluster, &fleet, &store, &parameters).await.unwrap();

    assert_eq!(summary.workloads_restored, 1);
    assert_eq!(summary.keys_skipped, 2);
    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("default", WorkloadKind::Deployment, "web")),
        4
    );
}

#[tokio::test]
async fn restore_overwrites_live_drift() {
    let parameters = StateParameters::default();
    let store = MemoryStore::seeded(&parameters.workload_state, r#"{"deployment/default/web": 3}"#);
    // Someone scaled the deployment by hand in the meantime.
    let cluster = FakeCluster::with(vec![deployment("default", "web", 7)]);
    let fleet = FakeFleet::with(vec![group("workers", 0, 0, 0)]);
    let fleet_store = MemoryStore::seeded(
        &parameters.fleet_state,
        r#"{"workers": {"MinSize": 1, "DesiredCapacity": 2, "MaxSize": 3}}"#,
    );

    scale_up(&cluster, &fleet, &store, &parameters).await.unwrap();
    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("default", WorkloadKind::Deployment, "web")),
        3
    );

    scale_up(&cluster, &fleet, &fleet_store, &parameters).await.unwrap();
    assert_eq!(
        fleet.capacity_of("workers"),
        FleetCapacity {
            min_size: 1,
            desired_capacity: 2,
            max_size: 3
        }
    );
}

#[tokio::test]
async fn explicitly_requested_missing_workload_aborts_the_run() {
    let cluster = FakeCluster::with(vec![]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let request = ScaleDownRequest {
        workloads: Some(vec![WorkloadRef::new(
            "default",
            WorkloadKind::Deployment,
            "ghost",
        )]),
        ..Default::default()
    };
    let result = scale_down(&cluster, &fleet, &store, &parameters, &request).await;

    assert!(matches!(result, Err(ScalerError::WorkloadNotFound { .. })));
    assert!(store.raw(&parameters.workload_state).is_none());
}

#[tokio::test]
async fn explicitly_requested_missing_group_aborts_the_run() {
    let cluster = FakeCluster::with(vec![]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let request = ScaleDownRequest {
        groups: Some(vec!["ghost".to_string()]),
        ..Default::default()
    };
    let result = scale_down(&cluster, &fleet, &store, &parameters, &request).await;

    assert!(matches!(result, Err(ScalerError::GroupNotFound(_))));
    assert!(store.raw(&parameters.fleet_state).is_none());
}

#[tokio::test]
async fn exclusion_leaves_excluded_workloads_untouched() {
    let cluster = FakeCluster::with(vec![
        deployment("ns", "keep-running", 4),
        deployment("ns", "shut-down", 6),
    ]);
    let fleet = FakeFleet::empty();
    let store = MemoryStore::default();
    let parameters = StateParameters::default();

    let request = ScaleDownRequest {
        exclude_workloads: Some(vec![WorkloadRef::new(
            "ns",
            WorkloadKind::Deployment,
            "keep-running",
        )]),
        ..Default::default()
    };
    scale_down(&cluster, &fleet, &store, &parameters, &request)
        .await
        .unwrap();

    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("ns", WorkloadKind::Deployment, "keep-running")),
        4
    );
    assert_eq!(
        cluster.replicas_of(&WorkloadRef::new("ns", WorkloadKind::Deployment, "shut-down")),
        0
    );
    let state = workload_state(&store, &parameters);
    assert!(!state.contains_key("deployment/ns/keep-running"));
    assert_eq!(state.get("deployment/ns/shut-down"), Some(&6));
}
