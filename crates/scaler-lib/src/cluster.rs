//! Cluster orchestrator adapter
//!
//! Wraps the Kubernetes API behind a narrow trait covering exactly the
//! operations the engines perform: listing workloads per kind, reading
//! an explicitly named workload, patching a replica count, and flipping
//! a CronJob's suspend flag.

use crate::error::{Result, ScalerError};
use crate::models::{Workload, WorkloadKind, WorkloadRef};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::CronJob;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use tracing::debug;

#[async_trait]
pub trait ClusterOrchestrator: Send + Sync {
    /// List all workloads of one kind across all namespaces.
    async fn list_workloads(&self, kind: WorkloadKind) -> Result<Vec<Workload>>;

    /// Read one explicitly named workload. A missing object is a
    /// `WorkloadNotFound` error, never a silent skip.
    async fn get_workload(&self, reference: &WorkloadRef) -> Result<Workload>;

    /// Overwrite the desired replica count of a Deployment or
    /// StatefulSet.
    async fn set_replicas(&self, reference: &WorkloadRef, replicas: i32) -> Result<()>;

    /// Set the suspend flag of a CronJob.
    async fn set_suspended(&self, reference: &WorkloadRef, suspended: bool) -> Result<()>;
}

/// `ClusterOrchestrator` backed by a live kube client.
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn stateful_sets(&self, namespace: &str) -> Api<StatefulSet> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn cron_jobs(&self, namespace: &str) -> Api<CronJob> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterOrchestrator for KubeCluster {
    async fn list_workloads(&self, kind: WorkloadKind) -> Result<Vec<Workload>> {
        let params = ListParams::default();
        let workloads = match kind {
            WorkloadKind::Deployment => Api::<Deployment>::all(self.client.clone())
                .list(&params)
                .await?
                .items
                .iter()
                .map(from_deployment)
                .collect::<Vec<_>>(),
            WorkloadKind::StatefulSet => Api::<StatefulSet>::all(self.client.clone())
                .list(&params)
                .await?
                .items
                .iter()
                .map(from_stateful_set)
                .collect::<Vec<_>>(),
            WorkloadKind::CronJob => Api::<CronJob>::all(self.client.clone())
                .list(&params)
                .await?
                .items
                .iter()
                .map(from_cron_job)
                .collect::<Vec<_>>(),
        };
        debug!(kind = %kind, count = workloads.len(), "listed workloads");
        Ok(workloads)
    }

    async fn get_workload(&self, reference: &WorkloadRef) -> Result<Workload> {
        let result = match reference.kind {
            WorkloadKind::Deployment => self
                .deployments(&reference.namespace)
                .get(&reference.name)
                .await
                .map(|d| from_deployment(&d)),
            WorkloadKind::StatefulSet => self
                .stateful_sets(&reference.namespace)
                .get(&reference.name)
                .await
                .map(|s| from_stateful_set(&s)),
            WorkloadKind::CronJob => self
                .cron_jobs(&reference.namespace)
                .get(&reference.name)
                .await
                .map(|c| from_cron_job(&c)),
        };
        result.map_err(|err| map_get_error(err, reference))
    }

    async fn set_replicas(&self, reference: &WorkloadRef, replicas: i32) -> Result<()> {
        let patch = Patch::Merge(serde_json::json!({"spec": {"replicas": replicas}}));
        let params = PatchParams::default();
        match reference.kind {
            WorkloadKind::Deployment => {
                self.deployments(&reference.namespace)
                    .patch(&reference.name, &params, &patch)
                    .await?;
            }
            WorkloadKind::StatefulSet => {
                self.stateful_sets(&reference.namespace)
                    .patch(&reference.name, &params, &patch)
                    .await?;
            }
            WorkloadKind::CronJob => {
                return Err(ScalerError::Unsupported {
                    kind: reference.kind,
                    operation: "set_replicas",
                });
            }
        }
        Ok(())
    }

    async fn set_suspended(&self, reference: &WorkloadRef, suspended: bool) -> Result<()> {
        if reference.kind != WorkloadKind::CronJob {
            return Err(ScalerError::Unsupported {
                kind: reference.kind,
                operation: "set_suspended",
            });
        }
        let patch = Patch::Merge(serde_json::json!({"spec": {"suspend": suspended}}));
        self.cron_jobs(&reference.namespace)
            .patch(&reference.name, &PatchParams::default(), &patch)
            .await?;
        Ok(())
    }
}

fn from_deployment(deployment: &Deployment) -> Workload {
    Workload {
        reference: WorkloadRef::new(
            deployment.metadata.namespace.clone().unwrap_or_default(),
            WorkloadKind::Deployment,
            deployment.metadata.name.clone().unwrap_or_default(),
        ),
        replicas: deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(0),
        suspended: false,
    }
}

fn from_stateful_set(stateful_set: &StatefulSet) -> Workload {
    Workload {
        reference: WorkloadRef::new(
            stateful_set.metadata.namespace.clone().unwrap_or_default(),
            WorkloadKind::StatefulSet,
            stateful_set.metadata.name.clone().unwrap_or_default(),
        ),
        replicas: stateful_set
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(0),
        suspended: false,
    }
}

fn from_cron_job(cron_job: &CronJob) -> Workload {
    Workload {
        reference: WorkloadRef::new(
            cron_job.metadata.namespace.clone().unwrap_or_default(),
            WorkloadKind::CronJob,
            cron_job.metadata.name.clone().unwrap_or_default(),
        ),
        replicas: 0,
        suspended: cron_job
            .spec
            .as_ref()
            .and_then(|spec| spec.suspend)
            .unwrap_or(false),
    }
}

/// Map a kube 404 on an explicitly requested object to the domain
/// `WorkloadNotFound`; pass other API errors through.
fn map_get_error(err: kube::Error, reference: &WorkloadRef) -> ScalerError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => ScalerError::WorkloadNotFound {
            kind: reference.kind,
            namespace: reference.namespace.clone(),
            name: reference.name.clone(),
        },
        other => ScalerError::Kube(other),
    }
}
