//! Core library for coordinated shutdown and restoration of a workload fleet
//!
//! This crate provides the capture/restore machinery behind the
//! `fleet-scaler` CLI:
//! - Typed references to Kubernetes workloads and AWS Auto Scaling Groups
//! - Collaborator traits for the cluster, the fleet manager, and the
//!   parameter store, with kube/AWS SDK implementations
//! - Resource selection and exclusion filtering
//! - The scale-down (capture-and-suspend) and scale-up (restore) engines

pub mod cluster;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod models;
pub mod retry;
pub mod select;
pub mod store;

pub use cluster::{ClusterOrchestrator, KubeCluster};
pub use engine::{scale_down, scale_up, ScaleDownRequest, ScaleDownSummary, ScaleUpSummary};
pub use error::{Result, ScalerError};
pub use fleet::{AwsFleetManager, FleetManager};
pub use models::{FleetCapacity, FleetGroup, Workload, WorkloadKind, WorkloadRef};
pub use store::{ParameterStore, SsmParameterStore, StateParameters};
