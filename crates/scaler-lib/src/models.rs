//! Core data model: workload references, live workload snapshots,
//! fleet groups, and the persisted capture key format

use crate::error::ScalerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The closed set of workload kinds the scaler manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    CronJob,
}

impl WorkloadKind {
    /// All kinds, in the order they are discovered during scale-down.
    pub const ALL: [WorkloadKind; 3] = [
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::CronJob,
    ];

    /// Lowercase form used in capture keys and user-facing JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "statefulset",
            WorkloadKind::CronJob => "cronjob",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = ScalerError;

    /// Case-insensitive: "Deployment", "deployment" and "DEPLOYMENT"
    /// all name the same kind.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" => Ok(WorkloadKind::Deployment),
            "statefulset" => Ok(WorkloadKind::StatefulSet),
            "cronjob" => Ok(WorkloadKind::CronJob),
            _ => Err(ScalerError::MalformedKey(s.to_string())),
        }
    }
}

impl Serialize for WorkloadKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorkloadKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "unknown workload kind '{raw}' (expected deployment, statefulset or cronjob)"
            ))
        })
    }
}

/// Identity of a managed workload: namespace + kind + name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub kind: WorkloadKind,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, kind: WorkloadKind, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            name: name.into(),
        }
    }

    /// Composite key under which a replica count is persisted,
    /// `<kind>/<namespace>/<name>` with the kind lowercase.
    pub fn capture_key(&self) -> String {
        format!("{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Parse a persisted capture key back into a workload reference.
///
/// The key must split into exactly three parts and the first part must
/// name a known kind; anything else is a `MalformedKey`.
pub fn parse_capture_key(key: &str) -> Result<WorkloadRef, ScalerError> {
    let parts: Vec<&str> = key.split('/').collect();
    let [kind, namespace, name] = parts.as_slice() else {
        return Err(ScalerError::MalformedKey(key.to_string()));
    };
    let kind = kind
        .parse()
        .map_err(|_| ScalerError::MalformedKey(key.to_string()))?;
    Ok(WorkloadRef::new(*namespace, kind, *name))
}

/// Live snapshot of a workload as read from the cluster.
#[derive(Debug, Clone)]
pub struct Workload {
    pub reference: WorkloadRef,
    /// Desired replica count. Always 0 for CronJobs.
    pub replicas: i32,
    /// Suspend flag. Only meaningful for CronJobs.
    pub suspended: bool,
}

/// Capacity bounds of an Auto Scaling Group.
///
/// Serialized with the AWS field casing so the persisted blob reads
/// `{"MinSize": .., "DesiredCapacity": .., "MaxSize": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FleetCapacity {
    pub min_size: i32,
    pub desired_capacity: i32,
    pub max_size: i32,
}

impl FleetCapacity {
    pub const ZERO: FleetCapacity = FleetCapacity {
        min_size: 0,
        desired_capacity: 0,
        max_size: 0,
    };

    /// True when the group is already fully scaled down, making a
    /// capture-and-zero pass a no-op.
    pub fn is_all_zero(&self) -> bool {
        !(self.min_size > 0 || self.desired_capacity != 0 || self.max_size != 0)
    }
}

/// Live snapshot of an Auto Scaling Group.
#[derive(Debug, Clone)]
pub struct FleetGroup {
    pub name: String,
    pub capacity: FleetCapacity,
}
