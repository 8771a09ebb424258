//! fleet-scaler CLI
//!
//! One-shot operator tool for cost-saving shutdown of an EKS fleet:
//! `scale-down` captures live replica counts and Auto Scaling Group
//! capacity into the SSM parameter store and forces everything to
//! zero; `scale-up` reads the captured state back and restores it.

mod config;
mod output;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::{Parser, ValueEnum};
use scaler_lib::{
    scale_down, scale_up, AwsFleetManager, KubeCluster, ScaleDownRequest, SsmParameterStore,
    WorkloadRef,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::CliConfig;
use output::{print_success, print_warning};

/// Scale Kubernetes workloads and AWS Auto Scaling Groups down to zero
/// and back up again
#[derive(Parser)]
#[command(name = "fleet-scaler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Action to perform
    #[arg(value_enum)]
    action: Action,

    /// Kubernetes workloads to consider, as a JSON array of
    /// {"namespace", "kind", "name"} objects (default: all)
    #[arg(long, value_parser = parse_workload_refs)]
    k8s_resources: Option<WorkloadRefList>,

    /// Kubernetes workloads to exclude, same JSON shape
    #[arg(long, value_parser = parse_workload_refs)]
    exclude_k8s_resources: Option<WorkloadRefList>,

    /// AWS Auto Scaling Groups to consider (default: all)
    #[arg(long, num_args = 0..)]
    aws_asg_resources: Option<Vec<String>>,

    /// AWS Auto Scaling Groups to exclude
    #[arg(long, num_args = 0..)]
    exclude_aws_asg_resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Capture current capacity, then force everything to zero
    ScaleDown,
    /// Restore previously captured capacity
    ScaleUp,
}

/// JSON-typed flag payload. Malformed JSON is rejected by clap before
/// any platform call is made.
#[derive(Debug, Clone)]
struct WorkloadRefList(Vec<WorkloadRef>);

fn parse_workload_refs(raw: &str) -> Result<WorkloadRefList, String> {
    serde_json::from_str(raw)
        .map(WorkloadRefList)
        .map_err(|err| format!("expected a JSON array of {{namespace, kind, name}} objects: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load()?;
    let parameters = config.state_parameters();

    info!("loading kubernetes configuration");
    let kube_client = kube::Client::try_default()
        .await
        .context("failed to load kubernetes configuration (in-cluster or kubeconfig)")?;
    let cluster = KubeCluster::new(kube_client);

    info!("loading aws configuration");
    let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = SsmParameterStore::new(aws_sdk_ssm::Client::new(&aws));
    let fleet = AwsFleetManager::new(aws_sdk_autoscaling::Client::new(&aws));

    match cli.action {
        Action::ScaleDown => {
            let request = ScaleDownRequest {
                workloads: cli.k8s_resources.map(|list| list.0),
                exclude_workloads: cli.exclude_k8s_resources.map(|list| list.0),
                groups: cli.aws_asg_resources,
                exclude_groups: cli.exclude_aws_asg_resources,
            };
            let summary = scale_down(&cluster, &fleet, &store, &parameters, &request).await?;
            print_success(&format!("scale-down complete: {summary}"));
        }
        Action::ScaleUp => {
            if cli.k8s_resources.is_some()
                || cli.exclude_k8s_resources.is_some()
                || cli.aws_asg_resources.is_some()
                || cli.exclude_aws_asg_resources.is_some()
            {
                print_warning("selection flags only apply to scale-down and are ignored");
            }
            let summary = scale_up(&cluster, &fleet, &store, &parameters).await?;
            print_success(&format!("scale-up complete: {summary}"));
        }
    }

    Ok(())
}
