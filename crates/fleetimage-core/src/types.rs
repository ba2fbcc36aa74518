//! Domain types for the deployment topology and launch configurations.
//!
//! These mirror the records returned by the deployment-management,
//! scaling-group, compute-image, and launch-configuration services. All
//! types are serializable so the simulated fleet can load them from JSON
//! fixtures and the run report can echo them back.

use serde::{Deserialize, Serialize};

/// Name of an application in the deployment-management service.
pub type ApplicationName = String;

/// Identifier of a launch configuration (launch template).
pub type LaunchConfigurationId = String;

// ── Deployment topology ────────────────────────────────────────────

/// Compute platform a deployment group targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputePlatform {
    /// EC2/on-premises instances.
    Server,
    Lambda,
    Ecs,
}

/// How a deployment group rolls out new releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStrategy {
    /// Upgrade the existing instances.
    InPlace,
    /// Provision a parallel instance set, then cut traffic over.
    #[serde(alias = "blue_green")]
    Staged,
}

/// A deployment group as returned by `get_deployment_group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentGroup {
    pub application: ApplicationName,
    pub name: String,
    pub compute_platform: ComputePlatform,
    pub strategy: DeploymentStrategy,
    /// Scaling-group names attached to this deployment group.
    #[serde(default)]
    pub scaling_groups: Vec<String>,
}

impl DeploymentGroup {
    /// Whether this group takes part in image rollouts: server platform
    /// with a staged deployment strategy.
    pub fn is_eligible(&self) -> bool {
        self.compute_platform == ComputePlatform::Server
            && self.strategy == DeploymentStrategy::Staged
    }

    /// The scaling group a staged deployment provisions from. Only the
    /// first reference is used.
    pub fn primary_scaling_group(&self) -> Option<&str> {
        self.scaling_groups.first().map(String::as_str)
    }

    /// `{application}/{name}`, used in logs and reports.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.application, self.name)
    }
}

/// One page of application names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationPage {
    pub applications: Vec<ApplicationName>,
    /// Cursor for the next page; `None` once enumeration is exhausted.
    pub next_cursor: Option<String>,
}

/// A scaling group and the launch configuration it provisions from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingGroup {
    pub name: String,
    pub launch_configuration_id: LaunchConfigurationId,
}

// ── Launch configurations ──────────────────────────────────────────

/// A block-device mapping entry of a launch configuration or image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMapping {
    /// Device name (e.g. `/dev/xvda`).
    pub device_name: String,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub encrypted: Option<bool>,
    #[serde(default)]
    pub delete_on_termination: Option<bool>,
    #[serde(default)]
    pub iops: Option<u32>,
    /// Throughput in MiB/s.
    #[serde(default)]
    pub throughput: Option<u32>,
    /// Volume size in GiB.
    #[serde(default)]
    pub volume_size: Option<u32>,
    #[serde(default)]
    pub volume_type: Option<String>,
}

impl DeviceMapping {
    /// Copy of this entry pointing at a different snapshot. Every other
    /// attribute is kept as-is.
    pub fn with_snapshot(&self, snapshot_id: &str) -> Self {
        Self {
            snapshot_id: Some(snapshot_id.to_string()),
            ..self.clone()
        }
    }
}

/// A single version of a launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfigurationVersion {
    pub launch_configuration_id: LaunchConfigurationId,
    pub version_number: u64,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub device_mappings: Vec<DeviceMapping>,
}

/// Request to append a new launch configuration version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVersionRequest {
    pub launch_configuration_id: LaunchConfigurationId,
    /// Version the new one inherits unspecified attributes from.
    pub source_version: String,
    pub image_id: String,
    /// Full mapping block; the service does not merge partial mappings.
    pub device_mappings: Vec<DeviceMapping>,
    /// Validate the request without creating a version.
    pub dry_run: bool,
}

// ── Images ─────────────────────────────────────────────────────────

/// A machine image as returned by `describe_image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    pub image_id: String,
    #[serde(default)]
    pub device_mappings: Vec<DeviceMapping>,
}

impl MachineImage {
    /// Snapshot backing the root (first) device, if any.
    pub fn root_snapshot_id(&self) -> Option<&str> {
        self.device_mappings
            .first()
            .and_then(|m| m.snapshot_id.as_deref())
    }
}

/// The image a run propagates, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub image_id: String,
    pub root_snapshot_id: String,
}

// ── Outcomes ───────────────────────────────────────────────────────

/// Result of processing one launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated,
    SkippedAlreadyUpdated,
    SkippedNoDeviceMapping,
    Failed(String),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::SkippedAlreadyUpdated | Self::SkippedNoDeviceMapping
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl std::fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Updated => f.write_str("updated"),
            Self::SkippedAlreadyUpdated => f.write_str("skipped: already updated this run"),
            Self::SkippedNoDeviceMapping => f.write_str("skipped: no device mappings"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
