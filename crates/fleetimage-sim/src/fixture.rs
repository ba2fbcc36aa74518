//! JSON fixture describing a simulated fleet.
//!
//! ```json
//! {
//!   "page_size": 100,
//!   "applications": [
//!     { "name": "app1", "deployment_groups": [
//!       { "name": "dg1", "compute_platform": "server",
//!         "strategy": "staged", "scaling_groups": ["asg1"] } ] }
//!   ],
//!   "scaling_groups": [{ "name": "asg1", "launch_configuration_id": "lt-1" }],
//!   "launch_configurations": [{ "launch_configuration_id": "lt-1",
//!     "version_number": 1, "image_id": "ami-old", "device_mappings": [] }],
//!   "images": [{ "image_id": "ami-new", "device_mappings": [] }],
//!   "parameters": { "golden-ami": "ami-new" },
//!   "faults": [{ "operation": "describe_scaling_groups", "target": "asg1" }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleetimage_core::{
    ComputePlatform, DeploymentStrategy, LaunchConfigurationVersion, MachineImage, ScalingGroup,
};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid fixture: {0}")]
    Invalid(String),
}

/// Capability operations of the simulated fleet, used for fault injection
/// and the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListApplications,
    ListDeploymentGroups,
    GetDeploymentGroup,
    DescribeScalingGroups,
    DescribeImage,
    LatestVersion,
    CreateVersion,
    GetParameter,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListApplications => "list_applications",
            Self::ListDeploymentGroups => "list_deployment_groups",
            Self::GetDeploymentGroup => "get_deployment_group",
            Self::DescribeScalingGroups => "describe_scaling_groups",
            Self::DescribeImage => "describe_image",
            Self::LatestVersion => "latest_version",
            Self::CreateVersion => "create_version",
            Self::GetParameter => "get_parameter",
        }
    }
}

/// An injected failure. A fault with no target fails every call of its
/// operation.
///
/// Targets per operation: the cursor for `list_applications` (`""` for the
/// first page), the application for `list_deployment_groups`,
/// `{application}/{group}` for `get_deployment_group`, any requested name
/// for `describe_scaling_groups`, the image id, the launch configuration id,
/// or the parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub operation: Operation,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Number of matching calls to fail before the fault clears. `None`
    /// fails every matching call.
    #[serde(default)]
    pub times: Option<u32>,
}

impl Fault {
    pub fn new(operation: Operation, target: impl Into<String>) -> Self {
        Self {
            operation,
            target: Some(target.into()),
            message: None,
            times: None,
        }
    }

    /// Fail only the first matching call.
    pub fn once(mut self) -> Self {
        self.times = Some(1);
        self
    }

    pub fn matches(&self, operation: Operation, target: &str) -> bool {
        self.operation == operation && self.target.as_deref().is_none_or(|t| t == target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationFixture {
    pub name: String,
    #[serde(default)]
    pub deployment_groups: Vec<DeploymentGroupFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentGroupFixture {
    pub name: String,
    pub compute_platform: ComputePlatform,
    pub strategy: DeploymentStrategy,
    #[serde(default)]
    pub scaling_groups: Vec<String>,
}

impl DeploymentGroupFixture {
    /// A server-platform, staged group attached to `scaling_group`.
    pub fn staged(name: &str, scaling_group: &str) -> Self {
        Self {
            name: name.to_string(),
            compute_platform: ComputePlatform::Server,
            strategy: DeploymentStrategy::Staged,
            scaling_groups: vec![scaling_group.to_string()],
        }
    }

    pub fn new(
        name: &str,
        compute_platform: ComputePlatform,
        strategy: DeploymentStrategy,
    ) -> Self {
        Self {
            name: name.to_string(),
            compute_platform,
            strategy,
            scaling_groups: Vec::new(),
        }
    }
}

fn default_page_size() -> usize {
    100
}

/// Full contents of a simulated fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetFixture {
    /// Applications returned per `list_applications` page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub applications: Vec<ApplicationFixture>,
    #[serde(default)]
    pub scaling_groups: Vec<ScalingGroup>,
    /// Version history of every launch configuration.
    #[serde(default)]
    pub launch_configurations: Vec<LaunchConfigurationVersion>,
    #[serde(default)]
    pub images: Vec<MachineImage>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    #[serde(default)]
    pub faults: Vec<Fault>,
}

impl Default for FleetFixture {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            applications: Vec::new(),
            scaling_groups: Vec::new(),
            launch_configurations: Vec::new(),
            images: Vec::new(),
            parameters: HashMap::new(),
            faults: Vec::new(),
        }
    }
}

impl FleetFixture {
    pub fn from_json(content: &str) -> Result<Self, FixtureError> {
        let fixture: Self = serde_json::from_str(content)?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), FixtureError> {
        if self.page_size == 0 {
            return Err(FixtureError::Invalid("page_size must be at least 1".into()));
        }
        for group in &self.scaling_groups {
            let known = self
                .launch_configurations
                .iter()
                .any(|v| v.launch_configuration_id == group.launch_configuration_id);
            if !known {
                return Err(FixtureError::Invalid(format!(
                    "scaling group {} references unknown launch configuration {}",
                    group.name, group.launch_configuration_id
                )));
            }
        }
        Ok(())
    }

    /// Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_application(
        mut self,
        name: &str,
        deployment_groups: Vec<DeploymentGroupFixture>,
    ) -> Self {
        self.applications.push(ApplicationFixture {
            name: name.to_string(),
            deployment_groups,
        });
        self
    }

    pub fn with_scaling_group(mut self, name: &str, launch_configuration_id: &str) -> Self {
        self.scaling_groups.push(ScalingGroup {
            name: name.to_string(),
            launch_configuration_id: launch_configuration_id.to_string(),
        });
        self
    }

    pub fn with_launch_configuration(mut self, version: LaunchConfigurationVersion) -> Self {
        self.launch_configurations.push(version);
        self
    }

    pub fn with_image(mut self, image: MachineImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }
}
