//! Capability traits for the external services the pipeline calls through.
//!
//! Concrete transports (cloud SDK clients, the simulated fleet) implement
//! these. Every call is awaited sequentially by the pipeline; none of them
//! retry internally.

use async_trait::async_trait;

use crate::error::CapabilityResult;
use crate::types::*;

/// The deployment-management service.
#[async_trait]
pub trait DeploymentCatalog: Send + Sync {
    /// One page of application names. Pass the previous page's
    /// `next_cursor` to continue; `None` starts from the beginning.
    async fn list_applications(&self, cursor: Option<&str>) -> CapabilityResult<ApplicationPage>;

    /// Names of the deployment groups of an application.
    async fn list_deployment_groups(&self, application: &str) -> CapabilityResult<Vec<String>>;

    /// Full record of a single deployment group.
    async fn get_deployment_group(
        &self,
        application: &str,
        group: &str,
    ) -> CapabilityResult<DeploymentGroup>;
}

/// The scaling-group service.
#[async_trait]
pub trait ScalingGroups: Send + Sync {
    /// Records for the named groups. Unknown names are omitted from the
    /// result rather than reported as errors.
    async fn describe_scaling_groups(&self, names: &[String])
    -> CapabilityResult<Vec<ScalingGroup>>;
}

/// The compute-image service.
#[async_trait]
pub trait MachineImages: Send + Sync {
    async fn describe_image(&self, image_id: &str) -> CapabilityResult<MachineImage>;
}

/// The launch-configuration (launch template) service.
#[async_trait]
pub trait LaunchConfigurations: Send + Sync {
    /// The latest version of a launch configuration.
    async fn latest_version(&self, id: &str) -> CapabilityResult<LaunchConfigurationVersion>;

    /// Append a new version. Returns the new version number; a dry run
    /// returns the number the version would have had.
    async fn create_version(&self, request: &CreateVersionRequest) -> CapabilityResult<u64>;
}

/// The key-value parameter store.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get_parameter(&self, name: &str) -> CapabilityResult<String>;
}
