//! Pipeline — one stateless resolve-then-update run per notification.
//!
//! ```text
//! notification ─► ParameterChange ─► dataType check
//!                                       │
//!                 ImageResolver ◄───────┘  (parameter → image → snapshot)
//!                       │
//!                 TopologyResolver         (targets or NoTargetsFound)
//!                       │
//!                 LaunchConfigurationUpdater
//!                       │
//!                   RunReport
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};

use fleetimage_core::config::TriggerConfig;
use fleetimage_core::{
    DeploymentCatalog, FleetImageConfig, LaunchConfigurations, MachineImages, ParameterStore,
    ScalingGroups,
};
use fleetimage_resolver::{Resolution, TopologyResolver};
use fleetimage_updater::{LaunchConfigurationUpdater, UpdateOptions};

use crate::error::PipelineResult;
use crate::event::{ParameterChange, parse_notification};
use crate::image::ImageResolver;
use crate::report::RunReport;

/// Handles to every external service the pipeline calls.
#[derive(Clone)]
pub struct Capabilities {
    pub deployments: Arc<dyn DeploymentCatalog>,
    pub scaling_groups: Arc<dyn ScalingGroups>,
    pub images: Arc<dyn MachineImages>,
    pub launch_configurations: Arc<dyn LaunchConfigurations>,
    pub parameters: Arc<dyn ParameterStore>,
}

impl Capabilities {
    /// Use one backend for every capability.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: DeploymentCatalog
            + ScalingGroups
            + MachineImages
            + LaunchConfigurations
            + ParameterStore
            + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            deployments: backend.clone(),
            scaling_groups: backend.clone(),
            images: backend.clone(),
            launch_configurations: backend.clone(),
            parameters: backend,
        }
    }
}

pub struct Pipeline {
    trigger: TriggerConfig,
    images: ImageResolver,
    resolver: TopologyResolver,
    updater: LaunchConfigurationUpdater,
}

impl Pipeline {
    pub fn new(capabilities: Capabilities, config: &FleetImageConfig) -> Self {
        Self {
            trigger: config.trigger.clone(),
            images: ImageResolver::new(capabilities.parameters, capabilities.images),
            resolver: TopologyResolver::new(
                capabilities.deployments,
                capabilities.scaling_groups,
            ),
            updater: LaunchConfigurationUpdater::new(
                capabilities.launch_configurations,
                UpdateOptions::from(&config.update),
            ),
        }
    }

    /// Parse a raw notification and run it.
    pub async fn handle(&self, raw: &str) -> PipelineResult<RunReport> {
        let change = parse_notification(raw)?;
        self.run(&change).await
    }

    /// Run the pipeline for one parameter change.
    pub async fn run(&self, change: &ParameterChange) -> PipelineResult<RunReport> {
        if let Err(e) = change.ensure_data_type(&self.trigger.image_data_type) {
            info!(
                data_type = %change.data_type,
                parameter = %change.name,
                "not an image parameter, ignoring"
            );
            return Err(e);
        }

        let image = self.images.resolve(&change.name).await.inspect_err(|e| {
            error!(parameter = %change.name, error = %e, "image resolution failed");
        })?;

        let resolution = self.resolve_targets().await?;

        let update = self.updater.update(&resolution.targets, &image).await;
        let report = RunReport::new(&change.name, image, &resolution, update);

        if report.has_failures() {
            warn!(
                updated = report.summary.updated,
                failed = report.summary.failed,
                "run finished with failures"
            );
        } else {
            info!(
                updated = report.summary.updated,
                skipped = report.summary.skipped,
                "run finished"
            );
        }
        Ok(report)
    }

    /// Run only the topology resolver.
    pub async fn resolve_targets(&self) -> PipelineResult<Resolution> {
        Ok(self.resolver.resolve().await.inspect_err(|e| {
            error!(error = %e, "target resolution failed");
        })?)
    }
}
