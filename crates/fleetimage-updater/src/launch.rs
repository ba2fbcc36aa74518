//! Launch configuration updater.
//!
//! For each target scaling group, reads the latest version of its launch
//! configuration and appends a new version booting the new image. The
//! device mappings of the latest version are carried over in full; only
//! the root device's snapshot changes. A launch configuration shared by
//! several groups gets at most one new version per run; one whose attempt
//! did not succeed is tried again for the next group that shares it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use fleetimage_core::config::{LATEST_VERSION, UpdateConfig};
use fleetimage_core::{
    CreateVersionRequest, DeviceMapping, ImageReference, LaunchConfigurationId,
    LaunchConfigurations, ScalingGroup, UpdateOutcome,
};

/// Knobs for version creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Version new versions inherit unspecified attributes from.
    pub source_version: String,
    pub dry_run: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            source_version: LATEST_VERSION.to_string(),
            dry_run: false,
        }
    }
}

impl From<&UpdateConfig> for UpdateOptions {
    fn from(config: &UpdateConfig) -> Self {
        Self {
            source_version: config.source_version.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// What happened to one scaling group's launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupUpdate {
    pub scaling_group: String,
    pub launch_configuration_id: LaunchConfigurationId,
    pub outcome: UpdateOutcome,
}

/// Result of one updater pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// One entry per distinct launch configuration, holding its latest
    /// outcome this run.
    pub outcomes: BTreeMap<LaunchConfigurationId, UpdateOutcome>,
    /// Version numbers created (or, in a dry run, that would be created).
    pub created_versions: BTreeMap<LaunchConfigurationId, u64>,
    /// One entry per input scaling group, in input order.
    pub groups: Vec<GroupUpdate>,
    pub dry_run: bool,
}

impl UpdateReport {
    pub fn updated(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_updated()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failed()).count()
    }
}

/// Writes new launch configuration versions for a set of scaling groups.
#[derive(Clone)]
pub struct LaunchConfigurationUpdater {
    client: Arc<dyn LaunchConfigurations>,
    options: UpdateOptions,
}

impl LaunchConfigurationUpdater {
    pub fn new(client: Arc<dyn LaunchConfigurations>, options: UpdateOptions) -> Self {
        Self { client, options }
    }

    /// Point every group's launch configuration at `image`.
    ///
    /// Failures are recorded per launch configuration and never stop the
    /// remaining groups.
    pub async fn update(&self, groups: &[ScalingGroup], image: &ImageReference) -> UpdateReport {
        let mut report = UpdateReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for group in groups {
            let id = &group.launch_configuration_id;

            let outcome = if report.outcomes.get(id) == Some(&UpdateOutcome::Updated) {
                info!(
                    scaling_group = %group.name,
                    launch_configuration = %id,
                    "launch configuration already updated this run, skipping"
                );
                UpdateOutcome::SkippedAlreadyUpdated
            } else {
                let (outcome, version) = self.update_one(id, image).await;
                if let Some(version) = version {
                    report.created_versions.insert(id.clone(), version);
                }
                report.outcomes.insert(id.clone(), outcome.clone());
                match &outcome {
                    UpdateOutcome::Updated => info!(
                        scaling_group = %group.name,
                        launch_configuration = %id,
                        version,
                        dry_run = self.options.dry_run,
                        "launch configuration updated"
                    ),
                    UpdateOutcome::Failed(reason) => warn!(
                        scaling_group = %group.name,
                        launch_configuration = %id,
                        %reason,
                        "launch configuration not updated"
                    ),
                    other => info!(
                        scaling_group = %group.name,
                        launch_configuration = %id,
                        outcome = %other,
                        "launch configuration skipped"
                    ),
                }
                outcome
            };

            report.groups.push(GroupUpdate {
                scaling_group: group.name.clone(),
                launch_configuration_id: id.clone(),
                outcome,
            });
        }

        report
    }

    async fn update_one(&self, id: &str, image: &ImageReference) -> (UpdateOutcome, Option<u64>) {
        let current = match self.client.latest_version(id).await {
            Ok(v) => v,
            Err(e) => {
                return (
                    UpdateOutcome::Failed(format!("failed to read latest version: {e}")),
                    None,
                );
            }
        };

        if current.device_mappings.is_empty() {
            return (UpdateOutcome::SkippedNoDeviceMapping, None);
        }
        debug!(
            launch_configuration = %id,
            version = current.version_number,
            image = ?current.image_id,
            "read latest version"
        );

        let request = CreateVersionRequest {
            launch_configuration_id: id.to_string(),
            source_version: self.options.source_version.clone(),
            image_id: image.image_id.clone(),
            device_mappings: rewrite_device_mappings(
                &current.device_mappings,
                &image.root_snapshot_id,
            ),
            dry_run: self.options.dry_run,
        };

        match self.client.create_version(&request).await {
            Ok(version) => (UpdateOutcome::Updated, Some(version)),
            Err(e) => (
                UpdateOutcome::Failed(format!("failed to create version: {e}")),
                None,
            ),
        }
    }
}

/// The mapping block for a new version: `current` with the root (first)
/// entry's snapshot replaced by `snapshot_id`.
pub fn rewrite_device_mappings(current: &[DeviceMapping], snapshot_id: &str) -> Vec<DeviceMapping> {
    current
        .iter()
        .enumerate()
        .map(|(i, m)| if i == 0 { m.with_snapshot(snapshot_id) } else { m.clone() })
        .collect()
}
