//! SimulatedFleet — in-memory implementation of every capability.
//!
//! Launch configuration versions are append-only, exactly like the real
//! service: `create_version` pushes a new entry onto the history and never
//! touches earlier ones. Every call is recorded so tests can assert on
//! what the pipeline actually asked for.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use fleetimage_core::*;

use crate::fixture::{Fault, FixtureError, FleetFixture, Operation};

/// A recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub target: String,
}

struct FleetState {
    fixture: FleetFixture,
    /// Launch configuration id → versions, oldest first.
    versions: HashMap<String, Vec<LaunchConfigurationVersion>>,
    calls: Vec<Call>,
}

impl FleetState {
    /// Record the call, then fail it if a fault matches.
    fn enter(&mut self, operation: Operation, target: &str) -> CapabilityResult<()> {
        self.calls.push(Call {
            operation,
            target: target.to_string(),
        });
        debug!(operation = operation.as_str(), resource = %target, "simulated call");
        let Some(index) = self
            .fixture
            .faults
            .iter()
            .position(|f| f.matches(operation, target))
        else {
            return Ok(());
        };

        let fault = &mut self.fixture.faults[index];
        let message = fault
            .message
            .clone()
            .unwrap_or_else(|| format!("injected fault for {target}"));
        if let Some(remaining) = fault.times.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.fixture.faults.remove(index);
            }
        }
        Err(CapabilityError::service(operation.as_str(), message))
    }
}

/// Thread-safe simulated fleet, cheap to clone.
#[derive(Clone)]
pub struct SimulatedFleet {
    inner: Arc<Mutex<FleetState>>,
}

impl SimulatedFleet {
    pub fn new(fixture: FleetFixture) -> Self {
        let mut versions: HashMap<String, Vec<LaunchConfigurationVersion>> = HashMap::new();
        for version in &fixture.launch_configurations {
            versions
                .entry(version.launch_configuration_id.clone())
                .or_default()
                .push(version.clone());
        }
        for history in versions.values_mut() {
            history.sort_by_key(|v| v.version_number);
        }
        Self {
            inner: Arc::new(Mutex::new(FleetState {
                fixture,
                versions,
                calls: Vec::new(),
            })),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        Ok(Self::new(FleetFixture::from_file(path)?))
    }

    /// Add a fault after construction.
    pub async fn inject_fault(&self, fault: Fault) {
        self.inner.lock().await.fixture.faults.push(fault);
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<Call> {
        self.inner.lock().await.calls.clone()
    }

    /// Targets of every call to `operation`, in order.
    pub async fn calls_to(&self, operation: Operation) -> Vec<String> {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.target.clone())
            .collect()
    }

    /// Version history of a launch configuration, oldest first.
    pub async fn versions(&self, id: &str) -> Vec<LaunchConfigurationVersion> {
        self.inner
            .lock()
            .await
            .versions
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeploymentCatalog for SimulatedFleet {
    async fn list_applications(&self, cursor: Option<&str>) -> CapabilityResult<ApplicationPage> {
        let mut state = self.inner.lock().await;
        state.enter(Operation::ListApplications, cursor.unwrap_or(""))?;

        let start = match cursor {
            Some(c) => c.parse::<usize>().map_err(|_| {
                CapabilityError::invalid_request("list_applications", format!("bad cursor {c}"))
            })?,
            None => 0,
        };
        let total = state.fixture.applications.len();
        let end = (start + state.fixture.page_size.max(1)).min(total);
        let applications = state
            .fixture
            .applications
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|a| a.name.clone())
            .collect();
        let next_cursor = (end < total).then(|| end.to_string());
        Ok(ApplicationPage {
            applications,
            next_cursor,
        })
    }

    async fn list_deployment_groups(&self, application: &str) -> CapabilityResult<Vec<String>> {
        let mut state = self.inner.lock().await;
        state.enter(Operation::ListDeploymentGroups, application)?;
        state
            .fixture
            .applications
            .iter()
            .find(|a| a.name == application)
            .map(|a| a.deployment_groups.iter().map(|g| g.name.clone()).collect())
            .ok_or_else(|| CapabilityError::not_found("list_deployment_groups", application))
    }

    async fn get_deployment_group(
        &self,
        application: &str,
        group: &str,
    ) -> CapabilityResult<DeploymentGroup> {
        let key = format!("{application}/{group}");
        let mut state = self.inner.lock().await;
        state.enter(Operation::GetDeploymentGroup, &key)?;
        state
            .fixture
            .applications
            .iter()
            .find(|a| a.name == application)
            .and_then(|a| a.deployment_groups.iter().find(|g| g.name == group))
            .map(|g| DeploymentGroup {
                application: application.to_string(),
                name: g.name.clone(),
                compute_platform: g.compute_platform,
                strategy: g.strategy,
                scaling_groups: g.scaling_groups.clone(),
            })
            .ok_or_else(|| CapabilityError::not_found("get_deployment_group", key))
    }
}

#[async_trait]
impl ScalingGroups for SimulatedFleet {
    async fn describe_scaling_groups(
        &self,
        names: &[String],
    ) -> CapabilityResult<Vec<ScalingGroup>> {
        let mut state = self.inner.lock().await;
        for name in names {
            state.enter(Operation::DescribeScalingGroups, name)?;
        }
        Ok(names
            .iter()
            .filter_map(|n| state.fixture.scaling_groups.iter().find(|g| &g.name == n))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MachineImages for SimulatedFleet {
    async fn describe_image(&self, image_id: &str) -> CapabilityResult<MachineImage> {
        let mut state = self.inner.lock().await;
        state.enter(Operation::DescribeImage, image_id)?;
        state
            .fixture
            .images
            .iter()
            .find(|i| i.image_id == image_id)
            .cloned()
            .ok_or_else(|| CapabilityError::not_found("describe_image", image_id))
    }
}

#[async_trait]
impl LaunchConfigurations for SimulatedFleet {
    async fn latest_version(&self, id: &str) -> CapabilityResult<LaunchConfigurationVersion> {
        let mut state = self.inner.lock().await;
        state.enter(Operation::LatestVersion, id)?;
        state
            .versions
            .get(id)
            .and_then(|history| history.last())
            .cloned()
            .ok_or_else(|| CapabilityError::not_found("latest_version", id))
    }

    async fn create_version(&self, request: &CreateVersionRequest) -> CapabilityResult<u64> {
        let id = request.launch_configuration_id.as_str();
        let mut state = self.inner.lock().await;
        state.enter(Operation::CreateVersion, id)?;

        let history = state
            .versions
            .get_mut(id)
            .ok_or_else(|| CapabilityError::not_found("create_version", id))?;
        let source = match request.source_version.as_str() {
            fleetimage_core::config::LATEST_VERSION => history.last(),
            number => {
                let number: u64 = number.parse().map_err(|_| {
                    CapabilityError::invalid_request(
                        "create_version",
                        format!("bad source version {number}"),
                    )
                })?;
                history.iter().find(|v| v.version_number == number)
            }
        }
        .ok_or_else(|| {
            CapabilityError::not_found(
                "create_version",
                format!("{id} version {}", request.source_version),
            )
        })?;

        let next = history.last().map_or(1, |v| v.version_number + 1);
        let version = LaunchConfigurationVersion {
            launch_configuration_id: id.to_string(),
            version_number: next,
            image_id: Some(request.image_id.clone()),
            device_mappings: if request.device_mappings.is_empty() {
                source.device_mappings.clone()
            } else {
                request.device_mappings.clone()
            },
        };

        if request.dry_run {
            debug!(launch_configuration = %id, version = next, "dry run, version not stored");
        } else {
            history.push(version);
        }
        Ok(next)
    }
}

#[async_trait]
impl ParameterStore for SimulatedFleet {
    async fn get_parameter(&self, name: &str) -> CapabilityResult<String> {
        let mut state = self.inner.lock().await;
        state.enter(Operation::GetParameter, name)?;
        state
            .fixture
            .parameters
            .get(name)
            .cloned()
            .ok_or_else(|| CapabilityError::not_found("get_parameter", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DeploymentGroupFixture;

    fn version(id: &str, number: u64) -> LaunchConfigurationVersion {
        LaunchConfigurationVersion {
            launch_configuration_id: id.to_string(),
            version_number: number,
            image_id: Some("ami-old".to_string()),
            device_mappings: vec![DeviceMapping {
                device_name: "/dev/xvda".to_string(),
                snapshot_id: Some(format!("snap-{number}")),
                volume_size: Some(30),
                ..Default::default()
            }],
        }
    }

    fn request(id: &str, dry_run: bool) -> CreateVersionRequest {
        CreateVersionRequest {
            launch_configuration_id: id.to_string(),
            source_version: "$Latest".to_string(),
            image_id: "ami-new".to_string(),
            device_mappings: Vec::new(),
            dry_run,
        }
    }

    #[tokio::test]
    async fn pages_applications_until_exhausted() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default()
                .with_page_size(2)
                .with_application("a", Vec::new())
                .with_application("b", Vec::new())
                .with_application("c", Vec::new()),
        );

        let first = fleet.list_applications(None).await.unwrap();
        assert_eq!(first.applications, vec!["a", "b"]);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let second = fleet.list_applications(first.next_cursor.as_deref()).await.unwrap();
        assert_eq!(second.applications, vec!["c"]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn deployment_group_carries_application() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default()
                .with_application("app1", vec![DeploymentGroupFixture::staged("dg1", "asg1")]),
        );
        assert_eq!(fleet.list_deployment_groups("app1").await.unwrap(), vec!["dg1"]);

        let group = fleet.get_deployment_group("app1", "dg1").await.unwrap();
        assert_eq!(group.qualified_name(), "app1/dg1");
        assert!(group.is_eligible());

        let err = fleet.get_deployment_group("app1", "nope").await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound { .. }));
    }

    #[tokio::test]
    async fn describe_omits_unknown_groups() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default()
                .with_launch_configuration(version("lt-1", 1))
                .with_scaling_group("asg1", "lt-1"),
        );
        let found = fleet
            .describe_scaling_groups(&["asg1".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].launch_configuration_id, "lt-1");
    }

    #[tokio::test]
    async fn create_version_appends_and_latest_follows() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default()
                .with_launch_configuration(version("lt-1", 2))
                .with_launch_configuration(version("lt-1", 1)),
        );
        assert_eq!(fleet.latest_version("lt-1").await.unwrap().version_number, 2);

        let created = fleet.create_version(&request("lt-1", false)).await.unwrap();
        assert_eq!(created, 3);

        let latest = fleet.latest_version("lt-1").await.unwrap();
        assert_eq!(latest.version_number, 3);
        assert_eq!(latest.image_id.as_deref(), Some("ami-new"));
        // Empty mapping block inherits from the source version.
        assert_eq!(latest.device_mappings, version("lt-1", 2).device_mappings);
        assert_eq!(fleet.versions("lt-1").await.len(), 3);
    }

    #[tokio::test]
    async fn dry_run_stores_nothing() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default().with_launch_configuration(version("lt-1", 1)),
        );
        let would_be = fleet.create_version(&request("lt-1", true)).await.unwrap();
        assert_eq!(would_be, 2);
        assert_eq!(fleet.versions("lt-1").await.len(), 1);
    }

    #[tokio::test]
    async fn faults_fail_calls_and_calls_are_recorded() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default()
                .with_parameter("golden-ami", "ami-123")
                .with_fault(Fault::new(Operation::GetParameter, "broken")),
        );
        assert_eq!(fleet.get_parameter("golden-ami").await.unwrap(), "ami-123");
        let err = fleet.get_parameter("broken").await.unwrap_err();
        assert_eq!(err.operation(), "get_parameter");

        assert_eq!(
            fleet.calls_to(Operation::GetParameter).await,
            vec!["golden-ami", "broken"]
        );
    }

    #[tokio::test]
    async fn one_shot_fault_clears_after_first_call() {
        let fleet = SimulatedFleet::new(
            FleetFixture::default()
                .with_launch_configuration(version("lt-1", 1))
                .with_fault(Fault::new(Operation::LatestVersion, "lt-1").once()),
        );
        assert!(fleet.latest_version("lt-1").await.is_err());
        assert_eq!(fleet.latest_version("lt-1").await.unwrap().version_number, 1);
    }
}
