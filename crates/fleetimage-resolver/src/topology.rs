//! Topology resolver — finds the scaling groups a new image should reach.
//!
//! Walks applications → deployment groups → scaling groups. Only server
//! platform groups with a staged deployment strategy are followed. The
//! walk is strictly sequential, in the order the catalog enumerates.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use fleetimage_core::{
    ApplicationName, ComputePlatform, DeploymentCatalog, DeploymentGroup, DeploymentStrategy,
    ScalingGroup, ScalingGroups,
};

use crate::error::{ResolveError, ResolveResult};

/// Why a deployment group contributed no target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Not a server-platform, staged deployment group.
    Ineligible {
        compute_platform: ComputePlatform,
        strategy: DeploymentStrategy,
    },
    /// Eligible, but no scaling group is attached.
    NoScalingGroup,
    /// The referenced scaling group does not exist.
    ScalingGroupNotFound { scaling_group: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ineligible {
                compute_platform,
                strategy,
            } => write!(f, "ineligible ({compute_platform:?}, {strategy:?})"),
            Self::NoScalingGroup => f.write_str("no scaling group attached"),
            Self::ScalingGroupNotFound { scaling_group } => {
                write!(f, "scaling group {scaling_group} not found")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveSkip {
    /// `{application}/{group}`.
    pub deployment_group: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A recoverable scaling-group lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupFailure {
    pub deployment_group: String,
    pub scaling_group: String,
    pub reason: String,
}

/// Output of a successful resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Target scaling groups in discovery order. May contain duplicates
    /// when several deployment groups share a scaling group.
    pub targets: Vec<ScalingGroup>,
    pub skipped: Vec<ResolveSkip>,
    pub failures: Vec<LookupFailure>,
    pub applications: usize,
    pub deployment_groups: usize,
}

impl Resolution {
    /// Target names in discovery order.
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|g| g.name.as_str()).collect()
    }
}

/// Resolves target scaling groups from the deployment topology.
#[derive(Clone)]
pub struct TopologyResolver {
    deployments: Arc<dyn DeploymentCatalog>,
    scaling: Arc<dyn ScalingGroups>,
}

impl TopologyResolver {
    pub fn new(deployments: Arc<dyn DeploymentCatalog>, scaling: Arc<dyn ScalingGroups>) -> Self {
        Self {
            deployments,
            scaling,
        }
    }

    /// Resolve every eligible scaling group.
    ///
    /// Enumeration failures abort; a single scaling-group lookup failure
    /// is recorded and skipped. An empty result is `NoTargetsFound`.
    pub async fn resolve(&self) -> ResolveResult<Resolution> {
        let applications = self.application_names().await?;
        info!(count = applications.len(), "enumerated applications");

        let mut resolution = Resolution {
            applications: applications.len(),
            ..Default::default()
        };

        for application in &applications {
            self.resolve_application(application, &mut resolution).await?;
        }

        if resolution.targets.is_empty() {
            warn!(
                applications = resolution.applications,
                deployment_groups = resolution.deployment_groups,
                "no target scaling groups"
            );
            return Err(ResolveError::NoTargetsFound {
                applications: resolution.applications,
                skipped: resolution.skipped.len(),
                failed: resolution.failures.len(),
            });
        }

        info!(
            targets = ?resolution.target_names(),
            skipped = resolution.skipped.len(),
            failed = resolution.failures.len(),
            "resolved target scaling groups"
        );
        Ok(resolution)
    }

    /// Exhaust the application cursor. Any page failure is fatal: a
    /// missed application means missed targets. A cursor the catalog has
    /// already handed out ends the walk with an error.
    async fn application_names(&self) -> ResolveResult<Vec<ApplicationName>> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .deployments
                .list_applications(cursor.as_deref())
                .await
                .map_err(ResolveError::ListApplications)?;
            debug!(
                page = page.applications.len(),
                more = page.next_cursor.is_some(),
                "application page"
            );
            names.extend(page.applications);
            match page.next_cursor {
                Some(next) if !seen.insert(next.clone()) => {
                    warn!(cursor = %next, "application cursor repeated");
                    return Err(ResolveError::RepeatedCursor { cursor: next });
                }
                Some(next) => cursor = Some(next),
                None => return Ok(names),
            }
        }
    }

    async fn resolve_application(
        &self,
        application: &str,
        resolution: &mut Resolution,
    ) -> ResolveResult<()> {
        let groups = self
            .deployments
            .list_deployment_groups(application)
            .await
            .map_err(|source| ResolveError::ListDeploymentGroups {
                application: application.to_string(),
                source,
            })?;
        debug!(%application, count = groups.len(), "listed deployment groups");

        for name in &groups {
            let group = self
                .deployments
                .get_deployment_group(application, name)
                .await
                .map_err(|source| ResolveError::GetDeploymentGroup {
                    application: application.to_string(),
                    group: name.clone(),
                    source,
                })?;
            resolution.deployment_groups += 1;
            self.resolve_group(&group, resolution).await;
        }
        Ok(())
    }

    async fn resolve_group(&self, group: &DeploymentGroup, resolution: &mut Resolution) {
        let qualified = group.qualified_name();

        if !group.is_eligible() {
            debug!(
                deployment_group = %qualified,
                platform = ?group.compute_platform,
                strategy = ?group.strategy,
                "excluded by eligibility filter"
            );
            resolution.skipped.push(ResolveSkip {
                deployment_group: qualified,
                reason: SkipReason::Ineligible {
                    compute_platform: group.compute_platform,
                    strategy: group.strategy,
                },
            });
            return;
        }

        let Some(scaling_group) = group.primary_scaling_group() else {
            info!(deployment_group = %qualified, "no scaling group attached, skipping");
            resolution.skipped.push(ResolveSkip {
                deployment_group: qualified,
                reason: SkipReason::NoScalingGroup,
            });
            return;
        };

        if group.scaling_groups.len() > 1 {
            debug!(
                deployment_group = %qualified,
                count = group.scaling_groups.len(),
                "using first of several scaling groups"
            );
        }

        match self
            .scaling
            .describe_scaling_groups(&[scaling_group.to_string()])
            .await
        {
            Ok(found) if found.is_empty() => {
                warn!(deployment_group = %qualified, %scaling_group, "scaling group not found");
                resolution.skipped.push(ResolveSkip {
                    deployment_group: qualified,
                    reason: SkipReason::ScalingGroupNotFound {
                        scaling_group: scaling_group.to_string(),
                    },
                });
            }
            Ok(found) => {
                debug!(deployment_group = %qualified, %scaling_group, "target scaling group");
                resolution.targets.extend(found);
            }
            Err(e) => {
                warn!(
                    deployment_group = %qualified,
                    %scaling_group,
                    error = %e,
                    "scaling group lookup failed, continuing"
                );
                resolution.failures.push(LookupFailure {
                    deployment_group: qualified,
                    scaling_group: scaling_group.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
