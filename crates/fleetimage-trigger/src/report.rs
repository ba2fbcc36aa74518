//! Run report — what one pipeline run did.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use fleetimage_core::{ImageReference, UpdateOutcome};
use fleetimage_resolver::Resolution;
use fleetimage_updater::{GroupUpdate, UpdateReport};

/// A skipped or failed item and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub subject: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Target scaling groups, including repeats.
    pub targets: usize,
    /// Distinct launch configurations touched.
    pub launch_configurations: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub parameter: String,
    pub image: ImageReference,
    pub dry_run: bool,
    pub targets: Vec<String>,
    pub launch_configurations: BTreeMap<String, UpdateOutcome>,
    pub groups: Vec<GroupUpdate>,
    pub skipped: Vec<ReportEntry>,
    pub failed: Vec<ReportEntry>,
    pub summary: Summary,
}

impl RunReport {
    pub fn new(
        parameter: &str,
        image: ImageReference,
        resolution: &Resolution,
        update: UpdateReport,
    ) -> Self {
        let mut skipped: Vec<ReportEntry> = resolution
            .skipped
            .iter()
            .map(|s| ReportEntry {
                subject: format!("deployment group {}", s.deployment_group),
                reason: s.reason.to_string(),
            })
            .collect();
        skipped.extend(
            update
                .groups
                .iter()
                .filter(|g| g.outcome.is_skipped())
                .map(|g| ReportEntry {
                    subject: format!(
                        "scaling group {} ({})",
                        g.scaling_group, g.launch_configuration_id
                    ),
                    reason: g.outcome.to_string(),
                }),
        );

        let mut failed: Vec<ReportEntry> = resolution
            .failures
            .iter()
            .map(|f| ReportEntry {
                subject: format!(
                    "scaling group {} of {}",
                    f.scaling_group, f.deployment_group
                ),
                reason: f.reason.clone(),
            })
            .collect();
        failed.extend(update.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            UpdateOutcome::Failed(reason) => Some(ReportEntry {
                subject: format!("launch configuration {id}"),
                reason: reason.clone(),
            }),
            _ => None,
        }));

        let summary = Summary {
            targets: resolution.targets.len(),
            launch_configurations: update.outcomes.len(),
            updated: update.updated(),
            skipped: skipped.len(),
            failed: failed.len(),
        };

        Self {
            parameter: parameter.to_string(),
            image,
            dry_run: update.dry_run,
            targets: resolution.targets.iter().map(|g| g.name.clone()).collect(),
            launch_configurations: update.outcomes,
            groups: update.groups,
            skipped,
            failed,
            summary,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// Human-readable rendering.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "image {} (snapshot {}) from parameter {}{}",
            self.image.image_id,
            self.image.root_snapshot_id,
            self.parameter,
            if self.dry_run { " [dry run]" } else { "" }
        );
        let _ = writeln!(out, "targets: {}", self.targets.join(", "));
        let _ = writeln!(out);

        for (id, outcome) in &self.launch_configurations {
            let _ = writeln!(out, "  {id:<24} {outcome}");
        }
        if !self.skipped.is_empty() {
            let _ = writeln!(out, "\nskipped:");
            for entry in &self.skipped {
                let _ = writeln!(out, "  {}: {}", entry.subject, entry.reason);
            }
        }
        if !self.failed.is_empty() {
            let _ = writeln!(out, "\nfailed:");
            for entry in &self.failed {
                let _ = writeln!(out, "  {}: {}", entry.subject, entry.reason);
            }
        }

        let s = &self.summary;
        let _ = writeln!(
            out,
            "\n{} targets, {} launch configurations: {} updated, {} skipped, {} failed",
            s.targets, s.launch_configurations, s.updated, s.skipped, s.failed
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetimage_core::ScalingGroup;
    use fleetimage_resolver::{LookupFailure, ResolveSkip, SkipReason};

    fn sample() -> RunReport {
        let resolution = Resolution {
            targets: vec![
                ScalingGroup {
                    name: "asg1".into(),
                    launch_configuration_id: "lc1".into(),
                },
                ScalingGroup {
                    name: "asg2".into(),
                    launch_configuration_id: "lc1".into(),
                },
            ],
            skipped: vec![ResolveSkip {
                deployment_group: "app1/dg3".into(),
                reason: SkipReason::NoScalingGroup,
            }],
            failures: vec![LookupFailure {
                deployment_group: "app1/dg4".into(),
                scaling_group: "asg4".into(),
                reason: "throttled".into(),
            }],
            applications: 1,
            deployment_groups: 4,
        };
        let mut update = UpdateReport::default();
        update.outcomes.insert("lc1".into(), UpdateOutcome::Updated);
        update.groups = vec![
            GroupUpdate {
                scaling_group: "asg1".into(),
                launch_configuration_id: "lc1".into(),
                outcome: UpdateOutcome::Updated,
            },
            GroupUpdate {
                scaling_group: "asg2".into(),
                launch_configuration_id: "lc1".into(),
                outcome: UpdateOutcome::SkippedAlreadyUpdated,
            },
        ];
        RunReport::new(
            "golden-ami",
            ImageReference {
                image_id: "ami-123".into(),
                root_snapshot_id: "snap-123".into(),
            },
            &resolution,
            update,
        )
    }

    #[test]
    fn summary_counts_skips_and_failures() {
        let report = sample();
        assert_eq!(
            report.summary,
            Summary {
                targets: 2,
                launch_configurations: 1,
                updated: 1,
                skipped: 2,
                failed: 1,
            }
        );
        assert!(report.has_failures());
    }

    #[test]
    fn text_lists_outcomes() {
        let text = sample().render_text();
        assert!(text.contains("ami-123"));
        assert!(text.contains("targets: asg1, asg2"));
        assert!(text.contains("scaling group asg4 of app1/dg4: throttled"));
        assert!(text.contains("1 updated, 2 skipped, 1 failed"));
    }

    #[test]
    fn json_has_summary() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["summary"]["updated"], 1);
        assert_eq!(json["launch_configurations"]["lc1"]["status"], "updated");
    }
}
