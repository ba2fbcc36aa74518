//! End-to-end pipeline runs against a simulated fleet.

use fleetimage_core::*;
use fleetimage_resolver::ResolveError;
use fleetimage_sim::*;
use fleetimage_trigger::*;

const GOLDEN_AMI_EVENT: &str = r#"{"dataType":"aws:ec2:image","name":"golden-ami"}"#;

fn root(snapshot: &str) -> DeviceMapping {
    DeviceMapping {
        device_name: "/dev/xvda".to_string(),
        snapshot_id: Some(snapshot.to_string()),
        encrypted: Some(true),
        delete_on_termination: Some(true),
        iops: Some(3000),
        throughput: Some(125),
        volume_size: Some(30),
        volume_type: Some("gp3".to_string()),
    }
}

fn launch_configuration(id: &str) -> LaunchConfigurationVersion {
    LaunchConfigurationVersion {
        launch_configuration_id: id.to_string(),
        version_number: 1,
        image_id: Some("ami-old".to_string()),
        device_mappings: vec![root("snap-old")],
    }
}

/// `app1` with a staged group on `asg1` and an in-place group on `asg9`.
fn base_fixture() -> FleetFixture {
    let mut in_place =
        DeploymentGroupFixture::new("dg2", ComputePlatform::Server, DeploymentStrategy::InPlace);
    in_place.scaling_groups.push("asg9".to_string());

    FleetFixture::default()
        .with_application(
            "app1",
            vec![DeploymentGroupFixture::staged("dg1", "asg1"), in_place],
        )
        .with_launch_configuration(launch_configuration("lc1"))
        .with_launch_configuration(launch_configuration("lc9"))
        .with_scaling_group("asg1", "lc1")
        .with_scaling_group("asg9", "lc9")
        .with_image(MachineImage {
            image_id: "ami-123".to_string(),
            device_mappings: vec![DeviceMapping {
                device_name: "/dev/xvda".to_string(),
                snapshot_id: Some("snap-123".to_string()),
                ..Default::default()
            }],
        })
        .with_parameter("golden-ami", "ami-123")
}

fn pipeline(fleet: &SimulatedFleet) -> Pipeline {
    Pipeline::new(
        Capabilities::from_backend(fleet.clone()),
        &FleetImageConfig::default(),
    )
}

#[tokio::test]
async fn golden_ami_change_updates_staged_targets_only() {
    let fleet = SimulatedFleet::new(base_fixture());

    let report = pipeline(&fleet).handle(GOLDEN_AMI_EVENT).await.unwrap();

    assert_eq!(report.image.image_id, "ami-123");
    assert_eq!(report.image.root_snapshot_id, "snap-123");
    assert_eq!(report.targets, vec!["asg1"]);
    assert_eq!(report.launch_configurations["lc1"], UpdateOutcome::Updated);
    assert!(!report.launch_configurations.contains_key("lc9"));
    assert_eq!(report.summary.updated, 1);
    assert!(!report.has_failures());

    let latest = fleet.versions("lc1").await.pop().unwrap();
    assert_eq!(latest.version_number, 2);
    assert_eq!(latest.image_id.as_deref(), Some("ami-123"));
    assert_eq!(latest.device_mappings, vec![root("snap-123")]);

    // The in-place group's launch configuration is untouched.
    assert_eq!(fleet.versions("lc9").await.len(), 1);
}

#[tokio::test]
async fn mismatched_data_type_aborts_before_any_call() {
    let fleet = SimulatedFleet::new(base_fixture());

    let err = pipeline(&fleet)
        .handle(r#"{"dataType":"text","name":"golden-ami"}"#)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnsupportedEventType { .. }));
    assert!(err.is_ignored_event());
    assert!(fleet.calls().await.is_empty());
}

#[tokio::test]
async fn malformed_notification_aborts_before_any_call() {
    let fleet = SimulatedFleet::new(base_fixture());

    let err = pipeline(&fleet).handle(r#"{"name": 7}"#).await.unwrap_err();

    assert!(matches!(err, PipelineError::MalformedEvent(_)));
    assert!(fleet.calls().await.is_empty());
}

#[tokio::test]
async fn shared_launch_configuration_gets_one_write() {
    let fleet = SimulatedFleet::new(
        base_fixture()
            .with_application("app2", vec![DeploymentGroupFixture::staged("dg1", "asg2")])
            .with_scaling_group("asg2", "lc1"),
    );

    let report = pipeline(&fleet).handle(GOLDEN_AMI_EVENT).await.unwrap();

    assert_eq!(report.targets, vec!["asg1", "asg2"]);
    assert_eq!(report.launch_configurations.len(), 1);
    assert_eq!(report.launch_configurations["lc1"], UpdateOutcome::Updated);
    assert_eq!(report.groups[1].outcome, UpdateOutcome::SkippedAlreadyUpdated);
    assert_eq!(fleet.calls_to(Operation::CreateVersion).await, vec!["lc1"]);
    assert_eq!(fleet.versions("lc1").await.len(), 2);
}

#[tokio::test]
async fn no_eligible_targets_is_fatal() {
    let fleet = SimulatedFleet::new(
        FleetFixture::default()
            .with_application(
                "app1",
                vec![DeploymentGroupFixture::new(
                    "dg1",
                    ComputePlatform::Server,
                    DeploymentStrategy::InPlace,
                )],
            )
            .with_image(MachineImage {
                image_id: "ami-123".to_string(),
                device_mappings: vec![root("snap-123")],
            })
            .with_parameter("golden-ami", "ami-123"),
    );

    let err = pipeline(&fleet).handle(GOLDEN_AMI_EVENT).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Resolve(ResolveError::NoTargetsFound { .. })
    ));
    assert!(fleet.calls_to(Operation::CreateVersion).await.is_empty());
}

#[tokio::test]
async fn missing_parameter_is_fatal() {
    let mut fixture = base_fixture();
    fixture.parameters.clear();
    let fleet = SimulatedFleet::new(fixture);

    let err = pipeline(&fleet).handle(GOLDEN_AMI_EVENT).await.unwrap_err();

    assert!(matches!(err, PipelineError::Parameter { .. }));
    assert!(fleet.calls_to(Operation::ListApplications).await.is_empty());
}

#[tokio::test]
async fn partial_failures_are_reported_not_fatal() {
    let fleet = SimulatedFleet::new(
        base_fixture()
            .with_application(
                "app2",
                vec![
                    DeploymentGroupFixture::staged("dg1", "asg2"),
                    DeploymentGroupFixture::staged("dg2", "asg3"),
                ],
            )
            .with_launch_configuration(launch_configuration("lc2"))
            .with_launch_configuration(launch_configuration("lc3"))
            .with_scaling_group("asg2", "lc2")
            .with_scaling_group("asg3", "lc3")
            .with_fault(Fault::new(Operation::DescribeScalingGroups, "asg2"))
            .with_fault(Fault::new(Operation::CreateVersion, "lc3")),
    );

    let report = pipeline(&fleet).handle(GOLDEN_AMI_EVENT).await.unwrap();

    assert_eq!(report.targets, vec!["asg1", "asg3"]);
    assert_eq!(report.launch_configurations["lc1"], UpdateOutcome::Updated);
    assert!(report.launch_configurations["lc3"].is_failed());
    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.failed, 2);
    assert!(report.has_failures());
}

#[tokio::test]
async fn dry_run_config_writes_nothing() {
    let fleet = SimulatedFleet::new(base_fixture());
    let mut config = FleetImageConfig::default();
    config.update.dry_run = true;

    let report = Pipeline::new(Capabilities::from_backend(fleet.clone()), &config)
        .handle(GOLDEN_AMI_EVENT)
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.launch_configurations["lc1"], UpdateOutcome::Updated);
    assert_eq!(fleet.calls_to(Operation::CreateVersion).await, vec!["lc1"]);
    assert_eq!(fleet.versions("lc1").await.len(), 1);
}

#[tokio::test]
async fn custom_data_type_marker_is_honoured() {
    let fleet = SimulatedFleet::new(base_fixture());
    let mut config = FleetImageConfig::default();
    config.trigger.image_data_type = "custom:image".to_string();
    let pipeline = Pipeline::new(Capabilities::from_backend(fleet.clone()), &config);

    let err = pipeline.handle(GOLDEN_AMI_EVENT).await.unwrap_err();
    assert!(err.is_ignored_event());

    let report = pipeline
        .handle(r#"{"dataType":"custom:image","name":"golden-ami"}"#)
        .await
        .unwrap();
    assert_eq!(report.summary.updated, 1);
}

#[tokio::test]
async fn golden_ami_demo() {
    let demo = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/golden-ami");
    let fleet = SimulatedFleet::from_file(&demo.join("fleet.json")).unwrap();
    let event = std::fs::read_to_string(demo.join("event.json")).unwrap();

    let report = pipeline(&fleet).handle(&event).await.unwrap();

    assert_eq!(report.targets, vec!["checkout-prod", "search-prod"]);
    assert_eq!(report.launch_configurations.len(), 1);
    assert_eq!(report.launch_configurations["lt-web"], UpdateOutcome::Updated);
    // checkout/canary, search/pending, thumbnails/prod, plus search-prod's
    // already-updated launch configuration.
    assert_eq!(report.summary.skipped, 4);

    let latest = fleet.versions("lt-web").await.pop().unwrap();
    assert_eq!(latest.version_number, 5);
    assert_eq!(latest.image_id.as_deref(), Some("ami-0bbb"));
    assert_eq!(latest.device_mappings[0].snapshot_id.as_deref(), Some("snap-0bbb"));
    assert_eq!(latest.device_mappings[0].volume_type.as_deref(), Some("gp3"));
    assert_eq!(fleet.versions("lt-canary").await.len(), 1);
}
