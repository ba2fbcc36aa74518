use std::path::Path;

use fleetimage_core::FleetImageConfig;
use fleetimage_sim::SimulatedFleet;
use fleetimage_trigger::{Capabilities, Pipeline};

use crate::OutputFormat;

pub async fn resolve(
    config: &FleetImageConfig,
    fleet: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let fleet = SimulatedFleet::from_file(fleet)?;
    let pipeline = Pipeline::new(Capabilities::from_backend(fleet), config);
    let resolution = pipeline.resolve_targets().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
        OutputFormat::Text => {
            for group in &resolution.targets {
                println!("{:<24} {}", group.name, group.launch_configuration_id);
            }
            for skip in &resolution.skipped {
                println!("skipped {}: {}", skip.deployment_group, skip.reason);
            }
            for failure in &resolution.failures {
                println!(
                    "failed {} ({}): {}",
                    failure.scaling_group, failure.deployment_group, failure.reason
                );
            }
        }
    }
    Ok(())
}
