use std::path::Path;

use tracing::info;

use fleetimage_core::FleetImageConfig;
use fleetimage_sim::SimulatedFleet;
use fleetimage_trigger::{Capabilities, Pipeline};

use crate::OutputFormat;

pub async fn run(
    config: &FleetImageConfig,
    event: &Path,
    fleet: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(event)?;
    let fleet = SimulatedFleet::from_file(fleet)?;
    let pipeline = Pipeline::new(Capabilities::from_backend(fleet), config);

    let report = match pipeline.handle(&raw).await {
        Ok(report) => report,
        Err(e) if e.is_ignored_event() => {
            info!(reason = %e, "notification ignored");
            println!("ignored: {e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.render_text()),
    }
    Ok(())
}
