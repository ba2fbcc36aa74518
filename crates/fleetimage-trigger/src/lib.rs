//! fleetimage-trigger — turns a parameter-change notification into a rollout
//! of the new image across launch configurations.
//!
//! # Components
//!
//! - **`event`** — notification parsing and the image data-type gate
//! - **`image`** — parameter → image id → root snapshot
//! - **`pipeline`** — orchestrates resolver and updater for one run
//! - **`report`** — per-run summary of updates, skips and failures

pub mod error;
pub mod event;
pub mod image;
pub mod pipeline;
pub mod report;

pub use error::{PipelineError, PipelineResult};
pub use event::{EventEnvelope, ParameterChange, parse_notification};
pub use image::ImageResolver;
pub use pipeline::{Capabilities, Pipeline};
pub use report::{ReportEntry, RunReport, Summary};
