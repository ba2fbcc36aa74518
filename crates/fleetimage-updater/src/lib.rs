//! fleetimage-updater — appends launch configuration versions for a new image.
//!
//! The updater owns a per-run map of launch configuration id → outcome and
//! returns it in the `UpdateReport`. That map is what guarantees a shared
//! launch configuration is written at most once.

pub mod launch;

pub use launch::{
    GroupUpdate, LaunchConfigurationUpdater, UpdateOptions, UpdateReport, rewrite_device_mappings,
};
