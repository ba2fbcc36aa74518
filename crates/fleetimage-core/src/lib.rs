//! fleetimage-core — shared types for image propagation.
//!
//! Holds the deployment-topology and launch-configuration domain types,
//! the capability traits that stand in for the external services, and the
//! `fleetimage.toml` configuration.

pub mod capability;
pub mod config;
pub mod error;
pub mod types;

pub use capability::{
    DeploymentCatalog, LaunchConfigurations, MachineImages, ParameterStore, ScalingGroups,
};
pub use config::FleetImageConfig;
pub use error::{CapabilityError, CapabilityResult};
pub use types::*;
