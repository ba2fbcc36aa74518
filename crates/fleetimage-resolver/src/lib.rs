//! fleetimage-resolver — finds the scaling groups an image rollout targets.
//!
//! # Algorithm
//!
//! ```text
//! for app in list_applications (all pages)        -- failure: fatal
//!     for dg in list_deployment_groups(app)       -- failure: fatal
//!         group = get_deployment_group(app, dg)   -- failure: fatal
//!         skip unless platform == server && strategy == staged
//!         skip if no scaling group attached
//!         describe_scaling_groups([first ref])    -- failure: recorded
//! targets.is_empty() => NoTargetsFound
//! ```

pub mod error;
pub mod topology;

pub use error::{ResolveError, ResolveResult};
pub use topology::{LookupFailure, Resolution, ResolveSkip, SkipReason, TopologyResolver};
