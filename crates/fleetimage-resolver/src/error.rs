//! Fatal resolution errors.

use fleetimage_core::CapabilityError;
use thiserror::Error;

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that abort topology resolution. Per-group lookup failures are
/// not here; they are recorded on the `Resolution` instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to enumerate applications: {0}")]
    ListApplications(#[source] CapabilityError),

    #[error("application listing returned cursor {cursor} twice")]
    RepeatedCursor { cursor: String },

    #[error("failed to list deployment groups of {application}: {source}")]
    ListDeploymentGroups {
        application: String,
        #[source]
        source: CapabilityError,
    },

    #[error("failed to fetch deployment group {application}/{group}: {source}")]
    GetDeploymentGroup {
        application: String,
        group: String,
        #[source]
        source: CapabilityError,
    },

    #[error(
        "no target scaling groups found across {applications} applications \
         ({skipped} deployment groups skipped, {failed} lookups failed)"
    )]
    NoTargetsFound {
        applications: usize,
        skipped: usize,
        failed: usize,
    },
}
