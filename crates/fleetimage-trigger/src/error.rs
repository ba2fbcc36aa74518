//! Run-aborting pipeline errors.

use fleetimage_core::CapabilityError;
use fleetimage_resolver::ResolveError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that end a run. Per-item failures never show up here; they are
/// reported in the `RunReport`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed notification: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("notification data type {data_type:?} is not {expected:?}")]
    UnsupportedEventType { data_type: String, expected: String },

    #[error("failed to read parameter {name}: {source}")]
    Parameter {
        name: String,
        #[source]
        source: CapabilityError,
    },

    #[error("parameter {name} holds no image id")]
    EmptyParameter { name: String },

    #[error("failed to describe image {image_id}: {source}")]
    ImageLookup {
        image_id: String,
        #[source]
        source: CapabilityError,
    },

    #[error("image {image_id} has no root device snapshot")]
    ImageWithoutSnapshot { image_id: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl PipelineError {
    /// Whether this is the designed no-op for unrelated parameter changes
    /// rather than a failure.
    pub fn is_ignored_event(&self) -> bool {
        matches!(self, Self::UnsupportedEventType { .. })
    }
}
