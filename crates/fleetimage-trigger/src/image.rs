//! Resolves the image a run propagates.
//!
//! The parameter store maps the changed parameter to an image id; the
//! image service supplies the snapshot behind its root device. Both
//! lookups happen once per run and either failing ends the run.

use std::sync::Arc;

use tracing::info;

use fleetimage_core::{ImageReference, MachineImages, ParameterStore};

use crate::error::{PipelineError, PipelineResult};

#[derive(Clone)]
pub struct ImageResolver {
    parameters: Arc<dyn ParameterStore>,
    images: Arc<dyn MachineImages>,
}

impl ImageResolver {
    pub fn new(parameters: Arc<dyn ParameterStore>, images: Arc<dyn MachineImages>) -> Self {
        Self { parameters, images }
    }

    /// The image id currently stored under `parameter`.
    pub async fn image_id(&self, parameter: &str) -> PipelineResult<String> {
        let value = self
            .parameters
            .get_parameter(parameter)
            .await
            .map_err(|source| PipelineError::Parameter {
                name: parameter.to_string(),
                source,
            })?;
        let image_id = value.trim();
        if image_id.is_empty() {
            return Err(PipelineError::EmptyParameter {
                name: parameter.to_string(),
            });
        }
        Ok(image_id.to_string())
    }

    /// Image id plus root snapshot for `parameter`.
    pub async fn resolve(&self, parameter: &str) -> PipelineResult<ImageReference> {
        let image_id = self.image_id(parameter).await?;

        let image = self
            .images
            .describe_image(&image_id)
            .await
            .map_err(|source| PipelineError::ImageLookup {
                image_id: image_id.clone(),
                source,
            })?;
        let root_snapshot_id = image
            .root_snapshot_id()
            .ok_or_else(|| PipelineError::ImageWithoutSnapshot {
                image_id: image_id.clone(),
            })?
            .to_string();

        info!(%parameter, image = %image_id, snapshot = %root_snapshot_id, "resolved image");
        Ok(ImageReference {
            image_id,
            root_snapshot_id,
        })
    }
}
