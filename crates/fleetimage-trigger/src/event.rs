//! Parameter-change notifications.
//!
//! A notification is either the bare change payload or an event-bus
//! envelope carrying it under `detail`:
//!
//! ```json
//! {
//!   "version": "0", "id": "…", "detail-type": "Parameter Store Change",
//!   "source": "aws.ssm", "account": "…", "region": "…", "resources": [],
//!   "detail": {
//!     "dataType": "aws:ec2:image", "name": "golden-ami",
//!     "description": "Golden AMI update", "type": "String", "operation": "Update"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// The parameter-change payload. Only `dataType` and `name` are used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterChange {
    pub data_type: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub parameter_type: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
}

impl ParameterChange {
    /// Fail with `UnsupportedEventType` unless this change concerns an
    /// image parameter.
    pub fn ensure_data_type(&self, expected: &str) -> PipelineResult<()> {
        if self.data_type == expected {
            Ok(())
        } else {
            Err(PipelineError::UnsupportedEventType {
                data_type: self.data_type.clone(),
                expected: expected.to_string(),
            })
        }
    }
}

/// Event-bus envelope around a `ParameterChange`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    pub detail: ParameterChange,
}

/// Parse a raw notification, unwrapping the envelope if present.
pub fn parse_notification(raw: &str) -> PipelineResult<ParameterChange> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let change = if value.get("detail").is_some() {
        let envelope: EventEnvelope = serde_json::from_value(value)?;
        info!(
            id = ?envelope.id,
            version = ?envelope.version,
            detail_type = ?envelope.detail_type,
            source = ?envelope.source,
            account = ?envelope.account,
            time = ?envelope.time,
            region = ?envelope.region,
            resources = ?envelope.resources,
            "received event"
        );
        envelope.detail
    } else {
        serde_json::from_value(value)?
    };

    debug!(
        data_type = %change.data_type,
        parameter = %change.name,
        operation = ?change.operation,
        "parameter change"
    );
    Ok(change)
}
