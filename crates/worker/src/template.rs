//! Work item submission template.

use serde_json::{json, Value};

/// Inputs to [`work_item_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemOptions {
    /// Fully qualified activity id, see [`qualified_activity_id`].
    pub activity_id: String,
    /// Read-signed URL of the staged input.
    pub input_url: String,
    /// Write-signed URL the work item uploads its output to.
    pub output_url: String,
}

/// `{nickname}.{activity}+{alias}`, the form the service resolves.
pub fn qualified_activity_id(nickname: &str, activity: &str, alias: &str) -> String {
    format!("{nickname}.{activity}+{alias}")
}

/// Build the JSON body for `POST /workitems`.
pub fn work_item_payload(options: &WorkItemOptions) -> Value {
    json!({
        "activityId": options.activity_id,
        "arguments": {
            "inputFile": {
                "url": options.input_url,
            },
            "outputFile": {
                "url": options.output_url,
                "verb": "put",
            },
        },
    })
}
