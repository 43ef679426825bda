use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// CloudFormation custom resource event.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomResourceRequest {
    #[serde(rename = "RequestType")]
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "ResourceType", default)]
    pub resource_type: Option<String>,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "PhysicalResourceId", default)]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ResourceProperties", default)]
    pub resource_properties: HashMap<String, Value>,
    #[serde(rename = "OldResourceProperties", default)]
    pub old_resource_properties: Option<HashMap<String, Value>>,
}

impl CustomResourceRequest {
    pub fn resource_property(&self, name: &str) -> Option<&str> {
        self.resource_properties.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceResponse {
    #[serde(rename = "Status")]
    pub status: ResponseStatus,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(rename = "NoEcho")]
    pub no_echo: bool,
    #[serde(rename = "Data")]
    pub data: HashMap<String, String>,
}

impl CustomResourceResponse {
    /// Builds the answer to `request`. Missing reason and physical id fall
    /// back to the log stream name, the same way the cfn-response helper does.
    pub fn new(
        request: &CustomResourceRequest,
        status: ResponseStatus,
        data: HashMap<String, String>,
        physical_resource_id: Option<String>,
        reason: Option<String>,
        log_stream_name: &str,
    ) -> Self {
        let reason = reason.unwrap_or_else(|| {
            format!(
                "See the details in CloudWatch Log Stream: {}",
                log_stream_name
            )
        });
        let physical_resource_id =
            physical_resource_id.unwrap_or_else(|| log_stream_name.to_string());

        CustomResourceResponse {
            status,
            reason,
            physical_resource_id,
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data,
        }
    }
}
