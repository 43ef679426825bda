use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The part of an API Gateway proxy request the SAML backend reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyRequest {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    pub fn redirect(location: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Location".to_string(), location.to_string());
        ProxyResponse {
            status_code: 302,
            headers,
            body: None,
            is_base64_encoded: false,
        }
    }

    pub fn with_body(status_code: u16, body: String) -> Self {
        ProxyResponse {
            status_code,
            headers: HashMap::new(),
            body: Some(body),
            is_base64_encoded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_serialization() {
        let response = ProxyResponse::redirect("https://studio.example.com/auth?token=x");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], 302);
        assert_eq!(
            value["headers"]["Location"],
            "https://studio.example.com/auth?token=x"
        );
        assert_eq!(value["isBase64Encoded"], false);
        assert!(value.get("body").is_none());
    }

    #[test]
    fn test_request_without_body() {
        let request: ProxyRequest = serde_json::from_str(r#"{"httpMethod": "POST"}"#).unwrap();
        assert!(request.body.is_none());
        assert!(!request.is_base64_encoded);
    }
}
