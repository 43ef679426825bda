//! SAML response decoding for the Studio login bridge.
//!
//! This is sample-grade parsing: only the `AttributeStatement` attributes are
//! read and neither the signature, the certificates, the audience nor replay
//! protection are checked. A production deployment must put a real SAML
//! service provider in front of this code.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const SAML_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    MissingParameter,
    Encoding(String),
    Xml(String),
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertionError::MissingParameter => {
                write!(f, "Request body does not carry a SAML response parameter")
            }
            AssertionError::Encoding(msg) => write!(f, "Invalid SAML response encoding: {}", msg),
            AssertionError::Xml(msg) => write!(f, "Invalid SAML response XML: {}", msg),
        }
    }
}

impl std::error::Error for AssertionError {}

/// Attribute name -> first attribute value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamlAttributes(HashMap<String, String>);

impl SamlAttributes {
    /// Decodes the POST binding body and collects its attributes.
    pub fn from_form_body(body: &str) -> Result<Self, AssertionError> {
        let xml = decode_saml_response(body)?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self, AssertionError> {
        let document =
            roxmltree::Document::parse(xml).map_err(|e| AssertionError::Xml(e.to_string()))?;

        let mut attributes = HashMap::new();
        for attribute in document
            .descendants()
            .filter(|node| is_saml_element(node, "Attribute"))
        {
            let Some(name) = attribute.attribute("Name") else {
                continue;
            };
            let Some(value) = attribute
                .descendants()
                .find(|node| is_saml_element(node, "AttributeValue"))
            else {
                continue;
            };
            attributes.insert(
                name.to_string(),
                value.text().unwrap_or_default().to_string(),
            );
        }

        Ok(SamlAttributes(attributes))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_saml_element(node: &roxmltree::Node, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace() == Some(SAML_ASSERTION_NS)
}

/// Takes the value of the first form parameter, which must be the
/// URL-encoded, base64-encoded SAML response.
pub fn decode_saml_response(body: &str) -> Result<String, AssertionError> {
    let encoded = body
        .split('&')
        .next()
        .and_then(|pair| pair.split('=').nth(1))
        .ok_or(AssertionError::MissingParameter)?;

    let unescaped =
        urlencoding::decode(encoded).map_err(|e| AssertionError::Encoding(e.to_string()))?;
    let compact: String = unescaped
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| AssertionError::Encoding(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| AssertionError::Encoding(e.to_string()))
}

pub fn user_profile_name(user_id: &str, team_id: &str) -> String {
    format!("{}-{}", user_id, team_id)
}
