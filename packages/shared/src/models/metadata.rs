use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::studio::NewUserProfile;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileTag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileUserSettings {
    #[serde(rename = "ExecutionRole", default)]
    pub execution_role: Option<String>,
    #[serde(rename = "SecurityGroups", default)]
    pub security_groups: Vec<String>,
}

/// Per-team record used when user profiles are provisioned on first login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TeamMetadata {
    #[serde(rename = "DomainId")]
    pub domain_id: String,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<ProfileTag>,
    #[serde(rename = "UserSettings", default)]
    pub user_settings: ProfileUserSettings,
    #[serde(rename = "SessionExpiration", default)]
    pub session_expiration: Option<i32>,
}

impl TeamMetadata {
    pub fn new_user_profile(&self, user_profile_name: &str) -> NewUserProfile {
        NewUserProfile {
            domain_id: self.domain_id.clone(),
            user_profile_name: user_profile_name.to_string(),
            tags: self
                .tags
                .iter()
                .map(|tag| (tag.key.clone(), tag.value.clone()))
                .collect(),
            execution_role: self.user_settings.execution_role.clone(),
            security_groups: self.user_settings.security_groups.clone(),
        }
    }
}

/// Team id -> metadata, as stored in the `USER_PROFILE_METADATA` variable.
pub type TeamMetadataMap = HashMap<String, TeamMetadata>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_metadata_deserialization() {
        let raw = r#"{
            "t1": {
                "DomainId": "d-abc",
                "Tags": [{"Key": "Team", "Value": "t1"}],
                "UserSettings": {
                    "ExecutionRole": "arn:aws:iam::111122223333:role/t1",
                    "SecurityGroups": ["sg-1"]
                },
                "SessionExpiration": 3600
            },
            "t2": {"DomainId": "d-def"}
        }"#;

        let map: TeamMetadataMap = serde_json::from_str(raw).unwrap();

        let t1 = &map["t1"];
        assert_eq!(t1.domain_id, "d-abc");
        assert_eq!(t1.session_expiration, Some(3600));
        assert_eq!(t1.user_settings.security_groups, vec!["sg-1".to_string()]);

        let t2 = &map["t2"];
        assert!(t2.tags.is_empty());
        assert_eq!(t2.user_settings, ProfileUserSettings::default());
        assert_eq!(t2.session_expiration, None);
    }

    #[test]
    fn test_new_user_profile_carries_team_settings() {
        let metadata = TeamMetadata {
            domain_id: "d-abc".to_string(),
            tags: vec![ProfileTag {
                key: "Team".to_string(),
                value: "t1".to_string(),
            }],
            user_settings: ProfileUserSettings {
                execution_role: Some("role".to_string()),
                security_groups: vec![],
            },
            session_expiration: None,
        };

        let profile = metadata.new_user_profile("u1-t1");

        assert_eq!(profile.domain_id, "d-abc");
        assert_eq!(profile.user_profile_name, "u1-t1");
        assert_eq!(profile.tags, vec![("Team".to_string(), "t1".to_string())]);
        assert_eq!(profile.execution_role.as_deref(), Some("role"));
    }
}
