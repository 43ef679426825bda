#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStatus {
    Pending,
    InService,
    Deleting,
    Deleted,
    Failed,
    Unknown(String),
}

impl AppStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "Pending" => AppStatus::Pending,
            "InService" => AppStatus::InService,
            "Deleting" => AppStatus::Deleting,
            "Deleted" => AppStatus::Deleted,
            "Failed" => AppStatus::Failed,
            other => AppStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, AppStatus::Deleted)
    }

    /// Apps already gone or on their way out must not get a second delete.
    pub fn needs_delete(&self) -> bool {
        !matches!(self, AppStatus::Deleted | AppStatus::Deleting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    Pending,
    InService,
    Updating,
    Deleting,
    Deleted,
    Failed,
    UpdateFailed,
    DeleteFailed,
    Unknown(String),
}

impl ProfileStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "Pending" => ProfileStatus::Pending,
            "InService" => ProfileStatus::InService,
            "Updating" => ProfileStatus::Updating,
            "Deleting" => ProfileStatus::Deleting,
            "Deleted" => ProfileStatus::Deleted,
            "Failed" => ProfileStatus::Failed,
            "Update_Failed" | "UpdateFailed" => ProfileStatus::UpdateFailed,
            "Delete_Failed" | "DeleteFailed" => ProfileStatus::DeleteFailed,
            other => ProfileStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, ProfileStatus::Deleted)
    }

    /// Pending profiles cannot be deleted yet; they are picked up by a later retry.
    pub fn needs_delete(&self) -> bool {
        !matches!(
            self,
            ProfileStatus::Deleted | ProfileStatus::Deleting | ProfileStatus::Pending
        )
    }
}

/// Apps run either under a user profile or inside a shared space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppOwner {
    UserProfile(String),
    Space(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSummary {
    pub domain_id: String,
    pub owner: AppOwner,
    pub app_type: String,
    pub app_name: String,
    pub status: AppStatus,
}

impl AppSummary {
    /// Identifies the app within its domain.
    pub fn key(&self) -> String {
        match &self.owner {
            AppOwner::UserProfile(profile) => {
                format!("profile/{}/{}/{}", profile, self.app_type, self.app_name)
            }
            AppOwner::Space(space) => format!("space/{}/{}/{}", space, self.app_type, self.app_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfileSummary {
    pub domain_id: String,
    pub user_profile_name: String,
    pub status: ProfileStatus,
}

/// Settings applied to a user profile created on first login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUserProfile {
    pub domain_id: String,
    pub user_profile_name: String,
    pub tags: Vec<(String, String)>,
    pub execution_role: Option<String>,
    pub security_groups: Vec<String>,
}
