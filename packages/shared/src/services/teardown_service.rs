use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::repositories::errors::studio_repository_errors::StudioRepositoryError;
use crate::repositories::studio_repository::StudioRepository;
use crate::services::errors::teardown_service_errors::TeardownServiceError;
use crate::services::polling::{poll_until, PollError, PollOutcome, PollPolicy};

/// Removes every app and user profile of a Studio domain so CloudFormation
/// can delete the domain itself.
#[derive(Clone)]
pub struct TeardownService {
    repository: Arc<dyn StudioRepository + Send + Sync>,
    policy: PollPolicy,
    budget: Duration,
}

/// Resources already asked to delete during one wait, and how many were
/// still active at the last listing.
#[derive(Default)]
struct SweepState {
    requested: HashSet<String>,
    active: usize,
}

impl TeardownService {
    pub fn new(
        repository: Arc<dyn StudioRepository + Send + Sync>,
        policy: PollPolicy,
        budget: Duration,
    ) -> Self {
        TeardownService {
            repository,
            policy,
            budget,
        }
    }

    /// Deletes apps then user profiles. Both waits share one deadline: the
    /// earlier of `deadline` and the service budget.
    pub async fn teardown(
        &self,
        domain_id: &str,
        deadline: Option<Instant>,
    ) -> Result<(), TeardownServiceError> {
        let deadline = self.deadline(deadline);

        if !self.domain_is_present(domain_id).await {
            return Ok(());
        }

        self.wait_for_apps(domain_id, deadline).await?;
        self.wait_for_user_profiles(domain_id, deadline).await
    }

    pub async fn delete_apps(&self, domain_id: &str) -> Result<(), TeardownServiceError> {
        if !self.domain_is_present(domain_id).await {
            return Ok(());
        }
        self.wait_for_apps(domain_id, self.deadline(None)).await
    }

    pub async fn delete_user_profiles(&self, domain_id: &str) -> Result<(), TeardownServiceError> {
        self.wait_for_user_profiles(domain_id, self.deadline(None))
            .await
    }

    fn deadline(&self, deadline: Option<Instant>) -> Instant {
        let own = Instant::now() + self.budget;
        deadline.map_or(own, |deadline| deadline.min(own))
    }

    async fn domain_is_present(&self, domain_id: &str) -> bool {
        match self.repository.domain_exists(domain_id).await {
            Ok(true) => true,
            Ok(false) => {
                info!("Domain {} does not exist, nothing to delete", domain_id);
                false
            }
            Err(e) => {
                warn!("Cannot retrieve domain {}: {}", domain_id, e);
                false
            }
        }
    }

    async fn wait_for_apps(
        &self,
        domain_id: &str,
        deadline: Instant,
    ) -> Result<(), TeardownServiceError> {
        info!("Start deleting apps for domain id: {}", domain_id);

        let state = &Mutex::new(SweepState::default());
        let result = poll_until(&self.policy, Some(deadline), move |_| {
            self.sweep_apps(domain_id, state)
        })
        .await;

        let remaining = state.lock().await.active;
        finish(result, "apps", remaining)?;
        info!("Apps for {} deleted", domain_id);
        Ok(())
    }

    async fn wait_for_user_profiles(
        &self,
        domain_id: &str,
        deadline: Instant,
    ) -> Result<(), TeardownServiceError> {
        info!("Start deleting user profiles for domain id: {}", domain_id);

        let state = &Mutex::new(SweepState::default());
        let result = poll_until(&self.policy, Some(deadline), move |_| {
            self.sweep_user_profiles(domain_id, state)
        })
        .await;

        let remaining = state.lock().await.active;
        finish(result, "user profiles", remaining)?;
        info!("User profiles for {} deleted", domain_id);
        Ok(())
    }

    /// Lists every app, requests deletion of the ones that still need it and
    /// is ready once none is left undeleted.
    async fn sweep_apps(
        &self,
        domain_id: &str,
        state: &Mutex<SweepState>,
    ) -> Result<PollOutcome<()>, StudioRepositoryError> {
        let mut state = state.lock().await;
        let apps = self.repository.list_apps(domain_id).await?;

        for app in apps.iter().filter(|app| app.status.needs_delete()) {
            if state.requested.insert(app.key()) {
                info!("Deleting {}:{}", app.app_type, app.app_name);
                self.repository.delete_app(app).await?;
            }
        }

        state.active = apps.iter().filter(|app| !app.status.is_deleted()).count();
        info!("Number of active apps: {}", state.active);
        Ok(outcome(state.active))
    }

    async fn sweep_user_profiles(
        &self,
        domain_id: &str,
        state: &Mutex<SweepState>,
    ) -> Result<PollOutcome<()>, StudioRepositoryError> {
        let mut state = state.lock().await;
        let profiles = self.repository.list_user_profiles(domain_id).await?;

        for profile in profiles.iter().filter(|p| p.status.needs_delete()) {
            if state.requested.insert(profile.user_profile_name.clone()) {
                info!("Deleting user profile {}", profile.user_profile_name);
                self.repository
                    .delete_user_profile(&profile.domain_id, &profile.user_profile_name)
                    .await?;
            }
        }

        state.active = profiles
            .iter()
            .filter(|profile| !profile.status.is_deleted())
            .count();
        info!("Number of active user profiles: {}", state.active);
        Ok(outcome(state.active))
    }
}

fn outcome(active: usize) -> PollOutcome<()> {
    if active == 0 {
        PollOutcome::Ready(())
    } else {
        PollOutcome::Pending
    }
}

fn finish(
    result: Result<(), PollError<StudioRepositoryError>>,
    resource: &'static str,
    remaining: usize,
) -> Result<(), TeardownServiceError> {
    result.map_err(|e| match e {
        PollError::Failed(err) => TeardownServiceError::RepositoryError(err),
        PollError::Exhausted { attempts } => TeardownServiceError::Timeout {
            resource,
            remaining,
            attempts,
        },
    })
}
