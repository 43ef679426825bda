use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::models::metadata::TeamMetadataMap;
use crate::services::polling::PollPolicy;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} environment variable must be set", key),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "Invalid value {:?} for {}: {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// How the SAML backend turns an identity into a Studio URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeMode {
    /// The domain id travels in the assertion itself.
    DomainId,
    /// The domain id comes from per-team metadata and missing user
    /// profiles are created on first login.
    TeamMetadata(TeamMetadataMap),
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FederationSettings {
    pub domain_id_key: String,
    pub user_id_key: String,
    pub team_id_key: String,
    pub session_expiration_seconds: i32,
    pub presigned_url_expiration_seconds: i32,
    pub mode: ExchangeMode,
}

impl Default for FederationSettings {
    fn default() -> Self {
        FederationSettings {
            domain_id_key: "domainid".to_string(),
            user_id_key: "ssouserid".to_string(),
            team_id_key: "teamid".to_string(),
            session_expiration_seconds: 43200,
            presigned_url_expiration_seconds: 5,
            mode: ExchangeMode::DomainId,
        }
    }
}

const DEFAULT_TEARDOWN_BUDGET_SECONDS: u64 = 780;

/// Process-wide settings, read once at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_level: Level,
    pub federation: FederationSettings,
    pub teardown_policy: PollPolicy,
    /// Upper bound on one teardown, kept under the 900 s Lambda limit.
    pub teardown_budget: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = FederationSettings::default();

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => parse_log_level(&value)?,
            None => Level::INFO,
        };

        let mode = match lookup("EXCHANGE_MODE").as_deref().unwrap_or("domain-id") {
            "domain-id" => ExchangeMode::DomainId,
            "team-metadata" => {
                let raw = lookup("USER_PROFILE_METADATA")
                    .ok_or(ConfigError::Missing("USER_PROFILE_METADATA"))?;
                let metadata: TeamMetadataMap =
                    serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                        key: "USER_PROFILE_METADATA",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
                ExchangeMode::TeamMetadata(metadata)
            }
            "disabled" => ExchangeMode::Disabled,
            other => {
                return Err(ConfigError::Invalid {
                    key: "EXCHANGE_MODE",
                    value: other.to_string(),
                    reason: "expected domain-id, team-metadata or disabled".to_string(),
                })
            }
        };

        let federation = FederationSettings {
            domain_id_key: lookup("KEY_NAME_DOMAIN_ID").unwrap_or(defaults.domain_id_key),
            user_id_key: lookup("KEY_NAME_USER_ID").unwrap_or(defaults.user_id_key),
            team_id_key: lookup("KEY_NAME_TEAM_ID").unwrap_or(defaults.team_id_key),
            session_expiration_seconds: parse_number(
                &lookup,
                "SESSION_EXPIRATION",
                defaults.session_expiration_seconds,
            )?,
            presigned_url_expiration_seconds: parse_number(
                &lookup,
                "PRESIGNED_URL_EXPIRATION",
                defaults.presigned_url_expiration_seconds,
            )?,
            mode,
        };

        let mut teardown_policy = PollPolicy::teardown();
        let interval: u64 = parse_number(
            &lookup,
            "TEARDOWN_POLL_INTERVAL_SECONDS",
            teardown_policy.initial_interval.as_secs(),
        )?;
        teardown_policy.initial_interval = Duration::from_secs(interval);
        teardown_policy.max_interval = teardown_policy.max_interval.max(teardown_policy.initial_interval);
        teardown_policy.max_attempts =
            parse_number(&lookup, "TEARDOWN_MAX_ATTEMPTS", teardown_policy.max_attempts)?;

        let budget: u64 = parse_number(
            &lookup,
            "TEARDOWN_BUDGET_SECONDS",
            DEFAULT_TEARDOWN_BUDGET_SECONDS,
        )?;
        if budget == 0 || budget >= 900 {
            return Err(ConfigError::Invalid {
                key: "TEARDOWN_BUDGET_SECONDS",
                value: budget.to_string(),
                reason: "must be between 1 and 899".to_string(),
            });
        }

        Ok(Settings {
            log_level,
            federation,
            teardown_policy,
            teardown_budget: Duration::from_secs(budget),
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: value.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Accepts the usual level names plus the Python style `WARNING` and `CRITICAL`.
fn parse_log_level(value: &str) -> Result<Level, ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Ok(Level::WARN),
        "CRITICAL" | "FATAL" => Ok(Level::ERROR),
        other => Level::from_str(other).map_err(|e| ConfigError::Invalid {
            key: "LOG_LEVEL",
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
