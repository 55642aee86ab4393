/// Reconciler configuration
///
/// # Environment Variables
///
/// - `QUESTBOARD_REVOKE_POINTS_ON_UNCOMPLETE`: `true` to take points back when
///   a completed task is un-completed (default: `false`, earned points stay)
/// - `QUESTBOARD_NOTICE_TTL_MS`: How long notifications should stay visible
///   (default: 3000)
///
/// Store settings (`QUESTBOARD_STORE_URL`, `QUESTBOARD_STORE_TIMEOUT_MS`) are
/// read by `questboard_shared::store::StoreConfig`.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default notification lifetime (3 seconds)
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(3000);

/// What happens to the balance when a completed task is un-completed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Points earned stay earned
    #[default]
    KeepEarned,

    /// The task's points are subtracted again (never below zero)
    Revoke,
}

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub completion_policy: CompletionPolicy,
    pub notice_ttl: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            completion_policy: CompletionPolicy::KeepEarned,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

impl ReconcilerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let completion_policy = match env::var("QUESTBOARD_REVOKE_POINTS_ON_UNCOMPLETE") {
            Ok(raw) => {
                if parse_flag(&raw)? {
                    CompletionPolicy::Revoke
                } else {
                    CompletionPolicy::KeepEarned
                }
            }
            Err(_) => CompletionPolicy::KeepEarned,
        };

        let notice_ttl = match env::var("QUESTBOARD_NOTICE_TTL_MS") {
            Ok(raw) => Duration::from_millis(raw.trim().parse::<u64>().map_err(|e| {
                anyhow::anyhow!("QUESTBOARD_NOTICE_TTL_MS must be a number of milliseconds: {}", e)
            })?),
            Err(_) => DEFAULT_NOTICE_TTL,
        };

        Ok(Self {
            completion_policy,
            notice_ttl,
        })
    }

    pub fn with_completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.completion_policy = policy;
        self
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow::anyhow!(
            "QUESTBOARD_REVOKE_POINTS_ON_UNCOMPLETE must be a boolean, got '{}'",
            other
        )),
    }
}
