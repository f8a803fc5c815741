//! Runtime configuration, read once from the environment at startup.

use std::borrow::Cow;
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::warn;

const REGISTRY_BASE: &str = "https://api.fda.gov";
const REGISTRY_BASE_ENV: &str = "MEDCYCLE_REGISTRY_BASE";
const SESSION_SECRET_ENV: &str = "MEDCYCLE_SESSION_SECRET";
const MATCH_MODE_ENV: &str = "MEDCYCLE_MATCH_MODE";
const OWNER_ONLY_DELETE_ENV: &str = "MEDCYCLE_OWNER_ONLY_DELETE";

/// How `GET /medicines/query` matches generic names.
///
/// Partial (substring containment) is the canonical behavior; exact match is
/// kept available as an explicit configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Partial,
    Exact,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external NDC registry.
    pub registry_base: Cow<'static, str>,
    /// Per-request timeout for registry lookups. No retries beyond this.
    pub registry_timeout: Duration,
    /// Secret for signing session tokens.
    pub session_secret: String,
    /// Staleness window of the session claims snapshot.
    pub session_ttl: Duration,
    pub match_mode: MatchMode,
    /// When set, DELETE /medicines/{id} requires the caller to own the listing.
    pub owner_only_delete: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_base: Cow::Borrowed(REGISTRY_BASE),
            registry_timeout: Duration::from_secs(10),
            session_secret: ephemeral_secret(),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            match_mode: MatchMode::default(),
            owner_only_delete: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self {
            registry_base: env_base(REGISTRY_BASE, REGISTRY_BASE_ENV),
            ..Self::default()
        };

        match env_trimmed(SESSION_SECRET_ENV) {
            Some(secret) => config.session_secret = secret,
            None => warn!(
                "{SESSION_SECRET_ENV} is not set; using an ephemeral secret, \
                 sessions will not survive a restart"
            ),
        }

        if let Some(mode) = env_trimmed(MATCH_MODE_ENV) {
            config.match_mode = match mode.to_ascii_lowercase().as_str() {
                "exact" => MatchMode::Exact,
                "partial" => MatchMode::Partial,
                other => {
                    warn!(value = other, "unrecognized {MATCH_MODE_ENV}; using partial");
                    MatchMode::Partial
                }
            };
        }

        if let Some(flag) = env_trimmed(OWNER_ONLY_DELETE_ENV) {
            config.owner_only_delete = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config
    }
}

fn env_trimmed(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn env_base(default: &'static str, env_var: &str) -> Cow<'static, str> {
    env_trimmed(env_var)
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed(default))
}

fn ephemeral_secret() -> String {
    hex::encode(Sha256::digest(Utc::now().to_rfc3339().as_bytes()))
}
