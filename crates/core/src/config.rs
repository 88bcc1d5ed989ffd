use std::env::{self, VarError};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on waiting for the staging-table drop, in seconds.
const DEFAULT_DROP_TIMEOUT_SECONDS: u32 = 300;

/// Env var naming the active profile.
pub const PROFILE_KEY: &str = "REFRESH_PROFILE";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

/// Read one variable verbatim. Absent is `None`; non-UTF-8 is `Invalid`.
fn env_verbatim(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: raw.to_string_lossy().into_owned(),
            reason: "value is not valid UTF-8".to_string(),
        }),
    }
}

/// Required settings are taken verbatim: present-but-empty is accepted.
fn profiled_env_required(profile: &str, key: &str) -> Result<String, ConfigError> {
    if !profile.is_empty() {
        if let Some(v) = env_verbatim(&format!("{}_{}", profile, key))? {
            return Ok(v);
        }
    }
    env_verbatim(key)?.ok_or_else(|| ConfigError::Missing {
        key: key.to_string(),
    })
}

fn profiled_env_parse<T>(profile: &str, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match profiled_env_opt(profile, key) {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            value: v.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn active_profile() -> String {
    env_opt(PROFILE_KEY)
        .map(|s| s.to_uppercase())
        .unwrap_or_default()
}

/// Folder prefixes always carry a trailing separator.
fn as_folder_prefix(folder: String) -> String {
    if folder.ends_with('/') {
        folder
    } else {
        folder + "/"
    }
}

// ── Launch mode ───────────────────────────────────────────────

/// How the create statement is sequenced after the staging-table drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchMode {
    /// Wait for the drop to reach a terminal state before starting the create.
    #[default]
    AwaitDrop,
    /// Submit drop and create back-to-back without observing either.
    FireAndForget,
}

impl LaunchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchMode::AwaitDrop => "await-drop",
            LaunchMode::FireAndForget => "fire-and-forget",
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "await-drop" | "await_drop" | "await" => Ok(LaunchMode::AwaitDrop),
            "fire-and-forget" | "fire_and_forget" | "fire" => Ok(LaunchMode::FireAndForget),
            other => Err(format!(
                "expected `await-drop` or `fire-and-forget`, got `{other}`"
            )),
        }
    }
}

// ── Extraction ────────────────────────────────────────────────

/// Settings for one refresh invocation. Read once, immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Bucket receiving extraction results.
    pub output_bucket: String,
    /// Key prefix inside `output_bucket`, always ending in `/`.
    pub output_folder: String,
    /// Database holding the source table and the staging table.
    pub source_database: String,
    /// Table referenced by the registered query.
    pub source_table: String,
    /// Substring selecting which named queries to run.
    pub query_name_fragment: String,
    /// Where Athena writes raw result files.
    pub query_output_location: String,
    /// AWS region override; `None` uses the SDK's default provider chain.
    pub region: Option<String>,
    /// Athena workgroup override; `None` uses the service default.
    pub workgroup: Option<String>,
    pub launch_mode: LaunchMode,
    pub drop_timeout_seconds: u32,
}

impl ExtractionConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `REFRESH_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_profiled(&active_profile())
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn from_env_profiled(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();

        Ok(Self {
            profile: p.to_string(),
            output_bucket: profiled_env_required(p, "OUTPUT_BUCKET")?,
            output_folder: as_folder_prefix(profiled_env_required(p, "OUTPUT_FOLDER")?),
            source_database: profiled_env_required(p, "SOURCE_DATABASE")?,
            source_table: profiled_env_required(p, "SOURCE_TABLE")?,
            query_name_fragment: profiled_env_required(p, "EXTRACTION_QUERY_NAME")?,
            query_output_location: profiled_env_required(p, "ATHENA_OUTPUT_LOCATION")?,
            region: profiled_env_opt(p, "AWS_REGION"),
            workgroup: profiled_env_opt(p, "ATHENA_WORKGROUP"),
            launch_mode: profiled_env_parse(p, "EXTRACTION_LAUNCH_MODE", LaunchMode::default())?,
            drop_timeout_seconds: profiled_env_parse(
                p,
                "EXTRACTION_DROP_TIMEOUT_SECONDS",
                DEFAULT_DROP_TIMEOUT_SECONDS,
            )?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  output:      s3://{}/{}", self.output_bucket, self.output_folder);
        tracing::info!("  source:      {}.{}", self.source_database, self.source_table);
        tracing::info!("  query:       name contains {:?}", self.query_name_fragment);
        tracing::info!("  athena:      output={}, workgroup={}", self.query_output_location, self.workgroup.as_deref().unwrap_or("(default)"));
        tracing::info!("  launch:      mode={}, drop_timeout={}s", self.launch_mode, self.drop_timeout_seconds);
        tracing::info!("  aws:         region={}", self.region.as_deref().unwrap_or("(sdk default)"));
    }
}

// ── Output ACL ────────────────────────────────────────────────

/// Account identities used when granting access to newly written result objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclConfig {
    /// Top-level folder (without trailing `/`) whose objects get the grant.
    pub output_folder: String,
    pub payer_account_name: String,
    pub payer_canonical_id: String,
    pub linked_account_name: String,
    pub linked_canonical_id: String,
    pub region: Option<String>,
}

impl AclConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_profiled(&active_profile())
    }

    pub fn from_env_profiled(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();

        let folder = profiled_env_required(p, "OUTPUT_FOLDER")?;
        Ok(Self {
            output_folder: folder.trim_end_matches('/').to_string(),
            payer_account_name: profiled_env_required(p, "PAYER_ACCOUNT_NAME")?,
            payer_canonical_id: profiled_env_required(p, "PAYER_CANONICAL_ID")?,
            linked_account_name: profiled_env_required(p, "LINKED_ACCOUNT_NAME")?,
            linked_canonical_id: profiled_env_required(p, "LINKED_CANONICAL_ID")?,
            region: profiled_env_opt(p, "AWS_REGION"),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────
