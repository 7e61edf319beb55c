//! Explicit configuration passed into record builders.

use std::path::Path;

use chrono::NaiveDate;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};

use super::error::RecordError;

/// Protocol versions accepted by the tax authority.
pub const ACCEPTED_ID_VERSIONS: &[&str] = &["1.0"];

/// Policy for the markup characters `<`, `>` and `=` in free-text fields.
///
/// The authority forbade them from 2025-09-09 and allowed them again from
/// 2025-10-23, so this is a switch rather than a hard-coded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPolicy {
    pub forbid_markup: bool,
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self {
            forbid_markup: true,
        }
    }
}

impl TextPolicy {
    pub const STRICT: Self = Self {
        forbid_markup: true,
    };
    pub const ALLOW_MARKUP: Self = Self {
        forbid_markup: false,
    };
}

/// Configuration shared by the record builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Protocol version stamped on every record ("IDVersion").
    pub id_version: String,
    /// Operation description used when the caller sets none.
    pub default_operation_description: String,
    /// Markup-character policy for free-text fields.
    pub text_policy: TextPolicy,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            id_version: "1.0".to_string(),
            default_operation_description: "Factura Cliente".to_string(),
            text_policy: TextPolicy::default(),
        }
    }
}

/// Overrides read from `VERIFACTU_*` environment variables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvOverrides {
    id_version: Option<String>,
    operation_description: Option<String>,
    allow_markup_chars: Option<bool>,
}

impl EnvOverrides {
    fn apply(self, config: &mut RecordConfig) {
        if let Some(version) = self.id_version {
            config.id_version = version;
        }
        if let Some(description) = self.operation_description {
            config.default_operation_description = description;
        }
        if let Some(allow) = self.allow_markup_chars {
            config.text_policy.forbid_markup = !allow;
        }
    }
}

impl RecordConfig {
    /// Prefix of the environment variables read by [`RecordConfig::from_env`]:
    /// `VERIFACTU_ID_VERSION`, `VERIFACTU_OPERATION_DESCRIPTION` and
    /// `VERIFACTU_ALLOW_MARKUP_CHARS`.
    pub const ENV_PREFIX: &'static str = "VERIFACTU";

    /// Load configuration from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, RecordError> {
        Self::load(Config::builder(), Self::environment())
    }

    /// Load a TOML file shaped like [`RecordConfig`], then apply environment
    /// overrides on top of it.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let file = File::from(path.as_ref()).format(FileFormat::Toml);
        Self::load(Config::builder().add_source(file), Self::environment())
    }

    /// Load configuration from an explicit set of environment variables.
    pub fn from_env_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self, RecordError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(Config::builder(), Self::environment().source(Some(vars)))
    }

    fn environment() -> Environment {
        Environment::with_prefix(Self::ENV_PREFIX).prefix_separator("_")
    }

    fn load(file: ConfigBuilder<DefaultState>, env: Environment) -> Result<Self, RecordError> {
        let mut config: RecordConfig = file
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| RecordError::Config(e.to_string()))?;
        let overrides: EnvOverrides = Config::builder()
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| RecordError::Config(e.to_string()))?;
        overrides.apply(&mut config);

        config.check()?;
        tracing::debug!(
            id_version = %config.id_version,
            forbid_markup = config.text_policy.forbid_markup,
            "record configuration loaded"
        );
        Ok(config)
    }

    /// Reject configurations the protocol cannot accept.
    pub fn check(&self) -> Result<(), RecordError> {
        if !ACCEPTED_ID_VERSIONS.contains(&self.id_version.as_str()) {
            return Err(RecordError::Config(format!(
                "id version '{}' is not accepted (expected one of {})",
                self.id_version,
                ACCEPTED_ID_VERSIONS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Source of "today" for date-window checks.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date of the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
