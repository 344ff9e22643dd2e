use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::schema::{AppUser, Password};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHOPKEEP_ENV";
const CONFIG_DIR_ENV: &str = "SHOPKEEP_CONFIG_DIR";
const ENV_PREFIX: &str = "SHOPKEEP";

/// Deployment environment the initializer is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub app_user: AppUserSettings,
    #[serde(default)]
    pub provisioning: ProvisioningSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay and
    /// `SHOPKEEP__*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Administrative connection string.
    #[serde(default = "DatabaseSettings::default_uri")]
    pub uri: String,
    /// Database the schema is provisioned into.
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_app_name")]
    pub app_name: String,
    #[serde(default = "DatabaseSettings::default_server_selection_timeout_ms")]
    pub server_selection_timeout_ms: u64,
}

impl DatabaseSettings {
    fn default_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }

    fn default_name() -> String {
        "ecommerce_db".to_string()
    }

    fn default_app_name() -> String {
        "shopkeep".to_string()
    }

    fn default_server_selection_timeout_ms() -> u64 {
        5000
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            name: Self::default_name(),
            app_name: Self::default_app_name(),
            server_selection_timeout_ms: Self::default_server_selection_timeout_ms(),
        }
    }
}

/// Credentials for the application principal. The password has no default and
/// must come from the environment or a mounted secret file.
#[derive(Clone, Deserialize)]
pub struct AppUserSettings {
    #[serde(default = "AppUserSettings::default_username")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_file: Option<PathBuf>,
}

impl AppUserSettings {
    fn default_username() -> String {
        "ecommerce_user".to_string()
    }

    /// Resolve the configured credentials into an [`AppUser`] bound to `database`.
    ///
    /// An inline password wins over `password_file`. Trailing newlines in the
    /// file are stripped.
    pub fn resolve(&self, database: &str) -> anyhow::Result<AppUser> {
        let password = match (&self.password, &self.password_file) {
            (Some(password), _) => password.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read password file {}", path.display()))?
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            (None, None) => {
                return Err(anyhow!(
                    "no password configured for application user '{}'; set app_user.password or app_user.password_file",
                    self.username
                ));
            }
        };

        if password.is_empty() {
            return Err(anyhow!(
                "password for application user '{}' is empty",
                self.username
            ));
        }

        Ok(AppUser::read_write(
            self.username.clone(),
            Password::new(password),
            database,
        ))
    }
}

impl Default for AppUserSettings {
    fn default() -> Self {
        Self {
            username: Self::default_username(),
            password: None,
            password_file: None,
        }
    }
}

impl fmt::Debug for AppUserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUserSettings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_file", &self.password_file)
            .finish()
    }
}

/// What to do when a user, collection or index already exists on the server.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Inspect the server first and create only what is missing.
    #[default]
    Check,
    /// Issue every create call and treat "already exists" as satisfied.
    Ignore,
    /// Issue every create call and abort on the first existing resource.
    Fail,
}

impl fmt::Display for ExistingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExistingPolicy::Check => "check",
            ExistingPolicy::Ignore => "ignore",
            ExistingPolicy::Fail => "fail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvisioningSettings {
    #[serde(default)]
    pub on_existing: ExistingPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Fallback filter directive when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
