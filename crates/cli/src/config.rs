use clap::Args;
use serde::Deserialize;
use store::StoreConfig;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/fintrack";
const ENV_PREFIX: &str = "FINTRACK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub level: String,
    pub store: StoreConfig,
    pub auth: Option<Auth>,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            store: StoreConfig::default(),
            auth: None,
            server: ServerSettings::default(),
        }
    }
}

/// Credential the store signs in with.
#[derive(Clone, Deserialize)]
pub struct Auth {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub token: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn default_user_id() -> String {
    "default".to_string()
}

/// Settings of the `serve` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub users: Vec<ServerUser>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerUser {
    pub user_id: String,
    pub token: String,
}

/// Options shared by every subcommand.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override the API base URL (e.g. http://127.0.0.1:3000/api).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override the page size.
    #[arg(long, global = true)]
    page_size: Option<u64>,
    /// Override the log level (token is never read from CLI).
    #[arg(long, global = true)]
    level: Option<String>,
}

impl ConfigArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(base_url) = &self.base_url {
            settings.store.base_url = base_url.clone();
        }
        if let Some(page_size) = self.page_size {
            settings.store.page_size = page_size;
        }
        if let Some(level) = &self.level {
            settings.level = level.clone();
        }
    }
}

pub fn load(args: &ConfigArgs) -> Result<Settings> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let builder = config::Config::builder()
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    args.apply(&mut settings);
    Ok(settings)
}
