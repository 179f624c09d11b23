//! Runtime configuration: the JSON project file plus environment overrides.
use crate::constants::{DEFAULT_CONFIG_PATH, DEFAULT_INTENTS, DEFAULT_PROJECT_NAME};
use crate::dispatch::PrivilegePolicy;
use crate::error::ConfigError;
use serde::Deserialize;
use serenity::model::id::{ChannelId, GuildId};
use std::path::Path;

/// Shape of `hashi.config.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashiConfig {
    pub project_name: String,
    pub intents: u64,
    /// Guild to publish commands to; global publication when absent.
    pub guild_id: Option<String>,
    pub channels: ChannelsConfig,
    pub database: DatabaseConfig,
    pub privilege_policy: PrivilegePolicy,
}

impl Default for HashiConfig {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            intents: DEFAULT_INTENTS,
            guild_id: None,
            channels: ChannelsConfig::default(),
            database: DatabaseConfig::default(),
            privilege_policy: PrivilegePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Channel that receives the online notice.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseConfig {
    #[serde(rename = "connectionURI")]
    pub connection_uri: Option<String>,
    pub database_name: Option<String>,
}

impl HashiConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads the file at `path`; a missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Resolved start-up configuration.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub project_name: String,
    pub dev_mode: bool,
    pub intents: u64,
    pub guild_id: Option<GuildId>,
    pub status_channel: Option<ChannelId>,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub privilege_policy: PrivilegePolicy,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("project_name", &self.project_name)
            .field("dev_mode", &self.dev_mode)
            .field("intents", &self.intents)
            .field("guild_id", &self.guild_id)
            .field("status_channel", &self.status_channel)
            .field("database", &self.database_url.is_some())
            .field("privilege_policy", &self.privilege_policy)
            .finish()
    }
}

impl Config {
    /// Loads from the process environment and the file named by `HASHI_CONFIG`.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let path = lookup("HASHI_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let file = HashiConfig::from_path(Path::new(&path))?;
        Self::resolve(file, lookup)
    }

    /// Combines a parsed file with environment values; the environment wins.
    pub fn resolve<F>(file: HashiConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let token = non_empty("DISCORD_TOKEN")
            .or_else(|| non_empty("TOKEN"))
            .or_else(|| non_empty("token"))
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let dev_mode = match non_empty("DEV_MODE") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                name: "DEV_MODE",
                reason: format!("`{raw}` is not a boolean"),
            })?,
            None => false,
        };

        let guild_id = non_empty("GUILD_ID")
            .or(file.guild_id)
            .map(|raw| parse_snowflake("GUILD_ID", &raw).map(GuildId::new))
            .transpose()?;
        let status_channel = file
            .channels
            .status
            .map(|raw| parse_snowflake("channels.status", &raw).map(ChannelId::new))
            .transpose()?;

        Ok(Self {
            token,
            project_name: non_empty("PROJECT_NAME").unwrap_or(file.project_name),
            dev_mode,
            intents: file.intents,
            guild_id,
            status_channel,
            database_url: non_empty("DATABASE_URL").or(file.database.connection_uri),
            database_name: file.database.database_name,
            privilege_policy: file.privilege_policy,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_snowflake(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid {
            name,
            reason: format!("`{raw}` is not a Discord id"),
        }),
        Ok(id) => Ok(id),
    }
}
