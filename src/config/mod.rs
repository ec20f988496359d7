pub mod settings;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use settings::Settings;

pub const DEFAULT_TITLE_TEMPLATE: &str = r"/^[\S\s]*/";
pub const MAX_TITLE_LENGTH: usize = 100;

/// Mistakes in how a guild's configuration was authored.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid button color: {0}")]
    InvalidButtonColor(String),
    #[error("Invalid title regex `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplyMessageOption {
    #[default]
    Default,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToggleOption {
    On,
    #[default]
    Off,
}

/// Map a configured color name to a button style.
pub fn button_style(color: &str) -> Result<serenity::ButtonStyle, ConfigError> {
    match color.to_lowercase().as_str() {
        "blurple" => Ok(serenity::ButtonStyle::Primary),
        "green" => Ok(serenity::ButtonStyle::Success),
        "grey" => Ok(serenity::ButtonStyle::Secondary),
        "red" => Ok(serenity::ButtonStyle::Danger),
        other => Err(ConfigError::InvalidButtonColor(other.to_string())),
    }
}

/// Auto-threading settings for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutothreadChannelConfig {
    pub channel_id: serenity::ChannelId,
    pub reply_type: ReplyMessageOption,
    pub custom_reply: String,
    /// Title template; may embed a `/pattern/flags` segment.
    pub custom_title: String,
    pub regex_join_text: String,
    pub title_max_length: usize,
    /// Seconds, 0 disables slowmode.
    pub slowmode: u16,
    pub include_bots: bool,
    pub autojoin_role: Option<serenity::RoleId>,
    pub status_reactions: ToggleOption,
    pub close_button_text: String,
    pub close_button_style: String,
    pub title_button_text: String,
    pub title_button_style: String,
}

impl AutothreadChannelConfig {
    pub fn new(channel_id: serenity::ChannelId) -> Self {
        Self {
            channel_id,
            ..Default::default()
        }
    }
}

impl Default for AutothreadChannelConfig {
    fn default() -> Self {
        Self {
            channel_id: serenity::ChannelId::new(1),
            reply_type: ReplyMessageOption::Default,
            custom_reply: String::new(),
            custom_title: DEFAULT_TITLE_TEMPLATE.to_string(),
            regex_join_text: String::new(),
            title_max_length: 50,
            slowmode: 0,
            include_bots: false,
            autojoin_role: None,
            status_reactions: ToggleOption::Off,
            close_button_text: "Archive thread".to_string(),
            close_button_style: "green".to_string(),
            title_button_text: "Edit title".to_string(),
            title_button_style: "blurple".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildConfig {
    pub settings: Settings,
    pub thread_channels: Vec<AutothreadChannelConfig>,
}

impl GuildConfig {
    pub fn channel(&self, channel_id: serenity::ChannelId) -> Option<&AutothreadChannelConfig> {
        self.thread_channels
            .iter()
            .find(|c| c.channel_id == channel_id)
    }
}

/// Per-guild configuration, one JSON file per guild.
pub struct ConfigStore {
    dir: Option<PathBuf>,
    guilds: RwLock<HashMap<serenity::GuildId, GuildConfig>>,
}

impl ConfigStore {
    pub async fn load(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create config dir {:?}", dir))?;

        let mut guilds = HashMap::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(guild_id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            else {
                warn!(?path, "Skipping config file without a guild id name");
                continue;
            };

            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<GuildConfig>(&bytes) {
                Ok(config) => {
                    guilds.insert(serenity::GuildId::new(guild_id), config);
                }
                Err(e) => warn!(?path, "Failed to parse guild config: {}", e),
            }
        }

        info!(guilds = guilds.len(), "Guild configs loaded");
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            guilds: RwLock::new(guilds),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            guilds: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, guild_id: serenity::GuildId) -> GuildConfig {
        self.guilds
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn channel_config(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Option<AutothreadChannelConfig> {
        self.guilds
            .read()
            .await
            .get(&guild_id)
            .and_then(|g| g.channel(channel_id))
            .cloned()
    }

    /// Insert or replace the auto-thread config for `config.channel_id`.
    pub async fn set_channel(
        &self,
        guild_id: serenity::GuildId,
        config: AutothreadChannelConfig,
    ) -> Result<()> {
        let snapshot = {
            let mut guilds = self.guilds.write().await;
            let guild = guilds.entry(guild_id).or_default();
            match guild
                .thread_channels
                .iter_mut()
                .find(|c| c.channel_id == config.channel_id)
            {
                Some(existing) => *existing = config,
                None => guild.thread_channels.push(config),
            }
            guild.clone()
        };
        self.persist(guild_id, &snapshot).await
    }

    /// Returns whether the channel was configured.
    pub async fn remove_channel(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Result<bool> {
        let snapshot = {
            let mut guilds = self.guilds.write().await;
            let Some(guild) = guilds.get_mut(&guild_id) else {
                return Ok(false);
            };
            let before = guild.thread_channels.len();
            guild.thread_channels.retain(|c| c.channel_id != channel_id);
            if guild.thread_channels.len() == before {
                return Ok(false);
            }
            guild.clone()
        };
        self.persist(guild_id, &snapshot).await?;
        Ok(true)
    }

    async fn persist(&self, guild_id: serenity::GuildId, config: &GuildConfig) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = dir.join(format!("{}.json", guild_id));
        let bytes = serde_json::to_vec_pretty(config).context("serialize guild config")?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        debug!(%guild_id, "guild config saved");
        Ok(())
    }
}
