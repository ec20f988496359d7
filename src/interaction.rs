use std::sync::Arc;

use anyhow::Result;
use poise::serenity_prelude as serenity;

use crate::config::Settings;
use crate::model::{InteractionChannel, InteractionMember};
use crate::platform::{InteractionResponder, Platform};

/// Everything a command or button needs to act on one interaction.
pub struct InteractionContext {
    pub guild_id: Option<serenity::GuildId>,
    pub channel: InteractionChannel,
    pub member: Option<InteractionMember>,
    pub settings: Settings,
    /// Free-form user input, e.g. the title typed into a modal.
    pub input: Option<String>,
    pub platform: Arc<dyn Platform>,
    responder: Arc<dyn InteractionResponder>,
}

impl InteractionContext {
    pub fn new(
        guild_id: Option<serenity::GuildId>,
        channel: InteractionChannel,
        member: Option<InteractionMember>,
        settings: Settings,
        platform: Arc<dyn Platform>,
        responder: Arc<dyn InteractionResponder>,
    ) -> Self {
        Self {
            guild_id,
            channel,
            member,
            settings,
            input: None,
            platform,
            responder,
        }
    }

    pub fn with_input(mut self, input: Option<String>) -> Self {
        self.input = input;
        self
    }

    pub fn is_in_guild(&self) -> bool {
        self.guild_id.is_some() && self.member.is_some()
    }

    pub async fn reply_in_secret(&self, content: impl Into<String>) -> Result<()> {
        self.responder.reply(content.into(), true).await
    }

    pub async fn reply_in_public(&self, content: impl Into<String>) -> Result<()> {
        self.responder.reply(content.into(), false).await
    }

    pub async fn ask_for_title(&self) -> Result<()> {
        self.responder.ask_for_title(&self.channel.name).await
    }
}
