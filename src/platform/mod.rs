pub mod discord;
#[cfg(test)]
pub mod fake;

use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use crate::model::{IncomingMessage, NewThread, ReplyMessage, ThreadInfo};

/// Every chat-platform call the bot makes.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The bot's effective permissions in a channel. Threads resolve through their parent.
    async fn bot_permissions_in(&self, channel_id: serenity::ChannelId)
        -> Result<serenity::Permissions>;

    async fn send_message(
        &self,
        channel_id: serenity::ChannelId,
        content: String,
    ) -> Result<serenity::MessageId>;

    async fn start_thread(&self, message: &IncomingMessage, thread: NewThread)
        -> Result<ThreadInfo>;

    /// Re-read the thread attached to a message.
    async fn fetch_thread(&self, message: &IncomingMessage) -> Result<Option<ThreadInfo>>;

    async fn rename_thread(&self, thread_id: serenity::ChannelId, name: String) -> Result<()>;

    async fn archive_thread(&self, thread_id: serenity::ChannelId) -> Result<()>;

    /// Members holding a role, or `None` if the role no longer exists.
    async fn role_members(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> Result<Option<Vec<serenity::UserId>>>;

    async fn add_thread_member(
        &self,
        thread_id: serenity::ChannelId,
        user_id: serenity::UserId,
    ) -> Result<()>;

    async fn react(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
        emoji: &str,
    ) -> Result<()>;

    async fn send_reply(
        &self,
        channel_id: serenity::ChannelId,
        reply: ReplyMessage,
    ) -> Result<serenity::MessageId>;

    async fn pin_message(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    ) -> Result<()>;

    /// Delete whatever message is currently newest in the channel.
    async fn delete_latest_message(&self, channel_id: serenity::ChannelId) -> Result<()>;
}

/// Replies to the interaction that is being handled.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn reply(&self, content: String, ephemeral: bool) -> Result<()>;

    /// Prompt the user for a new thread title.
    async fn ask_for_title(&self, current: &str) -> Result<()>;
}
