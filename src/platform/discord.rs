//! serenity adapter: turns gateway payloads into `model` types and implements
//! [`Platform`] / [`InteractionResponder`] over the Discord HTTP API and cache.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use super::{InteractionResponder, Platform};
use crate::config::{ConfigStore, Settings, MAX_TITLE_LENGTH};
use crate::interaction::InteractionContext;
use crate::model::{
    Author, ButtonSpec, ChannelKind, EmbedText, IncomingMessage, InteractionChannel,
    InteractionMember, NewThread, ReplyMessage, ThreadInfo,
};

/// Custom id shared by the title modal and its text input.
pub const TITLE_MODAL_ID: &str = "title";

fn channel_kind(channel: &serenity::GuildChannel) -> ChannelKind {
    match channel.kind {
        serenity::ChannelType::Text => ChannelKind::Text {
            default_auto_archive: channel.default_auto_archive_duration,
        },
        serenity::ChannelType::News => ChannelKind::News {
            default_auto_archive: channel.default_auto_archive_duration,
        },
        serenity::ChannelType::PublicThread
        | serenity::ChannelType::PrivateThread
        | serenity::ChannelType::NewsThread => ChannelKind::Thread,
        serenity::ChannelType::Voice | serenity::ChannelType::Stage => ChannelKind::Voice,
        _ => ChannelKind::Other,
    }
}

/// Anything but user content, replies and application command responses.
fn is_system_message(kind: serenity::MessageType) -> bool {
    !matches!(
        kind,
        serenity::MessageType::Regular
            | serenity::MessageType::InlineReply
            | serenity::MessageType::ChatInputCommand
            | serenity::MessageType::ContextMenuCommand
    )
}

fn is_not_found(error: &::serenity::Error) -> bool {
    matches!(
        error,
        ::serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

fn clean(ctx: &serenity::Context, message: &serenity::Message, text: &str) -> String {
    ::serenity::utils::content_safe(
        ctx,
        text,
        &::serenity::utils::ContentSafeOptions::default(),
        &message.mentions,
    )
}

/// Build the platform-neutral view of a gateway message.
pub async fn incoming_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
) -> Result<IncomingMessage> {
    let (channel, channel_name) = match message.channel(ctx).await? {
        serenity::Channel::Guild(channel) => (channel_kind(&channel), channel.name.clone()),
        _ => (ChannelKind::Other, String::new()),
    };
    let guild_available = message
        .guild_id
        .is_some_and(|guild_id| ctx.cache.guild(guild_id).is_some());
    let bot_user_id = ctx.cache.current_user().id;

    let display_name = message
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| message.author.global_name.clone())
        .unwrap_or_else(|| message.author.name.clone());

    let embeds = message
        .embeds
        .iter()
        .map(|embed| EmbedText {
            title: embed.title.as_deref().map(|t| clean(ctx, message, t)),
            description: embed.description.as_deref().map(|d| clean(ctx, message, d)),
            fields: embed
                .fields
                .iter()
                .map(|f| (clean(ctx, message, &f.name), clean(ctx, message, &f.value)))
                .collect(),
            footer: embed.footer.as_ref().map(|f| clean(ctx, message, &f.text)),
        })
        .collect();

    let thread = message.thread.as_ref().map(|t| ThreadInfo {
        id: t.id,
        name: t.name.clone(),
    });
    let has_thread = thread.is_some()
        || message
            .flags
            .is_some_and(|f| f.contains(serenity::MessageFlags::HAS_THREAD));

    Ok(IncomingMessage {
        id: message.id,
        channel_id: message.channel_id,
        channel_name,
        channel,
        guild_id: message.guild_id,
        guild_available,
        author: Author {
            id: message.author.id,
            name: message.author.name.clone(),
            display_name,
            bot: message.author.bot,
        },
        is_system: is_system_message(message.kind),
        clean_content: message.content_safe(ctx),
        embeds,
        thread,
        has_thread,
        bot_user_id,
    })
}

pub struct DiscordPlatform {
    ctx: serenity::Context,
}

impl DiscordPlatform {
    pub fn new(ctx: &serenity::Context) -> Self {
        Self { ctx: ctx.clone() }
    }

    async fn guild_channel(&self, channel_id: serenity::ChannelId) -> Result<serenity::GuildChannel> {
        channel_id
            .to_channel(&self.ctx)
            .await?
            .guild()
            .ok_or_else(|| anyhow!("{} is not a guild channel", channel_id))
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    async fn bot_permissions_in(
        &self,
        channel_id: serenity::ChannelId,
    ) -> Result<serenity::Permissions> {
        let mut channel = self.guild_channel(channel_id).await?;
        if matches!(channel_kind(&channel), ChannelKind::Thread) {
            if let Some(parent_id) = channel.parent_id {
                channel = self.guild_channel(parent_id).await?;
            }
        }

        let bot_id = self.ctx.cache.current_user().id;
        let cached = self
            .ctx
            .cache
            .member(channel.guild_id, bot_id)
            .map(|member| member.clone());
        let member = match cached {
            Some(member) => member,
            None => channel.guild_id.member(&self.ctx, bot_id).await?,
        };

        let guild = self
            .ctx
            .cache
            .guild(channel.guild_id)
            .ok_or_else(|| anyhow!("guild {} is not cached", channel.guild_id))?;
        Ok(guild.user_permissions_in(&channel, &member))
    }

    async fn send_message(
        &self,
        channel_id: serenity::ChannelId,
        content: String,
    ) -> Result<serenity::MessageId> {
        Ok(channel_id.say(&self.ctx, content).await?.id)
    }

    async fn start_thread(
        &self,
        message: &IncomingMessage,
        thread: NewThread,
    ) -> Result<ThreadInfo> {
        let mut builder =
            serenity::CreateThread::new(thread.name).auto_archive_duration(thread.auto_archive);
        if let Some(seconds) = thread.slowmode {
            builder = builder.rate_limit_per_user(seconds);
        }

        let created = message
            .channel_id
            .create_thread_from_message(&self.ctx, message.id, builder)
            .await?;
        Ok(ThreadInfo {
            id: created.id,
            name: created.name,
        })
    }

    async fn fetch_thread(&self, message: &IncomingMessage) -> Result<Option<ThreadInfo>> {
        let fresh = message.channel_id.message(&self.ctx, message.id).await?;
        if let Some(thread) = fresh.thread {
            return Ok(Some(ThreadInfo {
                id: thread.id,
                name: thread.name,
            }));
        }

        // A thread started from a message shares the message's id.
        match serenity::ChannelId::new(message.id.get())
            .to_channel(&self.ctx)
            .await
        {
            Ok(channel) => Ok(channel.guild().map(|thread| ThreadInfo {
                id: thread.id,
                name: thread.name,
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn rename_thread(&self, thread_id: serenity::ChannelId, name: String) -> Result<()> {
        thread_id
            .edit_thread(&self.ctx, serenity::EditThread::new().name(name))
            .await?;
        Ok(())
    }

    async fn archive_thread(&self, thread_id: serenity::ChannelId) -> Result<()> {
        thread_id
            .edit_thread(&self.ctx, serenity::EditThread::new().archived(true))
            .await?;
        Ok(())
    }

    async fn role_members(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> Result<Option<Vec<serenity::UserId>>> {
        let guild = self
            .ctx
            .cache
            .guild(guild_id)
            .ok_or_else(|| anyhow!("guild {} is not cached", guild_id))?;
        if !guild.roles.contains_key(&role_id) {
            return Ok(None);
        }

        Ok(Some(
            guild
                .members
                .values()
                .filter(|m| m.roles.contains(&role_id))
                .map(|m| m.user.id)
                .collect(),
        ))
    }

    async fn add_thread_member(
        &self,
        thread_id: serenity::ChannelId,
        user_id: serenity::UserId,
    ) -> Result<()> {
        thread_id.add_thread_member(&self.ctx, user_id).await?;
        Ok(())
    }

    async fn react(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
        emoji: &str,
    ) -> Result<()> {
        let reaction = serenity::ReactionType::try_from(emoji)
            .map_err(|_| anyhow!("Invalid emoji: {}", emoji))?;
        channel_id
            .create_reaction(&self.ctx, message_id, reaction)
            .await?;
        Ok(())
    }

    async fn send_reply(
        &self,
        channel_id: serenity::ChannelId,
        reply: ReplyMessage,
    ) -> Result<serenity::MessageId> {
        let mut builder = serenity::CreateMessage::new().content(reply.content);
        if !reply.buttons.is_empty() {
            builder = builder.components(vec![serenity::CreateActionRow::Buttons(
                reply
                    .buttons
                    .iter()
                    .map(ButtonSpec::to_create_button)
                    .collect(),
            )]);
        }
        Ok(channel_id.send_message(&self.ctx, builder).await?.id)
    }

    async fn pin_message(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    ) -> Result<()> {
        channel_id.pin(&self.ctx, message_id).await?;
        Ok(())
    }

    async fn delete_latest_message(&self, channel_id: serenity::ChannelId) -> Result<()> {
        let latest = channel_id
            .messages(&self.ctx, serenity::GetMessages::new().limit(1))
            .await?;
        if let Some(message) = latest.first() {
            message.delete(&self.ctx).await?;
        }
        Ok(())
    }
}

/// The interaction a [`DiscordResponder`] answers.
pub enum ResponseTarget {
    Command(Box<serenity::CommandInteraction>),
    Component(Box<serenity::ComponentInteraction>),
    Modal(Box<serenity::ModalInteraction>),
}

impl ResponseTarget {
    fn origin(&self) -> (Option<serenity::GuildId>, serenity::ChannelId, Option<InteractionMember>) {
        let (guild_id, channel_id, member, user) = match self {
            ResponseTarget::Command(i) => (
                i.guild_id,
                i.channel_id,
                i.member.as_deref(),
                &i.user,
            ),
            ResponseTarget::Component(i) => (
                i.guild_id,
                i.channel_id,
                i.member.as_ref(),
                &i.user,
            ),
            ResponseTarget::Modal(i) => (
                i.guild_id,
                i.channel_id,
                i.member.as_ref(),
                &i.user,
            ),
        };

        let member = member.map(|m| InteractionMember {
            user_id: user.id,
            display_name: m
                .nick
                .clone()
                .or_else(|| user.global_name.clone())
                .unwrap_or_else(|| user.name.clone()),
            permissions: m.permissions.unwrap_or_else(serenity::Permissions::empty),
        });
        (guild_id, channel_id, member)
    }

    async fn respond(
        &self,
        ctx: &serenity::Context,
        response: serenity::CreateInteractionResponse,
    ) -> Result<()> {
        match self {
            ResponseTarget::Command(i) => i.create_response(ctx, response).await?,
            ResponseTarget::Component(i) => i.create_response(ctx, response).await?,
            ResponseTarget::Modal(i) => i.create_response(ctx, response).await?,
        }
        Ok(())
    }
}

pub struct DiscordResponder {
    ctx: serenity::Context,
    target: ResponseTarget,
}

#[async_trait]
impl InteractionResponder for DiscordResponder {
    async fn reply(&self, content: String, ephemeral: bool) -> Result<()> {
        let response = serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(ephemeral),
        );
        self.target.respond(&self.ctx, response).await
    }

    async fn ask_for_title(&self, current: &str) -> Result<()> {
        if matches!(self.target, ResponseTarget::Modal(_)) {
            bail!("a modal submission cannot open another modal");
        }

        let input = serenity::CreateInputText::new(
            serenity::InputTextStyle::Short,
            "New title",
            TITLE_MODAL_ID,
        )
        .value(current)
        .max_length(MAX_TITLE_LENGTH as u16);
        let modal = serenity::CreateModal::new(TITLE_MODAL_ID, "Change thread title")
            .components(vec![serenity::CreateActionRow::InputText(input)]);
        self.target
            .respond(&self.ctx, serenity::CreateInteractionResponse::Modal(modal))
            .await
    }
}

/// The value typed into a modal's text input.
pub fn modal_input(modal: &serenity::ModalInteraction, custom_id: &str) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

async fn interaction_channel(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
) -> Result<InteractionChannel> {
    let Some(channel) = channel_id.to_channel(ctx).await?.guild() else {
        return Ok(InteractionChannel {
            id: channel_id,
            name: String::new(),
            kind: ChannelKind::Other,
            thread_author: None,
        });
    };

    let kind = channel_kind(&channel);
    let thread_author = if kind.is_thread() {
        thread_author(ctx, &channel).await
    } else {
        None
    };

    Ok(InteractionChannel {
        id: channel.id,
        name: channel.name.clone(),
        kind,
        thread_author,
    })
}

/// Author of the message a thread was started from, falling back to the thread owner.
async fn thread_author(
    ctx: &serenity::Context,
    thread: &serenity::GuildChannel,
) -> Option<serenity::UserId> {
    if let Some(parent_id) = thread.parent_id {
        if let Ok(starter) = parent_id
            .message(ctx, serenity::MessageId::new(thread.id.get()))
            .await
        {
            return Some(starter.author.id);
        }
    }
    thread.owner_id
}

pub async fn interaction_context(
    ctx: &serenity::Context,
    configs: &ConfigStore,
    target: ResponseTarget,
) -> Result<InteractionContext> {
    let (guild_id, channel_id, member) = target.origin();
    let channel = interaction_channel(ctx, channel_id).await?;
    let settings = match guild_id {
        Some(guild_id) => configs.get(guild_id).await.settings,
        None => Settings::default(),
    };

    Ok(InteractionContext::new(
        guild_id,
        channel,
        member,
        settings,
        Arc::new(DiscordPlatform::new(ctx)),
        Arc::new(DiscordResponder {
            ctx: ctx.clone(),
            target,
        }),
    ))
}
