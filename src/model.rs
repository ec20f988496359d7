//! Platform-neutral views of the chat entities Needle works with.
//!
//! The Discord adapter in `platform::discord` builds these from serenity types so the
//! services never branch on serenity's channel hierarchy.

use poise::serenity_prelude as serenity;

/// The kinds of channel a message can arrive in.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelKind {
    Text {
        default_auto_archive: Option<serenity::AutoArchiveDuration>,
    },
    News {
        default_auto_archive: Option<serenity::AutoArchiveDuration>,
    },
    Thread,
    Voice,
    /// DMs, categories, forums and anything else that cannot host an auto thread.
    Other,
}

impl ChannelKind {
    pub fn is_thread(&self) -> bool {
        matches!(self, ChannelKind::Thread)
    }

    /// The auto-archive default for channels that can host threads.
    pub fn thread_host_archive_default(&self) -> Option<Option<serenity::AutoArchiveDuration>> {
        match self {
            ChannelKind::Text {
                default_auto_archive,
            }
            | ChannelKind::News {
                default_auto_archive,
            } => Some(*default_auto_archive),
            ChannelKind::Thread | ChannelKind::Voice | ChannelKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: serenity::UserId,
    pub name: String,
    pub display_name: String,
    pub bot: bool,
}

/// Text parts of an embed, already cleaned of mentions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedText {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<(String, String)>,
    pub footer: Option<String>,
}

impl EmbedText {
    pub fn flatten(&self) -> String {
        let mut fields = String::new();
        for (name, value) in &self.fields {
            fields.push_str(&format!("{}\n{}\n\n", name, value));
        }
        format!(
            "{}\n\n{}\n\n{}{}\n\n",
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
            fields,
            self.footer.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadInfo {
    pub id: serenity::ChannelId,
    pub name: String,
}

/// An inbound message, as much of it as auto-threading looks at.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: serenity::MessageId,
    pub channel_id: serenity::ChannelId,
    pub channel_name: String,
    pub channel: ChannelKind,
    pub guild_id: Option<serenity::GuildId>,
    pub guild_available: bool,
    pub author: Author,
    pub is_system: bool,
    pub clean_content: String,
    pub embeds: Vec<EmbedText>,
    pub thread: Option<ThreadInfo>,
    pub has_thread: bool,
    pub bot_user_id: serenity::UserId,
}

impl IncomingMessage {
    pub fn link(&self) -> String {
        match self.guild_id {
            Some(guild_id) => format!(
                "https://discord.com/channels/{}/{}/{}",
                guild_id, self.channel_id, self.id
            ),
            None => format!(
                "https://discord.com/channels/@me/{}/{}",
                self.channel_id, self.id
            ),
        }
    }
}

/// A button ready to be rendered by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonSpec {
    pub custom_id: String,
    pub label: String,
    pub style: serenity::ButtonStyle,
    pub emoji: Option<serenity::ReactionType>,
}

impl ButtonSpec {
    pub fn to_create_button(&self) -> serenity::CreateButton {
        let mut button = serenity::CreateButton::new(self.custom_id.clone())
            .label(self.label.clone())
            .style(self.style);
        if let Some(emoji) = &self.emoji {
            button = button.emoji(emoji.clone());
        }
        button
    }
}

/// Outgoing thread reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyMessage {
    pub content: String,
    pub buttons: Vec<ButtonSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewThread {
    pub name: String,
    pub slowmode: Option<u16>,
    pub auto_archive: serenity::AutoArchiveDuration,
}

/// The channel an interaction was triggered in.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionChannel {
    pub id: serenity::ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    /// For threads, the author of the message the thread was started from.
    pub thread_author: Option<serenity::UserId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMember {
    pub user_id: serenity::UserId,
    pub display_name: String,
    pub permissions: serenity::Permissions,
}
