use poise::serenity_prelude as serenity;

use crate::model::{IncomingMessage, ThreadInfo};

/// Template variables a message can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    User,
    UserName,
    UserNickname,
    Channel,
    ChannelName,
    Thread,
    ThreadName,
    MessageLink,
    Time,
    Newline,
}

impl Variable {
    /// Longest token first so `$USER` never eats the front of `$USER_NAME`.
    pub const ALL: [Variable; 10] = [
        Variable::UserNickname,
        Variable::ChannelName,
        Variable::MessageLink,
        Variable::ThreadName,
        Variable::UserName,
        Variable::Newline,
        Variable::Channel,
        Variable::Thread,
        Variable::User,
        Variable::Time,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Variable::User => "$USER",
            Variable::UserName => "$USER_NAME",
            Variable::UserNickname => "$USER_NICKNAME",
            Variable::Channel => "$CHANNEL",
            Variable::ChannelName => "$CHANNEL_NAME",
            Variable::Thread => "$THREAD",
            Variable::ThreadName => "$THREAD_NAME",
            Variable::MessageLink => "$MESSAGE_LINK",
            Variable::Time => "$TIME",
            Variable::Newline => "$NEWLINE",
        }
    }
}

/// Substitution context for one message being processed.
#[derive(Debug, Clone)]
pub struct MessageVariables {
    user_id: serenity::UserId,
    user_name: String,
    user_nickname: String,
    channel_id: serenity::ChannelId,
    channel_name: String,
    message_link: String,
    unix_time: i64,
    thread: Option<ThreadInfo>,
}

impl MessageVariables {
    pub fn from_message(message: &IncomingMessage) -> Self {
        Self {
            user_id: message.author.id,
            user_name: message.author.name.clone(),
            user_nickname: message.author.display_name.clone(),
            channel_id: message.channel_id,
            channel_name: message.channel_name.clone(),
            message_link: message.link(),
            unix_time: chrono::Utc::now().timestamp(),
            thread: message.thread.clone(),
        }
    }

    pub fn set_thread(&mut self, thread: ThreadInfo) {
        self.thread = Some(thread);
    }

    fn value(&self, variable: Variable) -> String {
        match variable {
            Variable::User => format!("<@{}>", self.user_id),
            Variable::UserName => self.user_name.clone(),
            Variable::UserNickname => self.user_nickname.clone(),
            Variable::Channel => format!("<#{}>", self.channel_id),
            Variable::ChannelName => self.channel_name.clone(),
            Variable::Thread => self
                .thread
                .as_ref()
                .map(|t| format!("<#{}>", t.id))
                .unwrap_or_default(),
            Variable::ThreadName => self
                .thread
                .as_ref()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            Variable::MessageLink => self.message_link.clone(),
            Variable::Time => format!("<t:{}:R>", self.unix_time),
            Variable::Newline => "\n".to_string(),
        }
    }

    /// Resolve every variable in `template`.
    pub fn replace(&self, template: &str) -> String {
        substitute(template, |v| self.value(v))
    }

    /// Strip every variable token out of user-written text.
    pub fn remove_from(&self, text: &str) -> String {
        substitute(text, |_| String::new())
    }
}

/// Single left-to-right pass so substituted values are never re-scanned.
fn substitute(input: &str, value: impl Fn(Variable) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match Variable::ALL.iter().find(|v| tail.starts_with(v.token())) {
            Some(variable) => {
                out.push_str(&value(*variable));
                rest = &tail[variable.token().len()..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Author, ChannelKind};

    pub(crate) fn message(content: &str) -> IncomingMessage {
        IncomingMessage {
            id: serenity::MessageId::new(300),
            channel_id: serenity::ChannelId::new(200),
            channel_name: "help".to_string(),
            channel: ChannelKind::Text {
                default_auto_archive: None,
            },
            guild_id: Some(serenity::GuildId::new(100)),
            guild_available: true,
            author: Author {
                id: serenity::UserId::new(400),
                name: "alice".to_string(),
                display_name: "Alice".to_string(),
                bot: false,
            },
            is_system: false,
            clean_content: content.to_string(),
            embeds: vec![],
            thread: None,
            has_thread: false,
            bot_user_id: serenity::UserId::new(1),
        }
    }

    #[test]
    fn test_replace_user_and_channel() {
        let vars = MessageVariables::from_message(&message("hi"));
        assert_eq!(
            vars.replace("Thread by $USER in $CHANNEL"),
            "Thread by <@400> in <#200>"
        );
    }

    #[test]
    fn test_longer_tokens_win() {
        let vars = MessageVariables::from_message(&message("hi"));
        assert_eq!(
            vars.replace("$USER_NAME / $USER_NICKNAME / $CHANNEL_NAME"),
            "alice / Alice / help"
        );
    }

    #[test]
    fn test_thread_variables_empty_until_set() {
        let mut vars = MessageVariables::from_message(&message("hi"));
        assert_eq!(vars.replace("[$THREAD_NAME]"), "[]");

        vars.set_thread(ThreadInfo {
            id: serenity::ChannelId::new(300),
            name: "Question".to_string(),
        });
        assert_eq!(vars.replace("$THREAD: $THREAD_NAME"), "<#300>: Question");
    }

    #[test]
    fn test_message_link() {
        let vars = MessageVariables::from_message(&message("hi"));
        assert_eq!(
            vars.replace("$MESSAGE_LINK"),
            "https://discord.com/channels/100/200/300"
        );
    }

    #[test]
    fn test_remove_from_strips_tokens_and_keeps_plain_dollars() {
        let vars = MessageVariables::from_message(&message("hi"));
        assert_eq!(
            vars.remove_from("costs $5 for $USER_NAME$NEWLINE"),
            "costs $5 for "
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut msg = message("hi");
        msg.author.name = "$USER".to_string();
        let vars = MessageVariables::from_message(&msg);
        assert_eq!(vars.replace("$USER_NAME"), "$USER");
    }
}
