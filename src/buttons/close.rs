use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use super::NeedleButton;
use crate::commands::CommandRegistry;
use crate::interaction::InteractionContext;
use crate::model::ButtonSpec;
use crate::services::CommandExecutorService;

const ARCHIVE_EMOJI_ID: u64 = 1010182198923636797;

/// Archives the thread it is attached to, through the `close` command.
pub struct CloseButton {
    commands: Arc<CommandRegistry>,
    executor: Arc<CommandExecutorService>,
}

impl CloseButton {
    pub fn new(commands: Arc<CommandRegistry>, executor: Arc<CommandExecutorService>) -> Self {
        Self { commands, executor }
    }
}

#[async_trait]
impl NeedleButton for CloseButton {
    fn custom_id(&self) -> &'static str {
        "close"
    }

    fn builder(&self, text: &str) -> ButtonSpec {
        ButtonSpec {
            custom_id: self.custom_id().to_string(),
            label: text.to_string(),
            style: serenity::ButtonStyle::Success,
            emoji: Some(serenity::ReactionType::Custom {
                animated: false,
                id: serenity::EmojiId::new(ARCHIVE_EMOJI_ID),
                name: Some("archive".to_string()),
            }),
        }
    }

    async fn press(&self, context: &InteractionContext) -> Result<()> {
        if !context.is_in_guild() {
            return Ok(());
        }
        let Some(member) = &context.member else {
            return Ok(());
        };

        let close_command = self.commands.get(self.custom_id())?;
        if !close_command.has_permission_to_execute_here(member, &context.channel) {
            return context
                .reply_in_secret(context.settings.error_insufficient_user_perms.clone())
                .await;
        }

        self.executor
            .execute(close_command.as_ref(), context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::interaction::tests::{context, member, thread_channel, AUTHOR_ID, THREAD_ID};
    use crate::platform::fake::Call;

    fn button() -> CloseButton {
        CloseButton::new(
            Arc::new(CommandRegistry::new()),
            Arc::new(CommandExecutorService::new()),
        )
    }

    #[test]
    fn test_builder_is_green_with_icon() {
        let spec = button().builder("Archive");
        assert_eq!(spec.custom_id, "close");
        assert_eq!(spec.label, "Archive");
        assert_eq!(spec.style, serenity::ButtonStyle::Success);
        assert!(spec.emoji.is_some());
    }

    #[tokio::test]
    async fn test_press_outside_guild_does_nothing() {
        let (ctx, platform, responder) = context(thread_channel(), None);

        button().press(&ctx).await.unwrap();

        assert!(platform.calls().is_empty());
        assert!(responder.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_press_without_permission_replies_in_secret() {
        let (ctx, platform, responder) = context(
            thread_channel(),
            Some(member(12345, serenity::Permissions::SEND_MESSAGES)),
        );

        button().press(&ctx).await.unwrap();

        assert!(platform.calls().is_empty());
        let replies = responder.replies.lock().unwrap().clone();
        assert_eq!(
            replies,
            vec![(Settings::default().error_insufficient_user_perms, true)]
        );
    }

    #[tokio::test]
    async fn test_press_by_author_runs_close_command() {
        let (ctx, platform, _) = context(
            thread_channel(),
            Some(member(AUTHOR_ID, serenity::Permissions::empty())),
        );

        button().press(&ctx).await.unwrap();

        assert_eq!(
            platform.calls(),
            vec![Call::ArchiveThread(serenity::ChannelId::new(THREAD_ID))]
        );
    }
}
