use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::info;

use super::NeedleCommand;
use crate::interaction::InteractionContext;
use crate::state::Context;

pub struct CloseCommand;

#[async_trait]
impl NeedleCommand for CloseCommand {
    fn name(&self) -> &'static str {
        "close"
    }

    fn required_permissions(&self) -> serenity::Permissions {
        serenity::Permissions::MANAGE_THREADS
    }

    fn allows_thread_author(&self) -> bool {
        true
    }

    async fn execute(&self, context: &InteractionContext) -> Result<()> {
        if !context.channel.kind.is_thread() {
            return context
                .reply_in_secret(context.settings.error_only_in_thread.clone())
                .await;
        }

        // Reply first: an archived thread rejects the interaction response.
        context
            .reply_in_public(context.settings.success_thread_archived.clone())
            .await?;
        context.platform.archive_thread(context.channel.id).await?;

        info!(thread = %context.channel.id, "Thread archived");
        Ok(())
    }
}

/// Archive the current thread
#[poise::command(slash_command, guild_only)]
pub async fn close(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    super::run_slash(ctx, "close", None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::interaction::tests::{context, member, thread_channel, AUTHOR_ID, THREAD_ID};
    use crate::model::ChannelKind;
    use crate::platform::fake::Call;

    #[tokio::test]
    async fn test_close_archives_thread() {
        let (ctx, platform, responder) = context(
            thread_channel(),
            Some(member(AUTHOR_ID, serenity::Permissions::empty())),
        );

        CloseCommand.execute(&ctx).await.unwrap();

        assert_eq!(
            platform.calls(),
            vec![Call::ArchiveThread(serenity::ChannelId::new(THREAD_ID))]
        );
        let replies = responder.replies.lock().unwrap().clone();
        assert_eq!(
            replies,
            vec![(Settings::default().success_thread_archived, false)]
        );
    }

    #[tokio::test]
    async fn test_close_outside_thread_is_rejected() {
        let mut channel = thread_channel();
        channel.kind = ChannelKind::Text {
            default_auto_archive: None,
        };
        let (ctx, platform, responder) = context(
            channel,
            Some(member(AUTHOR_ID, serenity::Permissions::all())),
        );

        CloseCommand.execute(&ctx).await.unwrap();

        assert!(platform.calls().is_empty());
        let replies = responder.replies.lock().unwrap().clone();
        assert_eq!(
            replies,
            vec![(Settings::default().error_only_in_thread, true)]
        );
    }
}
