use anyhow::Result;
use tracing::{error, info};

use crate::commands::NeedleCommand;
use crate::interaction::InteractionContext;

/// Runs commands on behalf of slash commands, buttons and modals.
#[derive(Default)]
pub struct CommandExecutorService;

impl CommandExecutorService {
    pub fn new() -> Self {
        Self
    }

    /// Run `command`. A failing command is logged and answered with the guild's
    /// generic error reply instead of bubbling up to the event loop.
    pub async fn execute(
        &self,
        command: &dyn NeedleCommand,
        context: &InteractionContext,
    ) -> Result<()> {
        info!(
            command = command.name(),
            channel = %context.channel.id,
            user = ?context.member.as_ref().map(|m| m.user_id),
            "Executing command"
        );

        if let Err(e) = command.execute(context).await {
            error!(command = command.name(), "Command failed: {:#}", e);
            context
                .reply_in_secret(context.settings.error_unknown.clone())
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use poise::serenity_prelude as serenity;

    use crate::config::Settings;
    use crate::interaction::tests::{context, member, thread_channel};

    struct Failing;

    #[async_trait]
    impl NeedleCommand for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn required_permissions(&self) -> serenity::Permissions {
            serenity::Permissions::empty()
        }

        async fn execute(&self, _context: &InteractionContext) -> Result<()> {
            bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_failure_is_reported_privately() {
        let (ctx, _, responder) = context(
            thread_channel(),
            Some(member(1, serenity::Permissions::empty())),
        );

        CommandExecutorService::new()
            .execute(&Failing, &ctx)
            .await
            .unwrap();

        let replies = responder.replies.lock().unwrap().clone();
        assert_eq!(replies, vec![(Settings::default().error_unknown, true)]);
    }
}
