use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::info;

use super::NeedleCommand;
use crate::config::MAX_TITLE_LENGTH;
use crate::interaction::InteractionContext;
use crate::state::Context;
use crate::text::clamp_with_ellipsis;

pub struct TitleCommand;

#[async_trait]
impl NeedleCommand for TitleCommand {
    fn name(&self) -> &'static str {
        "title"
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

        let Some(title) = context
            .input
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return context
                .reply_in_secret(context.settings.error_no_title.clone())
                .await;
        };

        let title = clamp_with_ellipsis(title, MAX_TITLE_LENGTH);
        if title != context.channel.name {
            context
                .platform
                .rename_thread(context.channel.id, title.clone())
                .await?;
            info!(thread = %context.channel.id, title = %title, "Thread renamed");
        }

        context
            .reply_in_secret(context.settings.success_thread_renamed.clone())
            .await
    }
}

/// Change the title of the current thread
#[poise::command(slash_command, guild_only)]
pub async fn title(
    ctx: Context<'_>,
    #[description = "New thread title"] value: String,
) -> Result<(), anyhow::Error> {
    super::run_slash(ctx, "title", Some(value)).await
}
