use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use super::NeedleButton;
use crate::commands::CommandRegistry;
use crate::interaction::InteractionContext;
use crate::model::ButtonSpec;

/// Opens a prompt for a new thread title; the submitted title runs the `title` command.
pub struct TitleButton {
    commands: Arc<CommandRegistry>,
}

impl TitleButton {
    pub fn new(commands: Arc<CommandRegistry>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl NeedleButton for TitleButton {
    fn custom_id(&self) -> &'static str {
        "title"
    }

    fn builder(&self, text: &str) -> ButtonSpec {
        ButtonSpec {
            custom_id: self.custom_id().to_string(),
            label: text.to_string(),
            style: serenity::ButtonStyle::Primary,
            emoji: Some(serenity::ReactionType::Unicode("✏️".to_string())),
        }
    }

    async fn press(&self, context: &InteractionContext) -> Result<()> {
        let Some(member) = context.member.as_ref().filter(|_| context.is_in_guild()) else {
            return Ok(());
        };

        let title_command = self.commands.get(self.custom_id())?;
        if !title_command.has_permission_to_execute_here(member, &context.channel) {
            return context
                .reply_in_secret(context.settings.error_insufficient_user_perms.clone())
                .await;
        }
        if !context.channel.kind.is_thread() {
            return context
                .reply_in_secret(context.settings.error_only_in_thread.clone())
                .await;
        }

        context.ask_for_title().await
    }
}
