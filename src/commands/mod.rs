mod autothread;
mod close;
mod title;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use crate::interaction::InteractionContext;
use crate::model::{InteractionChannel, InteractionMember};
use crate::platform::discord;
use crate::services::CommandExecutorService;
use crate::state::Context;

pub use close::CloseCommand;
pub use title::TitleCommand;

/// A command that can be run from a slash command, a button or a modal.
#[async_trait]
pub trait NeedleCommand: Send + Sync {
    fn name(&self) -> &'static str;

    fn required_permissions(&self) -> serenity::Permissions;

    /// Whoever started a thread may run this inside it without the required permissions.
    fn allows_thread_author(&self) -> bool {
        false
    }

    fn has_permission_to_execute_here(
        &self,
        member: &InteractionMember,
        channel: &InteractionChannel,
    ) -> bool {
        if member.permissions.administrator()
            || member.permissions.contains(self.required_permissions())
        {
            return true;
        }

        self.allows_thread_author()
            && channel.kind.is_thread()
            && channel.thread_author == Some(member.user_id)
    }

    async fn execute(&self, context: &InteractionContext) -> Result<()>;
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn NeedleCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        registry.register(Arc::new(CloseCommand));
        registry.register(Arc::new(TitleCommand));
        registry
    }

    fn register(&mut self, command: Arc<dyn NeedleCommand>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn NeedleCommand>> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown command: {}", name))
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the invoking member may run `name` here, then hand it to the executor.
pub async fn run_gated(
    commands: &CommandRegistry,
    executor: &CommandExecutorService,
    name: &str,
    context: &InteractionContext,
) -> Result<()> {
    let Some(member) = context.member.as_ref().filter(|_| context.is_in_guild()) else {
        return Ok(());
    };

    let command = commands.get(name)?;
    if !command.has_permission_to_execute_here(member, &context.channel) {
        return context
            .reply_in_secret(context.settings.error_insufficient_user_perms.clone())
            .await;
    }

    executor.execute(command.as_ref(), context).await
}

/// Run a registry command from its slash-command wrapper.
async fn run_slash(ctx: Context<'_>, name: &str, input: Option<String>) -> Result<()> {
    let poise::Context::Application(app) = ctx else {
        return Ok(());
    };
    let data = ctx.data();
    let context = discord::interaction_context(
        ctx.serenity_context(),
        &data.configs,
        discord::ResponseTarget::Command(Box::new(app.interaction.clone())),
    )
    .await?
    .with_input(input);

    run_gated(&data.commands, &data.executor, name, &context).await
}

/// Needle - automatic threads for busy channels
#[poise::command(
    slash_command,
    subcommands("close::close", "title::title", "autothread::autothread")
)]
pub async fn needle(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::tests::{context, member, thread_channel, AUTHOR_ID};
    use crate::model::ChannelKind;

    #[test]
    fn test_registry_resolves_known_commands() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.get("close").unwrap().name(), "close");
        assert_eq!(registry.get("title").unwrap().name(), "title");
        assert!(registry.get("nope").is_err());
    }

    #[test]
    fn test_thread_author_may_close_own_thread() {
        let channel = thread_channel();
        let author = member(AUTHOR_ID, serenity::Permissions::empty());
        let stranger = member(999, serenity::Permissions::empty());
        let moderator = member(999, serenity::Permissions::MANAGE_THREADS);

        assert!(CloseCommand.has_permission_to_execute_here(&author, &channel));
        assert!(!CloseCommand.has_permission_to_execute_here(&stranger, &channel));
        assert!(CloseCommand.has_permission_to_execute_here(&moderator, &channel));
    }

    #[test]
    fn test_author_rule_only_applies_in_threads() {
        let mut channel = thread_channel();
        channel.kind = ChannelKind::Text {
            default_auto_archive: None,
        };
        let author = member(AUTHOR_ID, serenity::Permissions::empty());
        assert!(!CloseCommand.has_permission_to_execute_here(&author, &channel));
    }

    #[tokio::test]
    async fn test_run_gated_denies_without_permission() {
        let (ctx, platform, responder) = context(
            thread_channel(),
            Some(member(999, serenity::Permissions::empty())),
        );

        run_gated(
            &CommandRegistry::new(),
            &CommandExecutorService::new(),
            "close",
            &ctx,
        )
        .await
        .unwrap();

        assert!(platform.calls().is_empty());
        let replies = responder.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].1);
    }
}
