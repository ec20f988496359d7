use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

use crate::commands::run_gated;
use crate::platform::discord::{self, DiscordPlatform, ResponseTarget, TITLE_MODAL_ID};
use crate::state::AppState;
use crate::variables::MessageVariables;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, AppState, anyhow::Error>,
    data: &AppState,
) -> Result<(), anyhow::Error> {
    match event {
        serenity::FullEvent::Message { new_message } => on_message(ctx, data, new_message).await,
        serenity::FullEvent::MessageUpdate { event, .. } => {
            on_message_edit(ctx, data, event.channel_id, event.id).await
        }
        serenity::FullEvent::InteractionCreate { interaction } => match interaction {
            serenity::Interaction::Component(component) => {
                on_button(ctx, data, component).await
            }
            serenity::Interaction::Modal(modal) => on_modal(ctx, data, modal).await,
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

async fn on_message(
    ctx: &serenity::Context,
    data: &AppState,
    message: &serenity::Message,
) -> Result<(), anyhow::Error> {
    let incoming = discord::incoming_message(ctx, message).await?;
    if !data.threads.should_have_thread(&incoming).await {
        return Ok(());
    }

    let platform = DiscordPlatform::new(ctx);
    let mut variables = MessageVariables::from_message(&incoming);
    data.threads
        .create_or_update_thread_on_message(&platform, &incoming, &mut variables)
        .await?;
    Ok(())
}

/// Edits only ever rename an existing thread.
async fn on_message_edit(
    ctx: &serenity::Context,
    data: &AppState,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<(), anyhow::Error> {
    let message = match channel_id.message(ctx, message_id).await {
        Ok(message) => message,
        Err(e) => {
            debug!(%message_id, "Edited message could not be fetched: {}", e);
            return Ok(());
        }
    };
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    if data
        .configs
        .channel_config(guild_id, channel_id)
        .await
        .is_none()
    {
        return Ok(());
    }

    let incoming = discord::incoming_message(ctx, &message).await?;
    if !incoming.has_thread {
        return Ok(());
    }

    let platform = DiscordPlatform::new(ctx);
    let mut variables = MessageVariables::from_message(&incoming);
    data.threads
        .create_or_update_thread_on_message(&platform, &incoming, &mut variables)
        .await?;
    Ok(())
}

async fn on_button(
    ctx: &serenity::Context,
    data: &AppState,
    component: &serenity::ComponentInteraction,
) -> Result<(), anyhow::Error> {
    let Some(button) = data.buttons.get(&component.data.custom_id) else {
        warn!(custom_id = %component.data.custom_id, "Unknown button pressed");
        return Ok(());
    };

    let context = discord::interaction_context(
        ctx,
        &data.configs,
        ResponseTarget::Component(Box::new(component.clone())),
    )
    .await?;
    button.press(&context).await
}

async fn on_modal(
    ctx: &serenity::Context,
    data: &AppState,
    modal: &serenity::ModalInteraction,
) -> Result<(), anyhow::Error> {
    if modal.data.custom_id != TITLE_MODAL_ID {
        return Ok(());
    }

    let input = discord::modal_input(modal, TITLE_MODAL_ID);
    let context = discord::interaction_context(
        ctx,
        &data.configs,
        ResponseTarget::Modal(Box::new(modal.clone())),
    )
    .await?
    .with_input(input);

    run_gated(&data.commands, &data.executor, "title", &context).await
}
