use poise::serenity_prelude as serenity;
use tracing::info;

use crate::config::{
    button_style, AutothreadChannelConfig, ConfigError, ReplyMessageOption, ToggleOption,
    MAX_TITLE_LENGTH,
};
use crate::state::Context;
use crate::text::extract_regex;

const MAX_SLOWMODE: u16 = 21_600;

/// Changes requested through `/needle autothread`. `None` leaves a field alone.
#[derive(Debug, Default)]
struct AutothreadOptions {
    custom_reply: Option<String>,
    title: Option<String>,
    regex_join: Option<String>,
    title_max_length: Option<u32>,
    slowmode: Option<u32>,
    include_bots: Option<bool>,
    autojoin_role: Option<serenity::RoleId>,
    status_reactions: Option<bool>,
    close_button_text: Option<String>,
    close_button_color: Option<String>,
    title_button_text: Option<String>,
    title_button_color: Option<String>,
}

fn apply_options(
    mut config: AutothreadChannelConfig,
    options: AutothreadOptions,
) -> Result<AutothreadChannelConfig, ConfigError> {
    if let Some(reply) = options.custom_reply {
        config.reply_type = if reply.is_empty() {
            ReplyMessageOption::Default
        } else {
            ReplyMessageOption::Custom
        };
        config.custom_reply = reply;
    }
    if let Some(title) = options.title {
        extract_regex(&title)?;
        config.custom_title = title;
    }
    if let Some(join) = options.regex_join {
        config.regex_join_text = join;
    }
    if let Some(max) = options.title_max_length {
        config.title_max_length = (max as usize).clamp(1, MAX_TITLE_LENGTH);
    }
    if let Some(slowmode) = options.slowmode {
        config.slowmode = slowmode.min(MAX_SLOWMODE as u32) as u16;
    }
    if let Some(include_bots) = options.include_bots {
        config.include_bots = include_bots;
    }
    if let Some(role) = options.autojoin_role {
        config.autojoin_role = Some(role);
    }
    if let Some(on) = options.status_reactions {
        config.status_reactions = if on { ToggleOption::On } else { ToggleOption::Off };
    }
    if let Some(text) = options.close_button_text {
        config.close_button_text = text;
    }
    if let Some(color) = options.close_button_color {
        button_style(&color)?;
        config.close_button_style = color.to_lowercase();
    }
    if let Some(text) = options.title_button_text {
        config.title_button_text = text;
    }
    if let Some(color) = options.title_button_color {
        button_style(&color)?;
        config.title_button_style = color.to_lowercase();
    }
    Ok(config)
}

/// Configure automatic threads for a channel (Manage Server only)
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn autothread(
    ctx: Context<'_>,
    #[description = "Channel to configure"]
    #[channel_types("Text", "News")]
    channel: serenity::GuildChannel,
    #[description = "Set to false to stop creating threads here"] enabled: Option<bool>,
    #[description = "Reply posted in new threads (empty = default)"] custom_reply: Option<String>,
    #[description = "Title template, may contain /regex/flags"] title: Option<String>,
    #[description = "Joins regex matches in the title"] regex_join: Option<String>,
    #[description = "Maximum title length (1-100)"] title_max_length: Option<u32>,
    #[description = "Slowmode in seconds (0 = off)"] slowmode: Option<u32>,
    #[description = "Create threads for bot messages"] include_bots: Option<bool>,
    #[description = "Role whose members join every new thread"] autojoin_role: Option<
        serenity::Role,
    >,
    #[description = "React to new messages with a status emoji"] status_reactions: Option<bool>,
    #[description = "Close button label (empty hides it)"] close_button_text: Option<String>,
    #[description = "blurple | green | grey | red"] close_button_color: Option<String>,
    #[description = "Title button label (empty hides it)"] title_button_text: Option<String>,
    #[description = "blurple | green | grey | red"] title_button_color: Option<String>,
) -> Result<(), anyhow::Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let configs = &ctx.data().configs;

    if enabled == Some(false) {
        let removed = configs.remove_channel(guild_id, channel.id).await?;
        let reply = if removed {
            format!("Automatic threads disabled in <#{}>.", channel.id)
        } else {
            format!("<#{}> was not set up for automatic threads.", channel.id)
        };
        ctx.say(reply).await?;
        return Ok(());
    }

    let current = configs
        .channel_config(guild_id, channel.id)
        .await
        .unwrap_or_else(|| AutothreadChannelConfig::new(channel.id));

    let options = AutothreadOptions {
        custom_reply,
        title,
        regex_join,
        title_max_length,
        slowmode,
        include_bots,
        autojoin_role: autojoin_role.map(|r| r.id),
        status_reactions,
        close_button_text,
        close_button_color,
        title_button_text,
        title_button_color,
    };

    let updated = match apply_options(current, options) {
        Ok(config) => config,
        Err(e) => {
            ctx.say(format!("Not saved: {}", e)).await?;
            return Ok(());
        }
    };

    configs.set_channel(guild_id, updated).await?;
    info!(
        user = %ctx.author().name,
        %guild_id,
        channel = %channel.id,
        "Autothread channel configured"
    );
    ctx.say(format!("Automatic threads enabled in <#{}>.", channel.id))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AutothreadChannelConfig {
        AutothreadChannelConfig::new(serenity::ChannelId::new(10))
    }

    #[test]
    fn test_custom_reply_switches_reply_type() {
        let config = apply_options(
            base(),
            AutothreadOptions {
                custom_reply: Some("Welcome $USER".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.reply_type, ReplyMessageOption::Custom);

        let config = apply_options(
            config,
            AutothreadOptions {
                custom_reply: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.reply_type, ReplyMessageOption::Default);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let err = apply_options(
            base(),
            AutothreadOptions {
                close_button_color: Some("purple".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidButtonColor(_)));
    }

    #[test]
    fn test_bad_title_regex_is_rejected() {
        let err = apply_options(
            base(),
            AutothreadOptions {
                title: Some("Help: /(oops/".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }

    #[test]
    fn test_limits_are_clamped() {
        let config = apply_options(
            base(),
            AutothreadOptions {
                title_max_length: Some(500),
                slowmode: Some(100_000),
                status_reactions: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.title_max_length, MAX_TITLE_LENGTH);
        assert_eq!(config.slowmode, MAX_SLOWMODE);
        assert_eq!(config.status_reactions, ToggleOption::On);
    }
}
