use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::buttons::ButtonRegistry;
use crate::config::{
    button_style, AutothreadChannelConfig, ConfigError, ConfigStore, ReplyMessageOption,
    ToggleOption,
};
use crate::model::{ButtonSpec, ChannelKind, IncomingMessage, NewThread, ReplyMessage, ThreadInfo};
use crate::platform::Platform;
use crate::text::{clamp_with_ellipsis, extract_regex, plural, REGEX_RESULT};
use crate::variables::MessageVariables;

pub const THREAD_LOG_INTERVAL: Duration = Duration::from_secs(60);
/// Time for the platform's own "pinned a message" notice to land in the thread.
const PIN_SETTLE_DELAY: Duration = Duration::from_millis(100);
const MAX_MESSAGE_LENGTH: usize = 2000;
const MAX_BUTTON_LABEL_LENGTH: usize = 80;
const FALLBACK_TITLE: &str = "New Thread";

/// Permissions the bot needs in a channel to auto-thread it with this config.
pub fn required_permissions(slowmode: u16, raw_reply: &str) -> serenity::Permissions {
    let mut required = serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES_IN_THREADS
        | serenity::Permissions::CREATE_PUBLIC_THREADS
        | serenity::Permissions::READ_MESSAGE_HISTORY;
    if slowmode > 0 {
        required |= serenity::Permissions::MANAGE_THREADS;
    }
    if raw_reply.contains("@everyone") || raw_reply.contains("@here") {
        required |= serenity::Permissions::MENTION_EVERYONE;
    }
    required
}

pub fn missing_permissions_message(missing: serenity::Permissions) -> String {
    let names = missing.get_permission_names();
    format!(
        "Missing {}:\n    - {}",
        plural("permission", names.len()),
        names.join("\n    - ")
    )
}

pub fn created_log_line(now: DateTime<Utc>, created: usize, elapsed: Duration) -> String {
    format!(
        "[{}] Created {} threads in the last {:.2} minute(s).",
        now.format("%H:%M:%S"),
        created,
        elapsed.as_secs_f64() / 60.0
    )
}

/// Background task that logs and resets the creation counter on an interval.
/// Aborted when stopped or dropped.
pub struct ThreadCountLogger {
    handle: JoinHandle<()>,
}

impl ThreadCountLogger {
    pub fn start(counter: Arc<AtomicUsize>, every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately.
            ticker.tick().await;
            let mut last = Instant::now();
            loop {
                ticker.tick().await;
                let created = counter.swap(0, Ordering::Relaxed);
                let elapsed = last.elapsed();
                last = Instant::now();
                info!("{}", created_log_line(Utc::now(), created, elapsed));
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ThreadCountLogger {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One async lock per message id, so a create and an edit of the same message never interleave.
#[derive(Default)]
struct MessageLocks {
    locks: Mutex<HashMap<serenity::MessageId, Weak<tokio::sync::Mutex<()>>>>,
}

impl MessageLocks {
    async fn lock(&self, id: serenity::MessageId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| lock.strong_count() > 0);
            match locks.get(&id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(tokio::sync::Mutex::new(()));
                    locks.insert(id, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }
}

pub struct ThreadCreationService {
    configs: Arc<ConfigStore>,
    buttons: Arc<ButtonRegistry>,
    threads_created: Arc<AtomicUsize>,
    locks: MessageLocks,
    logger: Mutex<Option<ThreadCountLogger>>,
}

impl ThreadCreationService {
    pub fn new(
        configs: Arc<ConfigStore>,
        buttons: Arc<ButtonRegistry>,
        log_created_threads: bool,
    ) -> Self {
        let threads_created = Arc::new(AtomicUsize::new(0));
        let logger = log_created_threads
            .then(|| ThreadCountLogger::start(threads_created.clone(), THREAD_LOG_INTERVAL));

        Self {
            configs,
            buttons,
            threads_created,
            locks: MessageLocks::default(),
            logger: Mutex::new(logger),
        }
    }

    /// Stop the periodic creation log, if it runs.
    pub fn shutdown(&self) {
        let logger = self
            .logger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(logger) = logger {
            logger.stop();
        }
    }

    pub async fn should_have_thread(&self, message: &IncomingMessage) -> bool {
        if message.is_system {
            return false;
        }
        let Some(guild_id) = message.guild_id else {
            return false;
        };
        match message.channel {
            ChannelKind::Text { .. } | ChannelKind::News { .. } => {}
            ChannelKind::Thread | ChannelKind::Voice | ChannelKind::Other => return false,
        }
        if !message.guild_available {
            return false;
        }
        if message.author.id == message.bot_user_id {
            return false;
        }
        if message.has_thread {
            return false;
        }

        let Some(config) = self
            .configs
            .channel_config(guild_id, message.channel_id)
            .await
        else {
            return false;
        };
        if !config.include_bots && message.author.bot {
            return false;
        }

        true
    }

    /// Create a thread for `message`, or rename its existing thread if the computed
    /// title changed. Returns the thread that was created or renamed.
    pub async fn create_or_update_thread_on_message(
        &self,
        platform: &dyn Platform,
        message: &IncomingMessage,
        variables: &mut MessageVariables,
    ) -> Result<Option<ThreadInfo>> {
        let Some(archive_default) = message.channel.thread_host_archive_default() else {
            return Ok(None);
        };
        let Some(guild_id) = message.guild_id else {
            return Ok(None);
        };
        let guild_config = self.configs.get(guild_id).await;
        let Some(config) = guild_config.channel(message.channel_id) else {
            return Ok(None);
        };

        let _guard = self.locks.lock(message.id).await;

        let raw_reply = match config.reply_type {
            ReplyMessageOption::Default => guild_config.settings.success_thread_created.as_str(),
            ReplyMessageOption::Custom => config.custom_reply.as_str(),
        };
        let bot_permissions = platform.bot_permissions_in(message.channel_id).await?;
        let required = required_permissions(config.slowmode, raw_reply);
        if !bot_permissions.contains(required) {
            let missing = required.difference(bot_permissions);
            warn!(
                %guild_id,
                channel = %message.channel_id,
                missing = ?missing.get_permission_names(),
                "Cannot create thread, missing permissions"
            );
            platform
                .send_message(message.channel_id, missing_permissions_message(missing))
                .await?;
            return Ok(None);
        }

        let name = self.thread_name(message, config, variables)?;
        if message.has_thread {
            let Some(thread) = platform.fetch_thread(message).await? else {
                return Ok(None);
            };
            if thread.name == name {
                return Ok(None);
            }

            platform.rename_thread(thread.id, name.clone()).await?;
            debug!(thread = %thread.id, name = %name, "Thread renamed after edit");
            return Ok(Some(ThreadInfo { id: thread.id, name }));
        }

        let thread = platform
            .start_thread(
                message,
                NewThread {
                    name,
                    slowmode: (config.slowmode > 0).then_some(config.slowmode),
                    auto_archive: archive_default.unwrap_or(serenity::AutoArchiveDuration::OneDay),
                },
            )
            .await?;
        self.threads_created.fetch_add(1, Ordering::Relaxed);
        info!(
            %guild_id,
            thread = %thread.id,
            name = %thread.name,
            "Thread created"
        );

        variables.set_thread(thread.clone());

        if let Some(role_id) = config.autojoin_role {
            self.add_role_members(platform, guild_id, role_id, &thread)
                .await;
        }

        if config.status_reactions == ToggleOption::On {
            // A missing reaction is cosmetic.
            if let Err(e) = platform
                .react(
                    message.channel_id,
                    message.id,
                    &guild_config.settings.emoji_unanswered,
                )
                .await
            {
                debug!(message = %message.id, "Status reaction failed: {:#}", e);
            }
        }

        let reply = variables.replace(raw_reply);
        if !reply.trim().is_empty() {
            let buttons = self.button_row(config, variables)?;
            let reply_id = platform
                .send_reply(
                    thread.id,
                    ReplyMessage {
                        content: clamp_with_ellipsis(&reply, MAX_MESSAGE_LENGTH),
                        buttons,
                    },
                )
                .await?;

            let thread_permissions = platform.bot_permissions_in(thread.id).await?;
            if thread_permissions.contains(serenity::Permissions::MANAGE_MESSAGES) {
                if let Err(e) = Self::pin_and_clean_up(platform, thread.id, reply_id).await {
                    warn!(thread = %thread.id, "Pinning the thread reply failed: {:#}", e);
                }
            }
        }

        Ok(Some(thread))
    }

    /// Pin the reply, then remove the "pinned a message" notice the platform posts.
    async fn pin_and_clean_up(
        platform: &dyn Platform,
        thread_id: serenity::ChannelId,
        reply_id: serenity::MessageId,
    ) -> Result<()> {
        platform.pin_message(thread_id, reply_id).await?;
        tokio::time::sleep(PIN_SETTLE_DELAY).await;
        platform.delete_latest_message(thread_id).await
    }

    /// Attempts every member; individual failures are only logged.
    async fn add_role_members(
        &self,
        platform: &dyn Platform,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
        thread: &ThreadInfo,
    ) {
        let members = match platform.role_members(guild_id, role_id).await {
            Ok(Some(members)) => members,
            Ok(None) => {
                debug!(%role_id, "Auto-join role no longer exists");
                return;
            }
            Err(e) => {
                warn!(%role_id, "Failed to resolve auto-join role: {:#}", e);
                return;
            }
        };

        let results = futures::future::join_all(
            members
                .iter()
                .map(|member| platform.add_thread_member(thread.id, *member)),
        )
        .await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            debug!(thread = %thread.id, failed, "Some auto-join members were not added");
        }
    }

    pub fn thread_name(
        &self,
        message: &IncomingMessage,
        config: &AutothreadChannelConfig,
        variables: &MessageVariables,
    ) -> Result<String, ConfigError> {
        let content = Self::message_content(message, variables);
        let template = extract_regex(&config.custom_title)?;
        let regex_result = template
            .regex
            .as_ref()
            .map(|regex| regex.matches(&content).join(&config.regex_join_text))
            .unwrap_or_default();
        let raw_title = template
            .input_with_regex_variable
            .replacen(REGEX_RESULT, &regex_result, 1)
            .replace('\n', " ");

        let title = variables.replace(&raw_title);
        let output = clamp_with_ellipsis(title.trim(), config.title_max_length);
        if output.trim().is_empty() {
            Ok(FALLBACK_TITLE.to_string())
        } else {
            Ok(output)
        }
    }

    /// Message body plus every embed, with variable tokens stripped.
    fn message_content(message: &IncomingMessage, variables: &MessageVariables) -> String {
        let embeds: String = message.embeds.iter().map(|e| e.flatten()).collect();
        variables.remove_from(&format!("{}\n\n{}", message.clean_content, embeds))
    }

    fn button_row(
        &self,
        config: &AutothreadChannelConfig,
        variables: &MessageVariables,
    ) -> Result<Vec<ButtonSpec>, ConfigError> {
        let close_text = clamp_with_ellipsis(
            &variables.replace(&config.close_button_text),
            MAX_BUTTON_LABEL_LENGTH,
        );
        let title_text = clamp_with_ellipsis(
            &variables.replace(&config.title_button_text),
            MAX_BUTTON_LABEL_LENGTH,
        );
        let close_style = button_style(&config.close_button_style)?;
        let title_style = button_style(&config.title_button_style)?;

        let mut row = Vec::new();
        for (id, text, style) in [
            ("close", close_text, close_style),
            ("title", title_text, title_style),
        ] {
            if text.is_empty() {
                continue;
            }
            if let Some(button) = self.buttons.get(id) {
                let mut spec = button.builder(&text);
                spec.style = style;
                row.push(spec);
            }
        }
        Ok(row)
    }
}
