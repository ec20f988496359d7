use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use super::{InteractionResponder, Platform};
use crate::model::{IncomingMessage, NewThread, ReplyMessage, ThreadInfo};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendMessage(serenity::ChannelId, String),
    StartThread(NewThread),
    RenameThread(serenity::ChannelId, String),
    ArchiveThread(serenity::ChannelId),
    AddThreadMember(serenity::ChannelId, serenity::UserId),
    React(serenity::MessageId, String),
    SendReply(serenity::ChannelId, ReplyMessage),
    Pin(serenity::ChannelId, serenity::MessageId),
    DeleteLatest(serenity::ChannelId),
}

/// In-memory platform that records every mutating call.
pub struct FakePlatform {
    permissions: Mutex<HashMap<serenity::ChannelId, serenity::Permissions>>,
    threads: Mutex<HashMap<serenity::MessageId, ThreadInfo>>,
    roles: Mutex<HashMap<serenity::RoleId, Vec<serenity::UserId>>>,
    fail_reactions: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            permissions: Mutex::new(HashMap::new()),
            threads: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
            fail_reactions: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_permissions(&self, channel_id: serenity::ChannelId, perms: serenity::Permissions) {
        self.permissions.lock().unwrap().insert(channel_id, perms);
    }

    pub fn set_role_members(&self, role_id: serenity::RoleId, members: Vec<serenity::UserId>) {
        self.roles.lock().unwrap().insert(role_id, members);
    }

    pub fn attach_thread(&self, message_id: serenity::MessageId, thread: ThreadInfo) {
        self.threads.lock().unwrap().insert(message_id, thread);
    }

    pub fn fail_reactions(&self) {
        self.fail_reactions.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn bot_permissions_in(
        &self,
        channel_id: serenity::ChannelId,
    ) -> Result<serenity::Permissions> {
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .get(&channel_id)
            .copied()
            .unwrap_or_else(serenity::Permissions::all))
    }

    async fn send_message(
        &self,
        channel_id: serenity::ChannelId,
        content: String,
    ) -> Result<serenity::MessageId> {
        self.record(Call::SendMessage(channel_id, content));
        Ok(serenity::MessageId::new(9000))
    }

    async fn start_thread(
        &self,
        message: &IncomingMessage,
        thread: NewThread,
    ) -> Result<ThreadInfo> {
        let info = ThreadInfo {
            id: serenity::ChannelId::new(message.id.get()),
            name: thread.name.clone(),
        };
        self.threads.lock().unwrap().insert(message.id, info.clone());
        self.record(Call::StartThread(thread));
        Ok(info)
    }

    async fn fetch_thread(&self, message: &IncomingMessage) -> Result<Option<ThreadInfo>> {
        Ok(self.threads.lock().unwrap().get(&message.id).cloned())
    }

    async fn rename_thread(&self, thread_id: serenity::ChannelId, name: String) -> Result<()> {
        for thread in self.threads.lock().unwrap().values_mut() {
            if thread.id == thread_id {
                thread.name = name.clone();
            }
        }
        self.record(Call::RenameThread(thread_id, name));
        Ok(())
    }

    async fn archive_thread(&self, thread_id: serenity::ChannelId) -> Result<()> {
        self.record(Call::ArchiveThread(thread_id));
        Ok(())
    }

    async fn role_members(
        &self,
        _guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> Result<Option<Vec<serenity::UserId>>> {
        Ok(self.roles.lock().unwrap().get(&role_id).cloned())
    }

    async fn add_thread_member(
        &self,
        thread_id: serenity::ChannelId,
        user_id: serenity::UserId,
    ) -> Result<()> {
        self.record(Call::AddThreadMember(thread_id, user_id));
        Ok(())
    }

    async fn react(
        &self,
        _channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
        emoji: &str,
    ) -> Result<()> {
        if self.fail_reactions.load(Ordering::SeqCst) {
            bail!("Missing Access");
        }
        self.record(Call::React(message_id, emoji.to_string()));
        Ok(())
    }

    async fn send_reply(
        &self,
        channel_id: serenity::ChannelId,
        reply: ReplyMessage,
    ) -> Result<serenity::MessageId> {
        self.record(Call::SendReply(channel_id, reply));
        Ok(serenity::MessageId::new(9001))
    }

    async fn pin_message(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    ) -> Result<()> {
        self.record(Call::Pin(channel_id, message_id));
        Ok(())
    }

    async fn delete_latest_message(&self, channel_id: serenity::ChannelId) -> Result<()> {
        self.record(Call::DeleteLatest(channel_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeResponder {
    pub replies: Mutex<Vec<(String, bool)>>,
    pub title_prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl InteractionResponder for FakeResponder {
    async fn reply(&self, content: String, ephemeral: bool) -> Result<()> {
        self.replies.lock().unwrap().push((content, ephemeral));
        Ok(())
    }

    async fn ask_for_title(&self, current: &str) -> Result<()> {
        self.title_prompts.lock().unwrap().push(current.to_string());
        Ok(())
    }
}
