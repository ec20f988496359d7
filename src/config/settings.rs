use serde::{Deserialize, Serialize};

/// User-facing strings and emojis. Guilds may override any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub success_thread_created: String,
    pub success_thread_archived: String,
    pub success_thread_renamed: String,
    pub emoji_unanswered: String,
    pub error_insufficient_user_perms: String,
    pub error_only_in_thread: String,
    pub error_no_title: String,
    pub error_unknown: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            success_thread_created: "Thread automatically created by $USER in $CHANNEL".to_string(),
            success_thread_archived: "Thread archived. Anyone can send a message to unarchive it."
                .to_string(),
            success_thread_renamed: "Thread title updated.".to_string(),
            emoji_unanswered: "🆕".to_string(),
            error_insufficient_user_perms: "You do not have permission to use this here."
                .to_string(),
            error_only_in_thread: "This can only be used inside a thread.".to_string(),
            error_no_title: "Please provide a new title.".to_string(),
            error_unknown: "Something went wrong. Please try again later.".to_string(),
        }
    }
}
