//! Sender allow-list.

use std::collections::HashSet;

pub const NOT_AUTHORIZED: &str = "Sorry, you are not authorized to use this bot.";

/// Telegram user IDs permitted to use the bot. Fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    users: HashSet<i64>,
}

impl AllowList {
    pub fn new(users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }
}
