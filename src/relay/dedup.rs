//! Per-sender record of the last successfully relayed URL.
//!
//! One entry per sender, overwritten on each success and never expired.
//! Only the most recent URL is compared, so this guards against an accidental
//! double send rather than acting as a history.

use std::collections::HashMap;
use tokio::sync::Mutex;

pub const ALREADY_PROCESSED: &str =
    "This link was already processed. Try copying the link again if you want it re-sent.";

#[derive(Debug, Default)]
pub struct DedupTable {
    last_url: Mutex<HashMap<i64, String>>,
}

impl DedupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `url` is exactly the last URL recorded for `user_id`.
    pub async fn is_duplicate(&self, user_id: i64, url: &str) -> bool {
        self.last_url
            .lock()
            .await
            .get(&user_id)
            .is_some_and(|last| last == url)
    }

    pub async fn record(&self, user_id: i64, url: &str) {
        self.last_url.lock().await.insert(user_id, url.to_string());
    }

    pub async fn last(&self, user_id: i64) -> Option<String> {
        self.last_url.lock().await.get(&user_id).cloned()
    }
}
