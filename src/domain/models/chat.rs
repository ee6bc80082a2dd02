#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::cmp::Ordering;

use chrono::TimeZone;
use chrono::Utc;

/// One entry in the chat list. Derived from a stored chat record, with the
/// creation time parsed out of the id's embedded millisecond timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub date: String,
    pub created_ms: i64,
    pub is_pinned: bool,
    pub folder_id: Option<String>,
}

impl ChatSummary {
    /// Chat ids look like `chat_<epoch-ms>_<rand>`. Ids that don't carry a
    /// parseable timestamp sort as epoch 0.
    pub fn created_ms_from_id(id: &str) -> Option<i64> {
        return id.split('_').nth(1)?.parse::<i64>().ok();
    }

    pub fn format_date(created_ms: Option<i64>) -> String {
        if let Some(ms) = created_ms {
            if let Some(date) = Utc.timestamp_millis_opt(ms).single() {
                return date.format("%b %-d, %Y").to_string();
            }
        }

        return "N/A".to_string();
    }

    /// Pinned chats first, then most recently created first.
    pub fn compare(a: &ChatSummary, b: &ChatSummary) -> Ordering {
        if a.is_pinned != b.is_pinned {
            if a.is_pinned {
                return Ordering::Less;
            }
            return Ordering::Greater;
        }

        return b.created_ms.cmp(&a.created_ms);
    }
}
