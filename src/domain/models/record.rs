#[cfg(test)]
#[path = "record_test.rs"]
mod tests;

use std::collections::HashMap;

use chrono::DateTime;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ChatSummary;
use super::Folder;
use super::Message;
use super::Sender;

/// Wire formats for the remote record store. The store replaces whole
/// records on update, so every field here must survive a read-merge-write
/// round trip even when the client doesn't use it.

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub sender: Sender,
    pub content: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub chat_id: String,
    pub name: String,
    #[serde(default)]
    pub messages: HashMap<String, MessageRecord>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub pin_status: bool,
}

impl ChatRecord {
    /// Decodes one string-encoded record from a getall payload. Records that
    /// fail to parse or lack an id or name are dropped by the caller.
    pub fn decode(raw: &str) -> Option<ChatRecord> {
        let record = serde_json::from_str::<ChatRecord>(raw)
            .map_err(|err| {
                tracing::warn!(error = %err, "Dropping undecodable chat record");
                return err;
            })
            .ok()?;

        if record.chat_id.is_empty() || record.name.is_empty() {
            tracing::warn!(chat_id = record.chat_id, "Dropping incomplete chat record");
            return None;
        }

        return Some(record);
    }

    pub fn summary(&self) -> ChatSummary {
        let created_ms = ChatSummary::created_ms_from_id(&self.chat_id);

        return ChatSummary {
            id: self.chat_id.clone(),
            title: self.name.clone(),
            date: ChatSummary::format_date(created_ms),
            created_ms: created_ms.unwrap_or(0),
            is_pinned: self.pin_status,
            folder_id: self.folder_id.clone(),
        };
    }

    /// The stored message map in display order: by timestamp when both parse,
    /// falling back to id order.
    pub fn sorted_messages(&self) -> Vec<Message> {
        let mut messages = self
            .messages
            .iter()
            .map(|(id, record)| {
                return Message::new(id, record.sender, &record.content, &record.timestamp);
            })
            .collect::<Vec<Message>>();

        messages.sort_by(|a, b| {
            let ts_a = DateTime::parse_from_rfc3339(&a.timestamp);
            let ts_b = DateTime::parse_from_rfc3339(&b.timestamp);
            if let (Ok(ts_a), Ok(ts_b)) = (ts_a, ts_b) {
                return ts_a.cmp(&ts_b);
            }
            return a.id.cmp(&b.id);
        });

        return messages;
    }

    pub fn insert_message(&mut self, message: &Message) {
        self.messages.insert(
            message.id.clone(),
            MessageRecord {
                sender: message.sender,
                content: message.content.clone(),
                timestamp: message.timestamp.clone(),
            },
        );
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub folder_id: String,
    pub name: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub chat_ids: Vec<String>,
    #[serde(default)]
    pub pin_status: bool,
}

impl FolderRecord {
    pub fn decode(raw: &str) -> Option<FolderRecord> {
        let record = serde_json::from_str::<FolderRecord>(raw)
            .map_err(|err| {
                tracing::warn!(error = %err, "Dropping undecodable folder record");
                return err;
            })
            .ok()?;

        if record.folder_id.is_empty() || record.name.is_empty() {
            tracing::warn!(
                folder_id = record.folder_id,
                "Dropping incomplete folder record"
            );
            return None;
        }

        return Some(record);
    }

    pub fn display(&self, chat_count: usize) -> Folder {
        return Folder {
            id: self.folder_id.clone(),
            name: self.name.clone(),
            chat_count,
            is_pinned: self.pin_status,
        };
    }

    /// Reconstructs a record from local state when the pre-update read
    /// fails. The stored `chat_ids` list is lost in that case, matching the
    /// store's own tolerance for it being empty.
    pub fn from_local(folder: &Folder) -> FolderRecord {
        return FolderRecord {
            folder_id: folder.id.clone(),
            name: folder.name.clone(),
            count: folder.chat_count,
            chat_ids: vec![],
            pin_status: folder.is_pinned,
        };
    }
}
