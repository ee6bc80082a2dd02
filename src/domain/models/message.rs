#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::SecondsFormat;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Normal,
    Error,
}

/// A single conversation entry. Synthetic entries (greetings, generation
/// failures, save failures) are regular messages with an `Error` kind where
/// appropriate, and are never written back to the remote record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: String,
    kind: MessageKind,
}

fn now_iso() -> String {
    return Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
}

fn rand_suffix(len: usize) -> String {
    return Uuid::new_v4().simple().to_string()[..len].to_string();
}

impl Message {
    pub fn new(id: &str, sender: Sender, content: &str, timestamp: &str) -> Message {
        return Message {
            id: id.to_string(),
            sender,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
            kind: MessageKind::Normal,
        };
    }

    pub fn user(content: &str) -> Message {
        let id = format!("user_{}_{}", Utc::now().timestamp_millis(), rand_suffix(6));
        return Message::new(&id, Sender::User, content, &now_iso());
    }

    pub fn assistant(content: &str) -> Message {
        let id = format!("asst_{}_{}", Utc::now().timestamp_millis(), rand_suffix(6));
        return Message::new(&id, Sender::Assistant, content, &now_iso());
    }

    /// A synthetic assistant message shown in place of a real response.
    pub fn error(id_prefix: &str, content: &str) -> Message {
        let mut msg = Message::new(
            &format!("{id_prefix}_{}", Utc::now().timestamp_millis()),
            Sender::Assistant,
            content,
            &now_iso(),
        );
        msg.kind = MessageKind::Error;
        return msg;
    }

    /// Greetings and placeholders that live only in the local view.
    pub fn synthetic(id: &str, content: &str) -> Message {
        return Message::new(id, Sender::Assistant, content, &now_iso());
    }

    pub fn kind(&self) -> MessageKind {
        return self.kind;
    }
}
