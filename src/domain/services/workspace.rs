#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::models::ChatRecord;
use crate::domain::models::ChatSummary;
use crate::domain::models::CompletionBox;
use crate::domain::models::Folder;
use crate::domain::models::FolderRecord;
use crate::domain::models::Message;
use crate::domain::models::StoreBox;
use crate::domain::models::UserIdentity;

/// How long a mutation failure banner stays visible. Refresh failures have
/// no deadline and persist until the next successful refresh.
pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct ErrorBanner {
    text: String,
    raised_at: Instant,
    transient: bool,
}

impl ErrorBanner {
    fn transient(text: String) -> ErrorBanner {
        return ErrorBanner {
            text,
            raised_at: Instant::now(),
            transient: true,
        };
    }

    fn sticky(text: String) -> ErrorBanner {
        return ErrorBanner {
            text,
            raised_at: Instant::now(),
            transient: false,
        };
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        if !self.transient {
            return false;
        }

        return now.duration_since(self.raised_at) >= ERROR_BANNER_TTL;
    }
}

/// The currently opened chat session view. Owned here rather than by the
/// collections: its messages are persisted as part of the parent chat record.
#[derive(Clone, Debug)]
pub struct Conversation {
    pub chat_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ErrorScope {
    Chats,
    Folders,
}

/// Pre-mutation copies of whichever collections an operation touches.
/// Restored wholesale when the remote call fails.
struct Snapshot {
    chats: Option<Vec<ChatSummary>>,
    folders: Option<Vec<Folder>>,
}

/// The synchronized collection manager. Local mutations apply immediately,
/// the remote store is reconciled asynchronously, and failures roll the
/// touched collections back to their snapshot with a user-facing banner.
///
/// Remote updates are full-record replaces, so every mutation follows
/// read-current-record, merge, write-back, in that order.
pub struct Workspace {
    store: StoreBox,
    completion: CompletionBox,
    identity: UserIdentity,
    chats: Vec<ChatSummary>,
    folders: Vec<Folder>,
    pub chats_loading: bool,
    pub folders_loading: bool,
    chat_error: Option<ErrorBanner>,
    folder_error: Option<ErrorBanner>,
    conversation: Option<Conversation>,
}

impl Workspace {
    pub fn new(store: StoreBox, completion: CompletionBox, identity: UserIdentity) -> Workspace {
        return Workspace {
            store,
            completion,
            identity,
            chats: vec![],
            folders: vec![],
            chats_loading: true,
            folders_loading: true,
            chat_error: None,
            folder_error: None,
            conversation: None,
        };
    }

    /// Verifies the generation collaborator is reachable before starting a
    /// session.
    pub async fn health_check(&self) -> Result<()> {
        return self.completion.health_check().await;
    }

    pub fn chats(&self) -> &[ChatSummary] {
        return &self.chats;
    }

    pub fn folders(&self) -> &[Folder] {
        return &self.folders;
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        return self.conversation.as_ref();
    }

    pub fn identity(&self) -> &UserIdentity {
        return &self.identity;
    }

    pub fn chat_error_at(&self, now: Instant) -> Option<&str> {
        return self
            .chat_error
            .as_ref()
            .filter(|banner| return !banner.is_expired_at(now))
            .map(|banner| return banner.text());
    }

    pub fn chat_error(&self) -> Option<&str> {
        return self.chat_error_at(Instant::now());
    }

    pub fn folder_error_at(&self, now: Instant) -> Option<&str> {
        return self
            .folder_error
            .as_ref()
            .filter(|banner| return !banner.is_expired_at(now))
            .map(|banner| return banner.text());
    }

    pub fn folder_error(&self) -> Option<&str> {
        return self.folder_error_at(Instant::now());
    }

    fn raise(&mut self, scope: ErrorScope, banner: ErrorBanner) {
        match scope {
            ErrorScope::Chats => self.chat_error = Some(banner),
            ErrorScope::Folders => self.folder_error = Some(banner),
        }
    }

    fn capture_chats(&self) -> Snapshot {
        return Snapshot {
            chats: Some(self.chats.clone()),
            folders: None,
        };
    }

    fn capture_folders(&self) -> Snapshot {
        return Snapshot {
            chats: None,
            folders: Some(self.folders.clone()),
        };
    }

    fn capture_both(&self) -> Snapshot {
        return Snapshot {
            chats: Some(self.chats.clone()),
            folders: Some(self.folders.clone()),
        };
    }

    /// The shared tail of every optimistic mutation: on success the local
    /// state is already correct; on failure the captured collections are
    /// restored and a transient banner is raised. Selection is deliberately
    /// not part of the snapshot.
    fn finish_mutation(
        &mut self,
        snapshot: Snapshot,
        result: Result<()>,
        scope: ErrorScope,
        label: &str,
    ) -> bool {
        match result {
            Ok(()) => return true,
            Err(err) => {
                tracing::error!(error = %err, label, "Mutation failed, rolling back");
                if let Some(chats) = snapshot.chats {
                    self.chats = chats;
                }
                if let Some(folders) = snapshot.folders {
                    self.folders = folders;
                }
                if let Some(conversation) = &mut self.conversation {
                    if let Some(chat) = self.chats.iter().find(|c| return c.id == conversation.chat_id) {
                        conversation.title = chat.title.clone();
                    }
                }
                self.raise(scope, ErrorBanner::transient(format!("{label} failed. {err}")));
                return false;
            }
        }
    }

    fn sort_chats(&mut self) {
        self.chats.sort_by(ChatSummary::compare);
    }

    fn sort_folders(&mut self) {
        self.folders.sort_by(Folder::compare);
    }

    fn chat_count_for(&self, folder_id: &str) -> usize {
        return self
            .chats
            .iter()
            .filter(|chat| return chat.folder_id.as_deref() == Some(folder_id))
            .count();
    }

    // --- Refresh ---

    /// Replaces the chat collection wholesale from the remote store.
    /// Undecodable records are dropped; a failed fetch clears the collection
    /// and leaves a persistent error until the next successful refresh.
    pub async fn refresh_chats(&mut self) {
        self.chats_loading = true;

        match self.store.get_all_chats().await {
            Ok(raw) => {
                self.chats = raw
                    .values()
                    .filter_map(|encoded| return ChatRecord::decode(encoded))
                    .map(|record| return record.summary())
                    .collect();
                self.sort_chats();
                self.chat_error = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to fetch chat list");
                self.chats.clear();
                self.chat_error = Some(ErrorBanner::sticky(format!(
                    "Failed to fetch chat list. {err}"
                )));
            }
        }

        self.chats_loading = false;
    }

    /// Same contract as `refresh_chats`; chat counts are derived from the
    /// local chat collection, so refresh chats first.
    pub async fn refresh_folders(&mut self) {
        self.folders_loading = true;

        match self.store.get_all_folders().await {
            Ok(raw) => {
                self.folders = raw
                    .values()
                    .filter_map(|encoded| return FolderRecord::decode(encoded))
                    .map(|record| {
                        let count = self.chat_count_for(&record.folder_id);
                        return record.display(count);
                    })
                    .collect();
                self.sort_folders();
                self.folder_error = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to fetch folders");
                self.folders.clear();
                self.folder_error = Some(ErrorBanner::sticky(format!(
                    "Failed to fetch folders. {err}"
                )));
            }
        }

        self.folders_loading = false;
    }

    // --- Create ---

    /// Creates a chat with a client-generated id and selects it. Nothing is
    /// applied optimistically, so a failure leaves local state untouched.
    pub async fn create_chat(&mut self, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            self.raise(
                ErrorScope::Chats,
                ErrorBanner::transient("Chat title cannot be empty.".to_string()),
            );
            return None;
        }

        let chat_id = format!(
            "chat_{}_{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..5]
        );
        let record = ChatRecord {
            chat_id: chat_id.clone(),
            name: title.to_string(),
            ..ChatRecord::default()
        };

        if let Err(err) = self.store.add_chat(&record).await {
            tracing::error!(error = %err, "Failed to create chat");
            self.raise(
                ErrorScope::Chats,
                ErrorBanner::transient(format!("Create chat failed. {err}")),
            );
            return None;
        }

        self.refresh_chats().await;
        self.select_new_chat(&chat_id, title);
        return Some(chat_id);
    }

    pub async fn create_folder(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            self.raise(
                ErrorScope::Folders,
                ErrorBanner::transient("Folder name cannot be empty.".to_string()),
            );
            return None;
        }

        let record = FolderRecord {
            folder_id: format!("folder_{}", Uuid::new_v4()),
            name: name.to_string(),
            ..FolderRecord::default()
        };

        if let Err(err) = self.store.add_folder(&record).await {
            tracing::error!(error = %err, "Failed to create folder");
            self.raise(
                ErrorScope::Folders,
                ErrorBanner::transient(format!("Create folder failed. {err}")),
            );
            return None;
        }

        let folder_id = record.folder_id.clone();
        self.folders.push(record.display(0));
        self.sort_folders();
        return Some(folder_id);
    }

    // --- Rename ---

    /// No-ops silently when the name is empty or unchanged; otherwise applies
    /// locally, then read-merge-writes the remote record so sibling fields
    /// (messages, pin state) survive the full replace.
    pub async fn rename_chat(&mut self, chat_id: &str, new_name: &str) {
        let new_name = new_name.trim().to_string();
        let Some(chat) = self.chats.iter().find(|c| return c.id == chat_id) else {
            return;
        };
        if new_name.is_empty() || chat.title == new_name {
            return;
        }

        let snapshot = self.capture_chats();
        if let Some(chat) = self.chats.iter_mut().find(|c| return c.id == chat_id) {
            chat.title = new_name.clone();
        }
        if let Some(conversation) = &mut self.conversation {
            if conversation.chat_id == chat_id {
                conversation.title = new_name.clone();
            }
        }

        let result = self.replace_chat(chat_id, |record| record.name = new_name.clone()).await;
        self.finish_mutation(snapshot, result, ErrorScope::Chats, "Rename");
    }

    pub async fn rename_folder(&mut self, folder_id: &str, new_name: &str) {
        let new_name = new_name.trim().to_string();
        let Some(folder) = self.folders.iter().find(|f| return f.id == folder_id) else {
            return;
        };
        if new_name.is_empty() || folder.name == new_name {
            return;
        }

        let snapshot = self.capture_folders();
        if let Some(folder) = self.folders.iter_mut().find(|f| return f.id == folder_id) {
            folder.name = new_name.clone();
        }
        self.sort_folders();

        let result = self
            .replace_folder(folder_id, |record| record.name = new_name.clone())
            .await;
        self.finish_mutation(snapshot, result, ErrorScope::Folders, "Rename");
    }

    // --- Pin ---

    pub async fn toggle_chat_pin(&mut self, chat_id: &str) {
        let Some(chat) = self.chats.iter().find(|c| return c.id == chat_id) else {
            return;
        };
        let pinned = !chat.is_pinned;

        let snapshot = self.capture_chats();
        if let Some(chat) = self.chats.iter_mut().find(|c| return c.id == chat_id) {
            chat.is_pinned = pinned;
        }
        self.sort_chats();

        let result = self.replace_chat(chat_id, |record| record.pin_status = pinned).await;
        self.finish_mutation(snapshot, result, ErrorScope::Chats, "Pin");
    }

    pub async fn toggle_folder_pin(&mut self, folder_id: &str) {
        let Some(folder) = self.folders.iter().find(|f| return f.id == folder_id) else {
            return;
        };
        let pinned = !folder.is_pinned;

        let snapshot = self.capture_folders();
        if let Some(folder) = self.folders.iter_mut().find(|f| return f.id == folder_id) {
            folder.is_pinned = pinned;
        }
        self.sort_folders();

        let result = self
            .replace_folder(folder_id, |record| record.pin_status = pinned)
            .await;
        self.finish_mutation(snapshot, result, ErrorScope::Folders, "Pin");
    }

    // --- Delete ---

    /// Callers confirm interactively before invoking this. Clearing the
    /// selection is part of the optimistic step and is not rolled back.
    pub async fn delete_chat(&mut self, chat_id: &str) {
        if !self.chats.iter().any(|c| return c.id == chat_id) {
            return;
        }

        let snapshot = self.capture_chats();
        self.chats.retain(|c| return c.id != chat_id);
        if self
            .conversation
            .as_ref()
            .is_some_and(|conversation| return conversation.chat_id == chat_id)
        {
            self.reset_conversation();
        }

        let result = self.store.delete_chat(chat_id).await;
        self.finish_mutation(snapshot, result, ErrorScope::Chats, "Delete");
    }

    /// Deleting a folder detaches its member chats rather than deleting
    /// them, so both collections are snapshotted and rolled back together.
    pub async fn delete_folder(&mut self, folder_id: &str) {
        if !self.folders.iter().any(|f| return f.id == folder_id) {
            return;
        }

        let snapshot = self.capture_both();
        let selected_was_member = self.conversation.as_ref().is_some_and(|conversation| {
            return self.chats.iter().any(|c| {
                return c.id == conversation.chat_id && c.folder_id.as_deref() == Some(folder_id);
            });
        });

        self.folders.retain(|f| return f.id != folder_id);
        for chat in self.chats.iter_mut() {
            if chat.folder_id.as_deref() == Some(folder_id) {
                chat.folder_id = None;
            }
        }
        if selected_was_member {
            self.reset_conversation();
        }

        let result = self.store.delete_folder(folder_id).await;
        self.finish_mutation(snapshot, result, ErrorScope::Folders, "Delete");
    }

    // --- Assign ---

    /// Moves a chat into a folder, shifting the derived chat counts with it.
    pub async fn assign_chat(&mut self, chat_id: &str, folder_id: &str) {
        let Some(chat) = self.chats.iter().find(|c| return c.id == chat_id) else {
            return;
        };
        if !self.folders.iter().any(|f| return f.id == folder_id) {
            return;
        }
        let old_folder_id = chat.folder_id.clone();

        let snapshot = self.capture_both();
        if let Some(chat) = self.chats.iter_mut().find(|c| return c.id == chat_id) {
            chat.folder_id = Some(folder_id.to_string());
        }
        for folder in self.folders.iter_mut() {
            if folder.id == folder_id {
                folder.chat_count += 1;
            } else if Some(folder.id.as_str()) == old_folder_id.as_deref() {
                folder.chat_count = folder.chat_count.saturating_sub(1);
            }
        }

        let result = self
            .replace_chat(chat_id, |record| {
                record.folder_id = Some(folder_id.to_string());
            })
            .await;
        self.finish_mutation(snapshot, result, ErrorScope::Chats, "Assign");
    }

    // --- Conversation ---

    pub fn reset_conversation(&mut self) {
        self.conversation = None;
    }

    fn select_new_chat(&mut self, chat_id: &str, title: &str) {
        self.conversation = Some(Conversation {
            chat_id: chat_id.to_string(),
            title: title.to_string(),
            messages: vec![Message::synthetic(
                &format!("welcome_{chat_id}"),
                &format!(
                    "Hello, {}! How can I assist you today?",
                    self.identity.display_name()
                ),
            )],
        });
    }

    /// Opens a chat and loads its stored messages. A load failure shows a
    /// synthetic error message in the view instead of failing the caller.
    pub async fn select_chat(&mut self, chat_id: &str) {
        let local_title = self
            .chats
            .iter()
            .find(|c| return c.id == chat_id)
            .map(|c| return c.title.clone());

        match self.store.get_chat(chat_id).await {
            Ok(record) => {
                let mut messages = record.sorted_messages();
                if messages.is_empty() {
                    messages.push(Message::synthetic(
                        "empty",
                        "This chat seems empty. Start the conversation!",
                    ));
                }
                self.conversation = Some(Conversation {
                    chat_id: chat_id.to_string(),
                    title: local_title.unwrap_or(record.name),
                    messages,
                });
            }
            Err(err) => {
                tracing::error!(error = %err, chat_id, "Failed to load chat");
                self.conversation = Some(Conversation {
                    chat_id: chat_id.to_string(),
                    title: local_title.unwrap_or_else(|| return "Chat".to_string()),
                    messages: vec![Message::error("err_load", "Failed to load this chat.")],
                });
            }
        }
    }

    /// Appends the user's message immediately; it is never rolled back. The
    /// generated reply is appended on success and both messages are merged
    /// into the remote record. On generation failure a synthetic error
    /// message takes the reply's place and only the user's message is saved.
    pub async fn send_message(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        if self.conversation.is_none() {
            self.raise(
                ErrorScope::Chats,
                ErrorBanner::transient("Select a chat before sending a message.".to_string()),
            );
            return;
        }

        let user_message = Message::user(content);
        if let Some(conversation) = &mut self.conversation {
            conversation.messages.push(user_message.clone());
        }

        match self.completion.generate(content).await {
            Ok(reply) => {
                let assistant_message = Message::assistant(&reply);
                if let Some(conversation) = &mut self.conversation {
                    conversation.messages.push(assistant_message.clone());
                }

                if let Err(err) = self
                    .persist_messages(&[user_message, assistant_message])
                    .await
                {
                    tracing::error!(error = %err, "Failed to save conversation");
                    if let Some(conversation) = &mut self.conversation {
                        conversation
                            .messages
                            .push(Message::error("err_save", "[Save failed.]"));
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Completion request failed");
                if let Some(conversation) = &mut self.conversation {
                    conversation
                        .messages
                        .push(Message::error("err_model", "Error getting response."));
                }

                // The user's words still deserve to land in the store.
                if let Err(save_err) = self.persist_messages(&[user_message]).await {
                    tracing::error!(error = %save_err, "Failed to save user message");
                }
            }
        }
    }

    // --- Remote merge helpers ---

    async fn replace_chat<F>(&self, chat_id: &str, merge: F) -> Result<()>
    where
        F: FnOnce(&mut ChatRecord),
    {
        let mut record = self.store.get_chat(chat_id).await?;
        record.chat_id = chat_id.to_string();
        merge(&mut record);
        return self.store.update_chat(&record).await;
    }

    async fn replace_folder<F>(&self, folder_id: &str, merge: F) -> Result<()>
    where
        F: FnOnce(&mut FolderRecord),
    {
        // The original client tolerates a failed pre-update read for folders
        // by rebuilding the record from local state.
        let mut record = match self.store.get_folder(folder_id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, folder_id, "Pre-update read failed, rebuilding from local state");
                let Some(folder) = self.folders.iter().find(|f| return f.id == folder_id) else {
                    return Err(err);
                };
                FolderRecord::from_local(folder)
            }
        };
        record.folder_id = folder_id.to_string();
        merge(&mut record);
        return self.store.update_folder(&record).await;
    }

    async fn persist_messages(&self, messages: &[Message]) -> Result<()> {
        let Some(conversation) = &self.conversation else {
            return Ok(());
        };

        let mut record = self.store.get_chat(&conversation.chat_id).await?;
        record.chat_id = conversation.chat_id.clone();
        for message in messages {
            record.insert_message(message);
        }
        return self.store.update_chat(&record).await;
    }
}
