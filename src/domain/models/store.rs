use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use super::ChatRecord;
use super::FolderRecord;

pub type StoreBox = Box<dyn RecordStore + Send + Sync>;

/// The remote key-value record store behind the chat and folder collections.
///
/// `get_all_*` returns the raw id → string-encoded record mapping; callers
/// decode and validate each entry. Updates replace whole records, which is
/// why every mutation reads the current record first and merges into it.
#[async_trait]
pub trait RecordStore {
    async fn get_all_chats(&self) -> Result<HashMap<String, String>>;
    async fn get_chat(&self, id: &str) -> Result<ChatRecord>;
    async fn add_chat(&self, record: &ChatRecord) -> Result<()>;
    async fn update_chat(&self, record: &ChatRecord) -> Result<()>;
    async fn delete_chat(&self, id: &str) -> Result<()>;

    async fn get_all_folders(&self) -> Result<HashMap<String, String>>;
    async fn get_folder(&self, id: &str) -> Result<FolderRecord>;
    async fn add_folder(&self, record: &FolderRecord) -> Result<()>;
    async fn update_folder(&self, record: &FolderRecord) -> Result<()>;
    async fn delete_folder(&self, id: &str) -> Result<()>;

    /// Best-effort sign-in ledger. Failures are traced and ignored.
    async fn record_login(&self, name: &str, email: &str) -> Result<()>;
}
