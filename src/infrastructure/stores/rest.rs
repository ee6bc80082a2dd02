#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;

use std::collections::HashMap;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_derive::Deserialize;
use serde_derive::Serialize as SerializeDerive;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRecord;
use crate::domain::models::FolderRecord;
use crate::domain::models::RecordStore;

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(SerializeDerive)]
struct LoginRecord {
    timestamp: String,
    user_name: String,
    user_email: String,
}

/// Client for the remote key-value record store. One collection per entity
/// type, full-record replace on update.
pub struct RestStore {
    url: String,
    client: reqwest::Client,
}

impl Default for RestStore {
    fn default() -> RestStore {
        return RestStore::with_url(Config::get(ConfigKey::StoreUrl));
    }
}

async fn ensure_success(res: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|err| return err.detail)
        .unwrap_or(body);

    tracing::error!(status = status.as_u16(), what, detail, "Record store request failed");
    if detail.is_empty() {
        bail!("{what} returned status {}", status.as_u16());
    }
    bail!("{detail}");
}

impl RestStore {
    pub fn with_url(url: String) -> RestStore {
        return RestStore {
            url,
            client: reqwest::Client::new(),
        };
    }

    async fn get_all(&self, collection: &str) -> Result<HashMap<String, String>> {
        let res = self
            .client
            .get(format!("{}/{collection}/getall", self.url))
            .send()
            .await?;

        let res = ensure_success(res, "getall").await?;
        return Ok(res.json::<HashMap<String, String>>().await?);
    }

    async fn get_record<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T> {
        let res = self
            .client
            .get(format!("{}/{collection}/get/{id}", self.url))
            .send()
            .await?;

        let res = ensure_success(res, "get").await?;
        return Ok(res.json::<T>().await?);
    }

    async fn add_record<T: Serialize + Sync>(&self, collection: &str, record: &T) -> Result<()> {
        let res = self
            .client
            .post(format!("{}/{collection}/add", self.url))
            .json(record)
            .send()
            .await?;

        ensure_success(res, "add").await?;
        return Ok(());
    }

    async fn update_record<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<()> {
        let res = self
            .client
            .put(format!("{}/{collection}/update/{id}", self.url))
            .json(record)
            .send()
            .await?;

        ensure_success(res, "update").await?;
        return Ok(());
    }

    async fn delete_record(&self, collection: &str, id: &str) -> Result<()> {
        let res = self
            .client
            .delete(format!("{}/{collection}/delete/{id}", self.url))
            .send()
            .await?;

        ensure_success(res, "delete").await?;
        return Ok(());
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn get_all_chats(&self) -> Result<HashMap<String, String>> {
        return self.get_all("chat").await;
    }

    async fn get_chat(&self, id: &str) -> Result<ChatRecord> {
        return self.get_record("chat", id).await;
    }

    async fn add_chat(&self, record: &ChatRecord) -> Result<()> {
        return self.add_record("chat", record).await;
    }

    async fn update_chat(&self, record: &ChatRecord) -> Result<()> {
        return self.update_record("chat", &record.chat_id, record).await;
    }

    async fn delete_chat(&self, id: &str) -> Result<()> {
        return self.delete_record("chat", id).await;
    }

    async fn get_all_folders(&self) -> Result<HashMap<String, String>> {
        return self.get_all("folder").await;
    }

    async fn get_folder(&self, id: &str) -> Result<FolderRecord> {
        return self.get_record("folder", id).await;
    }

    async fn add_folder(&self, record: &FolderRecord) -> Result<()> {
        return self.add_record("folder", record).await;
    }

    async fn update_folder(&self, record: &FolderRecord) -> Result<()> {
        return self.update_record("folder", &record.folder_id, record).await;
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        return self.delete_record("folder", id).await;
    }

    async fn record_login(&self, name: &str, email: &str) -> Result<()> {
        let record = LoginRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            user_name: name.to_string(),
            user_email: email.to_string(),
        };

        return self.add_record("login", &record).await;
    }
}
