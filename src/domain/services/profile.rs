#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::UserIdentity;

/// Client-local state that survives across invocations: who is signed in and
/// which theme they picked. Everything else lives in the remote store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub identity: UserIdentity,
    #[serde(default)]
    pub theme: String,
}

pub struct Profile {
    pub config_dir: path::PathBuf,
}

impl Default for Profile {
    fn default() -> Profile {
        let config_dir = dirs::config_dir().unwrap().join("granary");

        return Profile::new(config_dir);
    }
}

impl Profile {
    pub fn new(config_dir: path::PathBuf) -> Profile {
        return Profile { config_dir };
    }

    fn file_path(&self) -> path::PathBuf {
        return self.config_dir.join("profile.json");
    }

    pub async fn load(&self) -> Result<Option<StoredProfile>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(file_path).await?;
        let profile: StoredProfile = serde_json::from_str(&payload)?;

        return Ok(Some(profile));
    }

    pub async fn save(&self, profile: &StoredProfile) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).await?;
        }

        let payload = serde_json::to_string_pretty(profile)?;
        let mut file = fs::File::create(self.file_path()).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }

    pub async fn set_theme(&self, theme: &str) -> Result<()> {
        let mut profile = self.load().await?.unwrap_or_default();
        profile.theme = theme.to_string();

        return self.save(&profile).await;
    }

    pub async fn clear(&self) -> Result<()> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }
}
