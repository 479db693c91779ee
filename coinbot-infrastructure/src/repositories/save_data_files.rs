use std::path::PathBuf;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde_json::{Map, Value};

use coinbot_domain::{PlatformUser, SaveDataRepository, UserSaveRecord};

use crate::utils::{read_optional, to_python_json, write_atomic};

/// One JSON object per user at `<root>/<user_id>.json`.
pub struct SaveDataFileRepository {
    root: PathBuf,
}

impl SaveDataFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, user_id: u64) -> PathBuf {
        self.root.join(format!("{}.json", user_id))
    }
}

/// Older files may hold several one-key objects on separate lines; later
/// lines win.
fn parse_record(content: &str) -> anyhow::Result<UserSaveRecord> {
    let mut merged = Map::new();
    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(object) => merged.extend(object),
            other => return Err(anyhow!("expected a JSON object, got {}", other)),
        }
    }

    let mut record = UserSaveRecord::default();
    for (key, value) in merged {
        match (key.as_str(), value) {
            ("user_id", Value::Number(number)) => record.user_id = number.as_u64(),
            ("user_id", Value::String(text)) => record.user_id = text.parse().ok(),
            ("user_name", Value::String(text)) => record.user_name = Some(text),
            (_, Value::String(text)) => record.set(key, text),
            (_, Value::Bool(flag)) => record.set(key, if flag { "True" } else { "False" }),
            (_, Value::Null) => {}
            (_, other) => record.set(key, other.to_string()),
        }
    }
    Ok(record)
}

#[async_trait]
impl SaveDataRepository for SaveDataFileRepository {
    async fn load(&self, user_id: u64) -> anyhow::Result<Option<UserSaveRecord>> {
        let path = self.record_path(user_id);
        let Some(content) = read_optional(&path).await? else {
            return Ok(None);
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        parse_record(&content)
            .map(Some)
            .with_context(|| format!("corrupt save data in {}", path.display()))
    }

    async fn set(&self, user: &PlatformUser, key: &str, value: &str) -> anyhow::Result<()> {
        let mut record = self
            .load(user.id)
            .await?
            .unwrap_or_else(|| UserSaveRecord::for_user(user.id, user.display_name.clone()));
        record.user_id = Some(user.id);
        record.user_name = Some(user.display_name.clone());
        record.set(key, value);
        let content = to_python_json(&record)?;
        write_atomic(&self.record_path(user.id), content.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbot_domain::{FLAG_TRUE, STARTING_BONUS_KEY};

    #[tokio::test]
    async fn set_merges_into_existing_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = SaveDataFileRepository::new(dir.path().join("save_data"));
        let user = PlatformUser::new(42, "ada");
        assert_eq!(repo.load(42).await.expect("load"), None);

        repo.set(&user, "theme", "dark").await.expect("set");
        repo.set(&user, STARTING_BONUS_KEY, FLAG_TRUE).await.expect("set");

        assert_eq!(
            repo.get(42, "theme").await.expect("get").as_deref(),
            Some("dark")
        );
        let record = repo.load(42).await.expect("load").expect("present");
        assert!(record.starting_bonus_received());
        assert_eq!(record.user_name.as_deref(), Some("ada"));
        assert_eq!(repo.get(42, "missing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn reads_legacy_multi_line_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("9.json"),
            "{\"starting_bonus_received\": \"False\"}\n{\"starting_bonus_received\": \"True\"}",
        )
        .expect("write");
        let repo = SaveDataFileRepository::new(dir.path());
        let record = repo.load(9).await.expect("load").expect("present");
        assert_eq!(record.user_id, None);
        assert!(record.starting_bonus_received());
    }

    #[tokio::test]
    async fn empty_legacy_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("9.json"), "").expect("write");
        let repo = SaveDataFileRepository::new(dir.path());
        assert_eq!(repo.load(9).await.expect("load"), None);
    }

    #[test]
    fn boolean_values_are_stored_as_python_flags() {
        let record = parse_record(r#"{"user_id": 3, "starting_bonus_received": true}"#).expect("parse");
        assert_eq!(record.user_id, Some(3));
        assert!(record.starting_bonus_received());
    }
}
