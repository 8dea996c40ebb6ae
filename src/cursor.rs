//! Cursor persistence for the mention poller.
//!
//! The only state the bot keeps between runs is the id of the most recently
//! processed mention. It lives in a small JSON file (`{"since_id": "..."}`)
//! that is read at the start of every poll cycle and overwritten at the end.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The persisted cursor record.
///
/// Fields other than `since_id` found in the file are kept and written back
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Id of the most recently processed mention, absent on first run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_id: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Cursor {
    /// A cursor pointing at the given mention id.
    pub fn at(since_id: impl Into<String>) -> Self {
        Cursor {
            since_id: Some(since_id.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Reads and writes the cursor file.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CursorStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seeds an empty cursor file if none exists yet.
    ///
    /// Called once at startup so that the first cycle runs an unfiltered
    /// query. An existing file is left as it is.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: If a new file was created
    /// - `Ok(false)`: If the file already existed
    pub async fn ensure_exists(&self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(false),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                info!(
                    "No cursor file at {}, creating an empty one",
                    self.path.display()
                );
                self.write(&Cursor::default()).await?;
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the cursor file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, or not a JSON object.
    pub async fn read(&self) -> Result<Cursor, Box<dyn std::error::Error + Send + Sync>> {
        debug!("Reading cursor file {}", self.path.display());
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| format!("Failed to read cursor file {}: {}", self.path.display(), e))?;
        let cursor: Cursor = serde_json::from_slice(&data)
            .map_err(|e| format!("Failed to parse cursor file {}: {}", self.path.display(), e))?;
        debug!("Cursor loaded: since_id={:?}", cursor.since_id);
        Ok(cursor)
    }

    /// Overwrites the cursor file.
    ///
    /// The new contents are written to a sibling temporary file and renamed
    /// over the old one, so a reader never sees a half-written cursor.
    pub async fn write(&self, cursor: &Cursor) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Writing cursor file {} with since_id={:?}",
            self.path.display(),
            cursor.since_id
        );
        let data = serde_json::to_vec(cursor)?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "params.json".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, &data).await.map_err(|e| {
            format!("Failed to write cursor file {}: {}", tmp_path.display(), e)
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            format!("Failed to replace cursor file {}: {}", self.path.display(), e)
        })?;
        Ok(())
    }
}
