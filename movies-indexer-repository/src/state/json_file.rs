//! JSON file implementation of the state storage.

use async_trait::async_trait;
use movies_indexer_shared::Watermarks;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::errors::StateError;
use crate::interfaces::StateStorage;

/// File-backed state storage.
///
/// Saves go through a temporary file in the same directory followed by a
/// rename, so readers only ever see a complete document.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStorage for JsonFileStorage {
    async fn load(&self) -> Result<Watermarks, StateError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file, starting from empty watermarks");
                return Ok(Watermarks::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Watermarks>(&bytes) {
            Ok(watermarks) => {
                debug!(path = %self.path.display(), entries = watermarks.len(), "Loaded state file");
                Ok(watermarks)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "State file is unreadable, starting from empty watermarks"
                );
                Ok(Watermarks::new())
            }
        }
    }

    async fn save(&self, watermarks: &Watermarks) -> Result<(), StateError> {
        let contents = serde_json::to_vec_pretty(watermarks)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), "Saved state file");
        Ok(())
    }
}
