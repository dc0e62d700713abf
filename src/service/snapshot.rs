//! Remote source backed by a JSON snapshot on disk.
//!
//! The file is re-read on every call so edits between syncs are picked up.
//! Layout:
//!
//! ```json
//! {
//!   "playlists": [{"id": "p1", "title": "Road trip", "lastModified": 3}],
//!   "contents": {"p1": [{"track": {"id": "t1"}}]}
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{PlaylistEntry, RemotePlaylist, RemoteSource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub playlists: Vec<RemotePlaylist>,
    #[serde(default)]
    pub contents: HashMap<String, Vec<PlaylistEntry>>,
}

pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Snapshot> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot {}", self.path.display()))
    }
}

#[async_trait]
impl RemoteSource for SnapshotSource {
    /// Snapshots hold a single user's library; the name is only logged.
    type User = String;

    fn source_name(&self) -> &str {
        "snapshot"
    }

    async fn get_playlists(&self, user: &String) -> Result<Vec<RemotePlaylist>> {
        let snapshot = self.load().await?;
        tracing::debug!(
            "snapshot {} lists {} playlists for {}",
            self.path.display(),
            snapshot.playlists.len(),
            user
        );
        Ok(snapshot.playlists)
    }

    async fn get_playlist_contents(
        &self,
        _user: &String,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistEntry>> {
        let mut snapshot = self.load().await?;
        snapshot
            .contents
            .remove(playlist_id)
            .ok_or_else(|| anyhow!("No contents for playlist {} in snapshot", playlist_id))
    }
}
