pub mod snapshot;

#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A playlist as returned by the remote listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    pub id: String,
    pub title: String,
    /// Remote modification version. Only compared, never interpreted.
    #[serde(rename = "lastModified", alias = "last_modified")]
    pub last_modified: i64,
}

/// A system-generated playlist that must never be cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPlaylist {
    #[serde(rename = "remoteId", alias = "remote_id")]
    pub remote_id: String,
    #[serde(default)]
    pub title: String,
}

impl AutoPlaylist {
    pub fn new(remote_id: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            title: String::new(),
        }
    }
}

/// Reference to the track an entry points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTrack {
    pub id: String,
}

/// One element of a playlist's contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Entry id, distinct from the track id (the same track may appear twice)
    #[serde(default)]
    pub id: Option<String>,
    pub track: EntryTrack,
}

impl PlaylistEntry {
    pub fn for_track(track_id: impl Into<String>) -> Self {
        Self {
            id: None,
            track: EntryTrack { id: track_id.into() },
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track.id
    }
}

/// The authoritative remote playlist service.
///
/// Methods take `&self` so several content fetches can be in flight at once.
/// Implementations own their retry and timeout policy.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Identity/context forwarded to every call. Opaque to the reconciler.
    type User: Send + Sync;

    /// Human-readable source name for logs
    fn source_name(&self) -> &str;

    /// Get every playlist owned by `user`
    async fn get_playlists(&self, user: &Self::User) -> Result<Vec<RemotePlaylist>>;

    /// Get the entries of one playlist
    async fn get_playlist_contents(
        &self,
        user: &Self::User,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistEntry>>;
}

pub use snapshot::SnapshotSource;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_playlist_accepts_both_field_spellings() {
        let camel: RemotePlaylist =
            serde_json::from_str(r#"{"id": "p1", "title": "Mix", "lastModified": 7}"#).unwrap();
        let snake: RemotePlaylist =
            serde_json::from_str(r#"{"id": "p1", "title": "Mix", "last_modified": 7}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.last_modified, 7);
    }

    #[test]
    fn test_entry_without_id() {
        let entry: PlaylistEntry = serde_json::from_str(r#"{"track": {"id": "t9"}}"#).unwrap();
        assert_eq!(entry.track_id(), "t9");
        assert!(entry.id.is_none());
        assert_eq!(entry, PlaylistEntry::for_track("t9"));
    }
}
