//! Local mirror of the user's splaylists.
//!
//! Cached splaylists carry a `track_ids` set on top of the remote record so
//! playlist linking can check membership without refetching contents.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::service::RemotePlaylist;

/// A splaylist as held in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPlaylist {
    pub id: String,
    /// Display name, only used for logging
    pub title: String,
    /// Remote version; compared against the listing to decide on a refetch
    pub last_modified: i64,
    /// Current membership. Always replaced as a whole.
    #[serde(default)]
    pub track_ids: BTreeSet<String>,
}

impl CachedPlaylist {
    pub fn from_remote(playlist: &RemotePlaylist, track_ids: BTreeSet<String>) -> Self {
        Self {
            id: playlist.id.clone(),
            title: playlist.title.clone(),
            last_modified: playlist.last_modified,
            track_ids,
        }
    }

    pub fn contains_track(&self, track_id: &str) -> bool {
        self.track_ids.contains(track_id)
    }
}

/// Cache of splaylists keyed by playlist id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistCache {
    #[serde(default)]
    pub splaylists: HashMap<String, CachedPlaylist>,
}

impl PlaylistCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.splaylists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splaylists.is_empty()
    }

    pub fn get(&self, playlist_id: &str) -> Option<&CachedPlaylist> {
        self.splaylists.get(playlist_id)
    }

    /// Every cached splaylist that contains `track_id`, ordered by id.
    pub fn playlists_containing(&self, track_id: &str) -> Vec<&CachedPlaylist> {
        let mut found: Vec<&CachedPlaylist> = self
            .splaylists
            .values()
            .filter(|p| p.contains_track(track_id))
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

/// Return a new, empty cache.
pub fn open() -> PlaylistCache {
    PlaylistCache::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(id: &str, tracks: &[&str]) -> CachedPlaylist {
        CachedPlaylist {
            id: id.to_string(),
            title: format!("Playlist {}", id),
            last_modified: 1,
            track_ids: tracks.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_open_is_empty() {
        let cache = open();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_playlists_containing() {
        let mut cache = open();
        cache.splaylists.insert("b".into(), cached("b", &["t1", "t2"]));
        cache.splaylists.insert("a".into(), cached("a", &["t1"]));
        cache.splaylists.insert("c".into(), cached("c", &["t3"]));

        let ids: Vec<&str> = cache
            .playlists_containing("t1")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(cache.playlists_containing("missing").is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut cache = open();
        cache.splaylists.insert("p1".into(), cached("p1", &["t2", "t1"]));

        let value = serde_json::to_value(&cache).unwrap();
        let entry = &value["splaylists"]["p1"];
        assert_eq!(entry["id"], "p1");
        assert_eq!(entry["last_modified"], 1);
        assert_eq!(entry["track_ids"], serde_json::json!(["t1", "t2"]));

        let back: PlaylistCache = serde_json::from_value(value).unwrap();
        assert_eq!(back, cache);
    }

    #[test]
    fn test_missing_track_ids_default_to_empty() {
        let json = r#"{"splaylists": {"p1": {"id": "p1", "title": "x", "last_modified": 3}}}"#;
        let cache: PlaylistCache = serde_json::from_str(json).unwrap();
        assert!(cache.get("p1").unwrap().track_ids.is_empty());
    }
}
