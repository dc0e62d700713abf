//! In-memory remote source for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{PlaylistEntry, RemotePlaylist, RemoteSource};

#[derive(Default)]
pub struct MockSource {
    playlists: Mutex<Vec<RemotePlaylist>>,
    contents: Mutex<HashMap<String, Vec<PlaylistEntry>>>,
    failing_contents: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    fail_listing: Mutex<bool>,
    content_fetches: AtomicUsize,
    fetched_ids: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a playlist to the listing along with the tracks its contents return.
    pub fn with_playlist(self, id: &str, last_modified: i64, tracks: &[&str]) -> Self {
        self.set_playlist(id, last_modified, tracks);
        self
    }

    pub fn set_playlist(&self, id: &str, last_modified: i64, tracks: &[&str]) {
        let mut playlists = self.playlists.lock().unwrap();
        let record = RemotePlaylist {
            id: id.to_string(),
            title: format!("Playlist {}", id),
            last_modified,
        };
        match playlists.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = record,
            None => playlists.push(record),
        }
        self.contents.lock().unwrap().insert(
            id.to_string(),
            tracks.iter().map(|t| PlaylistEntry::for_track(*t)).collect(),
        );
    }

    /// Append a listing record without touching contents (used for duplicates).
    pub fn push_listing(&self, id: &str, last_modified: i64) {
        self.playlists.lock().unwrap().push(RemotePlaylist {
            id: id.to_string(),
            title: format!("Playlist {}", id),
            last_modified,
        });
    }

    pub fn remove_playlist(&self, id: &str) {
        self.playlists.lock().unwrap().retain(|p| p.id != id);
        self.contents.lock().unwrap().remove(id);
    }

    pub fn fail_contents(&self, id: &str) {
        self.failing_contents.lock().unwrap().insert(id.to_string());
    }

    pub fn delay_contents(&self, id: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(id.to_string(), delay);
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    pub fn content_fetches(&self) -> usize {
        self.content_fetches.load(Ordering::SeqCst)
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetched_ids.lock().unwrap().clone()
    }

    pub fn reset_counters(&self) {
        self.content_fetches.store(0, Ordering::SeqCst);
        self.fetched_ids.lock().unwrap().clear();
    }
}

#[async_trait]
impl RemoteSource for MockSource {
    type User = String;

    fn source_name(&self) -> &str {
        "mock"
    }

    async fn get_playlists(&self, _user: &String) -> Result<Vec<RemotePlaylist>> {
        if *self.fail_listing.lock().unwrap() {
            return Err(anyhow!("listing unavailable"));
        }
        Ok(self.playlists.lock().unwrap().clone())
    }

    async fn get_playlist_contents(
        &self,
        _user: &String,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistEntry>> {
        self.content_fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.lock().unwrap().push(playlist_id.to_string());

        let delay = self.delays.lock().unwrap().get(playlist_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_contents.lock().unwrap().contains(playlist_id) {
            return Err(anyhow!("contents unavailable for {}", playlist_id));
        }
        self.contents
            .lock()
            .unwrap()
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown playlist {}", playlist_id))
    }
}
