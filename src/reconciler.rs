//! Splaylist cache reconciliation.
//!
//! A sync brings the cache in line with the remote listing:
//!
//! - playlists not seen before are fetched and added,
//! - playlists whose remote `last_modified` is newer are refetched,
//! - cached playlists missing from the listing are dropped,
//! - auto playlists are never cached.
//!
//! Deletions are found by copying the cache's key set and crossing ids off as
//! the listing is walked; whatever is left over was deleted remotely.

use std::collections::{BTreeSet, HashSet};

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::cache::{CachedPlaylist, PlaylistCache};
use crate::error::SyncError;
use crate::reporting::{ErrorReport, ErrorSink};
use crate::service::{AutoPlaylist, RemoteSource};

const LISTING_FAILURE: &str = "error during splaylist cache sync";
const CONTENT_FAILURE: &str = "error during splaylist cache sync: fetching contents";

/// Outcome of a sync that got past the listing fetch.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Ids removed from the cache because the listing no longer has them
    pub deleted: HashSet<String>,
    /// Ids whose contents were (re)fetched and stored, sorted
    pub refreshed: Vec<String>,
    /// Content fetches that failed, ordered by playlist id. The affected
    /// entries are left as they were.
    pub failures: Vec<SyncError>,
    /// Listed playlists that were already current
    pub unchanged: usize,
}

impl SyncReport {
    pub fn failed_ids(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter_map(|f| f.playlist_id().map(str::to_string))
            .collect()
    }

    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.refreshed.is_empty() && self.failures.is_empty()
    }
}

pub struct Reconciler<S, E> {
    source: S,
    sink: E,
}

impl<S, E> Reconciler<S, E>
where
    S: RemoteSource,
    E: ErrorSink,
{
    pub fn new(source: S, sink: E) -> Self {
        Self { source, sink }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// Update `cache` to reflect the remote state for `user`.
    ///
    /// Playlists whose ids appear in `auto_playlists` are skipped. If the
    /// listing itself cannot be fetched the failure is reported, the cache is
    /// left as it was and `SyncError::Listing` is returned. Content fetch
    /// failures are reported per playlist and collected in `SyncReport::failures`.
    ///
    /// An id listed more than once is only considered at its first
    /// occurrence; later entries with that id are ignored, even if they carry
    /// a newer `last_modified`.
    pub async fn sync(
        &self,
        cache: &mut PlaylistCache,
        user: &S::User,
        auto_playlists: &[AutoPlaylist],
    ) -> Result<SyncReport, SyncError> {
        tracing::info!(
            "syncing splaylist cache from {}. current cache has: {}",
            self.source.source_name(),
            cache.len()
        );
        let auto_ids: HashSet<&str> = auto_playlists
            .iter()
            .map(|p| p.remote_id.as_str())
            .collect();

        let fresh = match self.source.get_playlists(user).await {
            Ok(playlists) => playlists,
            Err(error) => {
                self.sink.report(
                    ErrorReport::new(LISTING_FAILURE)
                        .extra("error", format!("{:#}", error))
                        .with_stack(),
                );
                return Err(SyncError::Listing { error });
            }
        };
        tracing::debug!("got {} splaylists", fresh.len());

        let mut stale_ids: HashSet<String> = cache.splaylists.keys().cloned().collect();
        let mut considered: HashSet<&str> = HashSet::new();
        let mut report = SyncReport::default();
        let mut fetches = FuturesUnordered::new();

        for playlist in &fresh {
            if auto_ids.contains(playlist.id.as_str()) {
                continue;
            }
            if !considered.insert(playlist.id.as_str()) {
                tracing::debug!("ignoring duplicate listing for splaylist {}", playlist.id);
                continue;
            }

            // Mark as seen.
            let is_new = !stale_ids.remove(&playlist.id);
            let outdated = cache
                .get(&playlist.id)
                .map_or(true, |cached| cached.last_modified < playlist.last_modified);

            if !(is_new || outdated) {
                report.unchanged += 1;
                continue;
            }

            tracing::debug!("sync splaylist \"{}\"", playlist.title);
            let source = &self.source;
            fetches.push(async move {
                let contents = source.get_playlist_contents(user, &playlist.id).await;
                (playlist, contents)
            });
        }

        for deleted_id in &stale_ids {
            if let Some(removed) = cache.splaylists.remove(deleted_id) {
                tracing::debug!("splaylist \"{}\" was deleted", removed.title);
            }
        }

        while let Some((playlist, contents)) = fetches.next().await {
            match contents {
                Ok(entries) => {
                    let track_ids: BTreeSet<String> =
                        entries.into_iter().map(|entry| entry.track.id).collect();
                    cache.splaylists.insert(
                        playlist.id.clone(),
                        CachedPlaylist::from_remote(playlist, track_ids),
                    );
                    report.refreshed.push(playlist.id.clone());
                }
                Err(error) => {
                    self.sink.report(
                        ErrorReport::new(CONTENT_FAILURE)
                            .tag("playlistId", playlist.id.as_str())
                            .extra("error", format!("{:#}", error))
                            .with_stack(),
                    );
                    let failure = SyncError::Content {
                        playlist_id: playlist.id.clone(),
                        error,
                    };
                    tracing::debug!("{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        report.refreshed.sort();
        report
            .failures
            .sort_by(|a, b| a.playlist_id().cmp(&b.playlist_id()));
        report.deleted = stale_ids;

        tracing::info!(
            "splaylist cache synced: {} refreshed, {} unchanged, {} deleted, {} failed",
            report.refreshed.len(),
            report.unchanged,
            report.deleted.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Callback flavour of [`Reconciler::sync`].
    ///
    /// `on_complete` receives the deleted ids, or an empty set when the listing
    /// fetch failed. Callers that need to tell those apart should use `sync`.
    pub async fn sync_with<F>(
        &self,
        cache: &mut PlaylistCache,
        user: &S::User,
        auto_playlists: &[AutoPlaylist],
        on_complete: F,
    ) where
        F: FnOnce(HashSet<String>),
    {
        let deleted = match self.sync(cache, user, auto_playlists).await {
            Ok(report) => report.deleted,
            Err(_) => HashSet::new(),
        };
        on_complete(deleted);
    }
}
