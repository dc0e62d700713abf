//! Periodic sync driver.
//!
//! Each pass loads the persisted cache (or starts from an empty one), runs a
//! sync, and saves the result. Passes never overlap, so the cache only ever
//! has one writer.

use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;

use crate::cache::{self, PlaylistCache};
use crate::error::SyncError;
use crate::reconciler::{Reconciler, SyncReport};
use crate::reporting::ErrorSink;
use crate::service::{AutoPlaylist, RemoteSource};
use crate::storage::CacheStorage;

pub struct SyncLoop<S, E, T>
where
    S: RemoteSource,
{
    reconciler: Reconciler<S, E>,
    storage: T,
    user: S::User,
    auto_playlists: Vec<AutoPlaylist>,
}

impl<S, E, T> SyncLoop<S, E, T>
where
    S: RemoteSource,
    E: ErrorSink,
    T: CacheStorage,
{
    pub fn new(
        reconciler: Reconciler<S, E>,
        storage: T,
        user: S::User,
        auto_playlists: Vec<AutoPlaylist>,
    ) -> Self {
        Self {
            reconciler,
            storage,
            user,
            auto_playlists,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S, E> {
        &self.reconciler
    }

    pub fn storage(&self) -> &T {
        &self.storage
    }

    async fn load(&self) -> Result<PlaylistCache> {
        match self.storage.load_cache().await? {
            Some(cache) => Ok(cache),
            None => {
                tracing::info!(
                    "no saved cache in {} storage, starting empty",
                    self.storage.backend_name()
                );
                Ok(cache::open())
            }
        }
    }

    /// Run one load → sync → save pass.
    ///
    /// A listing failure is returned as `Ok(Err(..))` and nothing is saved;
    /// storage failures are returned as the outer error.
    pub async fn run_once(&self) -> Result<Result<SyncReport, SyncError>> {
        let mut cache = self.load().await?;

        match self
            .reconciler
            .sync(&mut cache, &self.user, &self.auto_playlists)
            .await
        {
            Ok(report) => {
                self.storage.save_cache(&cache).await?;
                tracing::debug!(
                    "saved {} splaylists to {} storage",
                    cache.len(),
                    self.storage.backend_name()
                );
                Ok(Ok(report))
            }
            Err(e) => Ok(Err(e)),
        }
    }

    /// Sync every `interval` until `passes` runs complete (forever if `None`).
    ///
    /// The first pass runs immediately. Failed passes are logged and the loop
    /// carries on; the next tick retries.
    pub async fn run(&self, interval: Duration, passes: Option<usize>) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0usize;

        loop {
            if passes.is_some_and(|limit| completed >= limit) {
                return Ok(());
            }
            ticker.tick().await;

            match self.run_once().await {
                Ok(Ok(report)) => {
                    if !report.deleted.is_empty() {
                        let mut deleted: Vec<&String> = report.deleted.iter().collect();
                        deleted.sort();
                        tracing::info!("removed splaylists: {:?}", deleted);
                    }
                }
                Ok(Err(e)) => tracing::warn!("Sync pass skipped: {}", e),
                Err(e) => tracing::error!("Sync pass failed: {:#}", e),
            }
            completed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::RecordingSink;
    use crate::service::mock::MockSource;
    use crate::storage::LocalStorage;

    fn sync_loop(
        source: MockSource,
        dir: &tempfile::TempDir,
    ) -> SyncLoop<MockSource, RecordingSink, LocalStorage> {
        let storage = LocalStorage::open(&dir.path().join("cache.redb")).unwrap();
        SyncLoop::new(
            Reconciler::new(source, RecordingSink::new()),
            storage,
            "test-user".to_string(),
            vec![AutoPlaylist::new("auto")],
        )
    }

    #[tokio::test]
    async fn test_run_once_persists_result() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new()
            .with_playlist("p1", 1, &["t1"])
            .with_playlist("auto", 1, &["t2"]);
        let sync_loop = sync_loop(source, &dir);

        let report = sync_loop.run_once().await.unwrap().unwrap();
        assert_eq!(report.refreshed, vec!["p1".to_string()]);

        let saved = sync_loop.storage().load_cache().await.unwrap().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved.get("p1").unwrap().contains_track("t1"));
    }

    #[tokio::test]
    async fn test_second_pass_starts_from_saved_cache() {
        let dir = tempfile::tempdir().unwrap();
        let sync_loop = sync_loop(MockSource::new().with_playlist("p1", 1, &["t1"]), &dir);

        sync_loop.run_once().await.unwrap().unwrap();
        sync_loop.reconciler().source().reset_counters();
        let report = sync_loop.run_once().await.unwrap().unwrap();

        assert!(report.is_noop());
        assert_eq!(sync_loop.reconciler().source().content_fetches(), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_does_not_save() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::new().with_playlist("p1", 1, &["t1"]);
        source.fail_listing(true);
        let sync_loop = sync_loop(source, &dir);

        let outcome = sync_loop.run_once().await.unwrap();

        assert!(matches!(outcome, Err(SyncError::Listing { .. })));
        assert!(sync_loop.storage().load_cache().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_after_passes() {
        let dir = tempfile::tempdir().unwrap();
        let sync_loop = sync_loop(MockSource::new().with_playlist("p1", 1, &["t1"]), &dir);

        sync_loop
            .run(Duration::from_millis(5), Some(3))
            .await
            .unwrap();

        // Only the first pass had anything to fetch.
        assert_eq!(sync_loop.reconciler().source().content_fetches(), 1);
    }
}
