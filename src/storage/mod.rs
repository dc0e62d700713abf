//! Persistence for the splaylist cache.
//!
//! - [`LocalStorage`]: embedded redb file, one JSON value per playlist
//!
//! The reconciler never touches storage; the sync loop loads the cache before
//! a sync and saves it afterwards.

pub mod local;

use anyhow::Result;
use async_trait::async_trait;

use crate::cache::PlaylistCache;

pub use local::LocalStorage;

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Human-readable backend name (e.g., "local").
    fn backend_name(&self) -> &str;

    /// Load the saved cache. Returns None if nothing has been saved yet.
    async fn load_cache(&self) -> Result<Option<PlaylistCache>>;

    /// Replace the saved cache with `cache`.
    async fn save_cache(&self, cache: &PlaylistCache) -> Result<()>;
}
