//! Local storage backend backed by redb.
//!
//! Two tables:
//!   splaylists: playlist_id → JSON `CachedPlaylist`
//!   meta:       "state"     → JSON `StoreMeta`
//!
//! A store with no `state` row has never been saved and loads as `None`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::CacheStorage;
use crate::cache::{CachedPlaylist, PlaylistCache};

const SPLAYLISTS: TableDefinition<&str, &[u8]> = TableDefinition::new("splaylists");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const STATE_KEY: &str = "state";
const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreMeta {
    version: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    saved_at: DateTime<Utc>,
    playlists: usize,
}

pub struct LocalStorage {
    db: Database,
    path: PathBuf,
}

impl LocalStorage {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let db = Database::create(path)
            .with_context(|| format!("failed to open cache store at {}", path.display()))?;
        // Ensure tables exist
        {
            let txn = db.begin_write()?;
            txn.open_table(SPLAYLISTS)?;
            txn.open_table(META)?;
            txn.commit()?;
        }
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Default location: <data_dir>/splaylist-cache/cache.redb
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .context("Failed to get data directory")?
            .join("splaylist-cache");
        Ok(data_dir.join("cache.redb"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the cache was last saved, if ever.
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_meta()?.map(|m| m.saved_at))
    }

    fn read_meta(&self) -> Result<Option<StoreMeta>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(META)?;
        match table.get(STATE_KEY)? {
            Some(data) => {
                let meta: StoreMeta = serde_json::from_slice(data.value())
                    .context("corrupt cache metadata in redb")?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    fn load(&self) -> Result<Option<PlaylistCache>> {
        let Some(meta) = self.read_meta()? else {
            return Ok(None);
        };
        if meta.version > CURRENT_VERSION {
            anyhow::bail!(
                "cache store {} has version {}, newer than supported {}",
                self.path.display(),
                meta.version,
                CURRENT_VERSION
            );
        }

        let txn = self.db.begin_read()?;
        let table = txn.open_table(SPLAYLISTS)?;
        let mut splaylists = HashMap::new();
        for item in table.iter()? {
            let (key, val) = item?;
            match serde_json::from_slice::<CachedPlaylist>(val.value()) {
                Ok(playlist) => {
                    splaylists.insert(key.value().to_string(), playlist);
                }
                // A bad row only costs a refetch on the next sync.
                Err(e) => tracing::warn!("Skipping corrupt cached splaylist {}: {}", key.value(), e),
            }
        }
        Ok(Some(PlaylistCache { splaylists }))
    }

    fn save(&self, cache: &PlaylistCache) -> Result<()> {
        let meta = StoreMeta {
            version: CURRENT_VERSION,
            saved_at: Utc::now(),
            playlists: cache.len(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SPLAYLISTS)?;
            let removed: Vec<String> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value().to_string()))
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|id| !cache.splaylists.contains_key(id))
                .collect();
            for id in removed {
                table.remove(id.as_str())?;
            }
            for (id, playlist) in &cache.splaylists {
                let json = serde_json::to_vec(playlist)?;
                table.insert(id.as_str(), json.as_slice())?;
            }

            let mut meta_table = txn.open_table(META)?;
            let json = serde_json::to_vec(&meta)?;
            meta_table.insert(STATE_KEY, json.as_slice())?;
        }
        txn.commit().context("Failed to commit cache store")?;
        tracing::debug!("saved {} splaylists to {}", meta.playlists, self.path.display());
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for LocalStorage {
    fn backend_name(&self) -> &str {
        "local"
    }

    async fn load_cache(&self) -> Result<Option<PlaylistCache>> {
        self.load()
    }

    async fn save_cache(&self, cache: &PlaylistCache) -> Result<()> {
        self.save(cache)
    }
}
