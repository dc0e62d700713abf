use thiserror::Error;

/// Failures the reconciler distinguishes.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote playlist listing could not be fetched. The sync was
    /// abandoned before touching the cache.
    #[error("failed to fetch playlist listing: {error:#}")]
    Listing { error: anyhow::Error },

    /// One playlist's contents could not be fetched. The rest of the batch
    /// carries on.
    #[error("failed to fetch contents of playlist {playlist_id}: {error:#}")]
    Content {
        playlist_id: String,
        error: anyhow::Error,
    },
}

impl SyncError {
    pub fn playlist_id(&self) -> Option<&str> {
        match self {
            SyncError::Listing { .. } => None,
            SyncError::Content { playlist_id, .. } => Some(playlist_id),
        }
    }

    pub fn is_listing(&self) -> bool {
        matches!(self, SyncError::Listing { .. })
    }
}
