//! Local splaylist cache kept in sync with a remote playlist service.
//!
//! The [`reconciler`] mirrors the remote listing into a caller-owned
//! [`cache::PlaylistCache`], refetching playlist contents only when a playlist
//! is new or its `last_modified` moved forward.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod reconciler;
pub mod reporting;
pub mod service;
pub mod storage;
pub mod watch;

pub use cache::{open, CachedPlaylist, PlaylistCache};
pub use error::SyncError;
pub use reconciler::{Reconciler, SyncReport};
