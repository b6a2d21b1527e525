//! Offline content availability: the downloaded-chapter store and the
//! per-content status aggregation shown by the UI.

pub mod content;
pub mod status;

pub use content::{
    is_available_offline, ChapterPayload, ContentIdError, ContentRef, ContentStore,
    FileContentStore, MemoryContentStore,
};
pub use status::{resolve_status, ConnectivityState, OfflineStatus, OfflineStatusAggregator};
