//! Time synchronization between continuous playback and the discrete
//! per-frame annotation index.

pub mod asset;
pub mod batch;
pub mod clock;
pub mod config;
pub mod metadata;
pub mod scrub;
pub mod session;
pub mod time_sync;

pub use asset::{AssetError, AssetResult, DynVideoAsset, StaticAsset, VideoAsset};
pub use batch::{AnalyzedItem, BatchEntry, BatchHandle, ItemId, ItemReport, ReviewItem};
pub use clock::mock::{MockClock, ObserverEvent};
pub use clock::{ClockTick, DynPlaybackClock, PlaybackClock, SubscriptionId, TransportStatus};
pub use config::{Configuration, ConfigurationError};
pub use metadata::{MetadataRequest, MetadataResolution, resolve_metadata};
pub use scrub::{
    ScrubTarget, Scrubber, Timeline, TimelineMarker, index_for_x, marker_indices,
    ratio_for_index, timeline_markers, x_for_index,
};
pub use session::{ReviewSession, ReviewSnapshot, SessionId};
pub use time_sync::{SyncState, TimeSync, frame_index_for_time, sample_interval, sample_rate_hz};
