pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{
    http_store::HttpOrganizationStore, memory_store::InMemoryStore, notifier::ToastBoard,
};
pub use core::{
    filter::{apply_category_filter, CategorySelection},
    location::{LocationDetector, LocationProvider},
    markers::{MarkerDiff, MarkerSet},
    viewport_sync::{MapEvent, SyncSettings, SyncState, ViewportSync},
};
pub use utils::error::{MapError, Result};
