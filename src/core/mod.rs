pub mod filter;
pub mod location;
pub mod markers;
pub mod viewport_sync;

pub use crate::domain::model::{Category, Organization, UserLocation, ViewportBounds};
pub use crate::domain::ports::{Notifier, OrganizationStore, RenderLayer};
pub use crate::utils::error::Result;
