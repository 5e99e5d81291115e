//! Cassette format and fixture loading.

pub mod format;
pub mod loader;

pub use format::{Cassette, Interaction, RequestRecord, ResponseRecord};
pub use loader::{DirectoryLocator, FixtureLocator};
