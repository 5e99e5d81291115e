//! Replays recorded HTTP interactions in place of a network client.
//!
//! A [`Cassette`] of request/response pairs is loaded from JSON, wrapped in a
//! [`Session`], and served to [`PlaybackTask`]s whose results are delivered
//! asynchronously on a [`DeliveryQueue`].

pub mod body;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod observer;
pub mod player;
pub mod queue;
pub mod request;
pub mod sequencer;
pub mod session;
pub mod task;
pub mod transport;

pub use cassette::{Cassette, DirectoryLocator, FixtureLocator, Interaction};
pub use config::DeckConfig;
pub use error::{DeckError, Result};
pub use handler::{ErrorHandler, FatalErrorHandler};
pub use matcher::{MatchField, MatchKind, MatcherSpec};
pub use observer::{TaskInfo, TaskObserver};
pub use player::Player;
pub use queue::{DeliveryQueue, ManualQueue, RuntimeQueue, WorkerQueue};
pub use request::{Request, ResponseMeta};
pub use sequencer::{Consumption, Order, Playback, Sequencer};
pub use session::{NoMatchMode, Reply, Session, SessionBuilder};
pub use task::{PlaybackTask, TaskState};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
