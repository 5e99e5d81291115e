//! Handling of requests that find no recorded interaction.

use crate::request::Request;

/// Called synchronously when a task cannot be served and the session is in
/// [`NoMatchMode::Handler`](crate::session::NoMatchMode::Handler).
pub trait ErrorHandler: Send + Sync {
    /// No interaction matched `request`. `unique` is true when interactions are single-use.
    fn on_not_found(&self, request: &Request, unique: bool);

    /// The lookup failed for a reason other than a missing match.
    fn on_unknown_error(&self);
}

/// Aborts the test run with a descriptive panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FatalErrorHandler;

impl ErrorHandler for FatalErrorHandler {
    fn on_not_found(&self, request: &Request, unique: bool) {
        let hint = if unique {
            " Interactions are single-use; check whether it was already played."
        } else {
            ""
        };
        tracing::error!(method = %request.method, url = %request.url, unique, "no recorded match");
        panic!(
            "No recorded interaction for {} {} (headers: {:?}).{hint}",
            request.method, request.url, request.headers
        );
    }

    fn on_unknown_error(&self) {
        tracing::error!("playback failed with an unexpected error");
        panic!("Playback failed with an unexpected error");
    }
}
