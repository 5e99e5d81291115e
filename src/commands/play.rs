//! `tapedeck play` command.

use std::sync::{Arc, Mutex, PoisonError};

use crate::cli::PlayArgs;
use crate::config::DeckConfig;
use crate::error::DeckError;
use crate::matcher::MatcherSpec;
use crate::queue::ManualQueue;
use crate::request::{Request, ResponseMeta};
use crate::sequencer::{Consumption, Playback};
use crate::session::{NoMatchMode, Session};

type Outcome = (Option<Vec<u8>>, Option<ResponseMeta>, Option<DeckError>);

/// Execute the `play` command.
///
/// Each repetition runs one task to completion before the next is created, so
/// output order matches request order.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded or a header is malformed.
pub fn run(config: &DeckConfig, args: &PlayArgs) -> Result<(), String> {
    let cassette = super::open_cassette(config, &args.cassette)?;
    let request = build_request(args)?;
    let queue = Arc::new(ManualQueue::new());
    let session = Session::builder(cassette)
        .playback(playback(config, args))
        .queue(queue.clone())
        .no_match(NoMatchMode::Deliver)
        .build();

    for _ in 0..args.repeat {
        let outcome = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&outcome);
        let mut task = session.data_task_with(request.clone(), move |body, response, error| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some((body, response, error));
        });
        task.resume();
        queue.drain();

        let result = outcome.lock().unwrap_or_else(PoisonError::into_inner).take();
        println!("{}", describe(result));
    }
    Ok(())
}

fn playback(config: &DeckConfig, args: &PlayArgs) -> Playback {
    let consumption =
        if args.looping { Consumption::Looping } else { config.consumption.into() };
    if args.matchers.is_empty() {
        Playback { consumption, ..config.playback() }
    } else {
        Playback::matching(args.matchers.iter().copied().collect::<MatcherSpec>(), consumption)
    }
}

fn build_request(args: &PlayArgs) -> Result<Request, String> {
    let mut request = Request::new(args.method.to_uppercase(), args.url.clone());
    for raw in &args.headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("Invalid header '{raw}': expected NAME:VALUE"))?;
        request = request.header(name.trim(), value.trim());
    }
    if let Some(body) = &args.body {
        request = request.body(body.as_bytes());
    }
    Ok(request)
}

fn describe(outcome: Option<Outcome>) -> String {
    match outcome {
        None | Some((_, _, Some(DeckError::NoMatchFound(_)))) => "no match".to_string(),
        Some((_, response, Some(error))) => match response {
            Some(meta) => format!("{} error: {error}", meta.status),
            None => format!("error: {error}"),
        },
        Some((body, Some(meta), None)) => match body {
            Some(bytes) => format!("{}\n{}", meta.status, String::from_utf8_lossy(&bytes)),
            None => meta.status.to_string(),
        },
        Some((_, None, None)) => "no response".to_string(),
    }
}
