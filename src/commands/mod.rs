//! Command dispatch and handlers.

pub mod check;
pub mod list;
pub mod play;

use std::path::Path;

use crate::cassette::{Cassette, FixtureLocator};
use crate::cli::{Cli, Command};
use crate::config::DeckConfig;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if configuration loading or the selected command fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => DeckConfig::load(path),
        None => DeckConfig::discover(),
    }
    .map_err(|e| e.to_string())?;

    match &cli.command {
        Command::Check { cassette } => check::run(&config, cassette),
        Command::List { cassette } => list::run(&config, cassette),
        Command::Play(args) => play::run(&config, args),
    }
}

/// Load a cassette from a file path, or by fixture name from the configured directory.
pub(crate) fn open_cassette(config: &DeckConfig, cassette: &str) -> Result<Cassette, String> {
    let path = Path::new(cassette);
    let result = if path.is_file() || path.extension().is_some_and(|ext| ext == "json") {
        Cassette::from_path(path)
    } else {
        config.locator().load(cassette)
    };
    result.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_cassette_by_fixture_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("named.json"), "[]").unwrap();
        let config = DeckConfig {
            fixtures: dir.path().to_path_buf(),
            ..DeckConfig::default()
        };

        assert!(open_cassette(&config, "named").unwrap().is_empty());
        let err = open_cassette(&config, "other").unwrap_err();
        assert!(err.contains("other.json"));
    }

    #[test]
    fn open_cassette_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("direct.json");
        std::fs::write(&path, "[]").unwrap();

        let cassette = open_cassette(&DeckConfig::default(), path.to_str().unwrap()).unwrap();
        assert!(cassette.is_empty());
    }
}
