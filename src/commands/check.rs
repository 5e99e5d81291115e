//! `tapedeck check` command.

use crate::config::DeckConfig;

/// Execute the `check` command.
///
/// # Errors
///
/// Returns an error string if the cassette is missing or malformed.
pub fn run(config: &DeckConfig, cassette: &str) -> Result<(), String> {
    let loaded = super::open_cassette(config, cassette)?;
    let noun = if loaded.len() == 1 { "interaction" } else { "interactions" };
    println!("{cassette}: {} {noun}", loaded.len());
    Ok(())
}
