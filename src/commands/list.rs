//! `tapedeck list` command.

use crate::cassette::Cassette;
use crate::config::DeckConfig;

/// Execute the `list` command.
///
/// Prints `index method url -> status` for every interaction.
///
/// # Errors
///
/// Returns an error string if the cassette is missing or malformed.
pub fn run(config: &DeckConfig, cassette: &str) -> Result<(), String> {
    let loaded = super::open_cassette(config, cassette)?;
    if loaded.is_empty() {
        println!("No interactions recorded.");
        return Ok(());
    }
    for line in lines(&loaded) {
        println!("{line}");
    }
    Ok(())
}

fn lines(cassette: &Cassette) -> Vec<String> {
    let width = cassette.len().to_string().len();
    cassette
        .interactions
        .iter()
        .enumerate()
        .map(|(index, interaction)| {
            let request = &interaction.request;
            let response = &interaction.response;
            let line = format!(
                "{index:>width$} {} {} -> {}",
                request.method, request.url, response.status
            );
            match &response.error {
                Some(error) => format!("{line} (error: {error})"),
                None => line,
            }
        })
        .collect()
}
