//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::matcher::MatchField;

/// Top-level CLI parser for `tapedeck`.
#[derive(Debug, Parser)]
#[command(name = "tapedeck", version, about = "Inspect and replay HTTP cassettes")]
pub struct Cli {
    /// Configuration file. Defaults to `TAPEDECK_CONFIG` or `./tapedeck.yaml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a cassette and report how many interactions it holds.
    Check {
        /// Cassette file path or fixture name.
        cassette: String,
    },
    /// Print one line per recorded interaction.
    List {
        /// Cassette file path or fixture name.
        cassette: String,
    },
    /// Replay a request against a cassette.
    Play(PlayArgs),
}

/// Arguments for `tapedeck play`.
#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Cassette file path or fixture name.
    pub cassette: String,

    /// Request URL.
    #[arg(long)]
    pub url: String,

    /// Request method.
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Request header as `Name:Value`. Repeatable.
    #[arg(long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Request body.
    #[arg(long)]
    pub body: Option<String>,

    /// Match on these fields instead of playing in recorded order. Repeatable.
    #[arg(long = "match", value_enum, value_name = "FIELD")]
    pub matchers: Vec<MatchField>,

    /// Keep interactions available after they are played.
    #[arg(long = "loop")]
    pub looping: bool,

    /// Send the request this many times.
    #[arg(long, default_value_t = 1)]
    pub repeat: usize,
}
