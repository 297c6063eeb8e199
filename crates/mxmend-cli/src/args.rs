//! Command-line argument definitions for the mxmend CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Each subcommand maps to one stage of the pipeline; the
//! configuration file and logging verbosity apply to all of them.

use clap::{Parser, Subcommand};

/// Command-line arguments for the mxmend diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate diagram markup and report its diagnostics
    Validate {
        /// Path to the input markup
        input: String,

        /// Print the diagnostics as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate and calibrate diagram markup, printing the report as JSON
    Calibrate {
        /// Path to the input markup
        input: String,

        /// Path to the calibrated output
        #[arg(short, long, default_value = "out.drawio")]
        output: String,
    },

    /// Parse a JSON payload, repairing its syntax when needed
    RepairJson {
        /// Path to the JSON payload
        input: String,
    },

    /// Apply a saved model repair response and validate the result
    ApplyRepair {
        /// Path to the raw model response
        #[arg(long)]
        response: String,

        /// Path to the last valid markup, required by `edit` responses
        #[arg(long)]
        base: Option<String>,

        /// Path to the repaired output
        #[arg(short, long, default_value = "out.drawio")]
        output: String,
    },
}
