// src/cli.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputMode;

/// Redemption-code claim form, run from the terminal.
///
/// `config.yaml` is optional. CLI flags override config values.
#[derive(Parser, Debug)]
#[command(name = "redeemform", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a form without submitting it.
    ///
    /// Exits non-zero if any field is invalid.
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        #[command(flatten)]
        input: FormArgs,

        /// Override output mode
        #[arg(long, value_enum)]
        output: Option<OutputMode>,
    },

    /// Validate a form and submit it to the simulated redemption service.
    ///
    /// Takes about two seconds. Exits non-zero unless a code is granted.
    Redeem {
        /// Path to config file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        #[command(flatten)]
        input: FormArgs,

        /// Seed the simulated service for a reproducible outcome
        ///
        /// Overrides config simulation.seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override output mode
        #[arg(long, value_enum)]
        output: Option<OutputMode>,
    },

    /// Initialise a project scaffold.
    ///
    /// Creates config.yaml and form.json. Existing files are left alone.
    Init,
}

/// Where form values come from. Flags override the fixture file.
#[derive(Args, Debug, Default, Clone)]
pub struct FormArgs {
    /// Form fixture (JSON object of field name to value)
    ///
    /// Overrides config form
    #[arg(long)]
    pub form: Option<PathBuf>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long = "redeem-code")]
    pub redeem_code: Option<String>,

    /// Accept the terms of service and privacy policy
    #[arg(long)]
    pub terms: bool,

    /// Any other field (can be passed multiple times)
    ///
    /// Example:
    /// --field referrer=newsletter
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}
