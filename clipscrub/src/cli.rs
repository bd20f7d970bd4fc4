// clipscrub/src/cli.rs
//! This file defines the command-line interface (CLI) for the clipscrub application,
//! including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use clipscrub_core::SiteMatchMode;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "clipscrub",
    version = env!("CARGO_PKG_VERSION"),
    about = "Redact usernames, hostnames and secrets from pasted text",
    long_about = "clipscrub applies an ordered list of pattern -> replacement rules to text on its way from the clipboard into an application. Rules and the list of sites where redaction runs are stored in a local state directory and can be edited with the `rules` and `sites` commands.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all log output.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Directory holding the persisted rule document.
    #[arg(
        long = "state-dir",
        value_name = "DIR",
        env = "CLIPSCRUB_STATE_DIR",
        global = true,
        help = "Directory holding the persisted rules (defaults to <data dir>/clipscrub)."
    )]
    pub state_dir: Option<PathBuf>,

    /// Default rule document used to seed an empty state directory.
    #[arg(
        long = "defaults",
        value_name = "FILE",
        global = true,
        help = "JSON or YAML document used instead of the bundled defaults when seeding."
    )]
    pub defaults: Option<PathBuf>,

    /// How site allowlist entries are interpreted.
    #[arg(
        long = "site-mode",
        value_name = "MODE",
        value_enum,
        default_value = "glob",
        global = true,
        help = "Interpret site entries as anchored globs or as legacy unanchored regexes."
    )]
    pub site_mode: SiteModeArg,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `clipscrub` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seeds the state directory from the defaults if it is empty.
    #[command(about = "Seed the rule store from the defaults (no-op if already seeded).")]
    Init,

    /// Redacts text as a paste on `--url` would be redacted.
    #[command(about = "Redact stdin, a file or the clipboard and print the result.")]
    Redact(RedactCommand),

    /// Manages the ordered redaction rules.
    #[command(subcommand, about = "List, add, delete or reset redaction rules.")]
    Rules(RulesCommand),

    /// Manages the site allowlist.
    #[command(subcommand, about = "List, add or delete allowed sites.")]
    Sites(SitesCommand),

    /// Reports whether a URL is on the allowlist.
    #[command(about = "Check whether redaction runs on a URL.")]
    Check {
        #[arg(value_name = "URL")]
        url: String,

        /// Print the result as JSON.
        #[arg(long, help = "Print the result as JSON.")]
        json: bool,
    },
}

/// Arguments for the `redact` command.
#[derive(Parser, Debug)]
pub struct RedactCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", conflicts_with = "clipboard", help = "Read input from a specified file instead of stdin.")]
    pub input: Option<PathBuf>,

    /// Page URL the paste is targeting.
    #[arg(long, short = 'u', value_name = "URL", default_value = "", help = "URL of the page receiving the paste; checked against the allowlist.")]
    pub url: String,

    /// Username to redact (defaults to the current user).
    #[arg(long, value_name = "NAME", help = "Username to replace with `username` (defaults to $USER).")]
    pub username: Option<String>,

    /// Hostname to redact (defaults to the host of `--url`).
    #[arg(long, value_name = "HOST", help = "Hostname to replace with `hostname` (defaults to the host of --url).")]
    pub hostname: Option<String>,

    /// Do not derive context rules from the process environment.
    #[arg(long = "no-env-context", help = "Do not read the username or user domain from the environment.")]
    pub no_env_context: bool,

    /// Read from and write back to the system clipboard.
    #[arg(long, short = 'c', help = "Read the system clipboard and write the redacted text back.")]
    pub clipboard: bool,

    /// Redact regardless of the allowlist.
    #[arg(long = "ignore-sites", help = "Redact even if the URL is not on the allowlist.")]
    pub ignore_sites: bool,

    /// Print a per-rule summary to stderr.
    #[arg(long, short = 's', help = "Print a per-rule redaction summary to stderr.")]
    pub summary: bool,
}

/// Subcommands for the `rules` command.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    #[command(about = "List stored rules in application order.")]
    List {
        #[arg(long, help = "Print the rule document as JSON.")]
        json: bool,
    },
    #[command(about = "Append a rule to the end of the list.")]
    Add {
        #[arg(value_name = "PATTERN")]
        pattern: String,
        #[arg(value_name = "REPLACEMENT")]
        replacement: String,
    },
    #[command(about = "Replace the rule at INDEX.")]
    Update {
        #[arg(value_name = "INDEX", allow_negative_numbers = true)]
        index: i64,
        #[arg(value_name = "PATTERN")]
        pattern: String,
        #[arg(value_name = "REPLACEMENT")]
        replacement: String,
    },
    #[command(about = "Delete the rule at INDEX.")]
    Delete {
        #[arg(value_name = "INDEX", allow_negative_numbers = true)]
        index: i64,
    },
    #[command(about = "Replace stored rules and sites with the defaults.")]
    Reset,
}

/// Subcommands for the `sites` command.
#[derive(Subcommand, Debug)]
pub enum SitesCommand {
    #[command(about = "List allowed site patterns.")]
    List,
    #[command(about = "Allow redaction on a site pattern.")]
    Add {
        #[arg(value_name = "SITE")]
        site: String,
    },
    #[command(about = "Remove a site pattern.")]
    Delete {
        #[arg(value_name = "SITE")]
        site: String,
    },
}

/// Command-line spelling of [`SiteMatchMode`].
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SiteModeArg {
    /// Escaped, anchored glob where `*` matches anything.
    Glob,
    /// Entry used as an unanchored regex with `*` widened to `.*`.
    LegacyRegex,
}

impl From<SiteModeArg> for SiteMatchMode {
    fn from(arg: SiteModeArg) -> Self {
        match arg {
            SiteModeArg::Glob => SiteMatchMode::Glob,
            SiteModeArg::LegacyRegex => SiteMatchMode::LegacyRegex,
        }
    }
}
