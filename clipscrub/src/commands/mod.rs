// clipscrub/src/commands/mod.rs
//! Command implementations for the `clipscrub` CLI.
//!
//! Command results go to stdout; status and warnings go to stderr so that
//! `clipscrub redact` can sit in a pipe.

pub mod check;
pub mod init;
pub mod redact;
pub mod rules;
pub mod sites;

use clipscrub_core::MutationOutcome;

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>) {
    eprintln!("{}", msg.as_ref());
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>) {
    eprintln!("Warning: {}", msg.as_ref());
}

/// Prints `applied` on success, or why the store left the rules unchanged.
pub fn report_mutation(outcome: &MutationOutcome, applied: impl AsRef<str>) {
    match outcome {
        MutationOutcome::Applied => println!("{}", applied.as_ref()),
        MutationOutcome::Rejected(reason) => info_msg(format!("No change: {}", reason)),
    }
}
