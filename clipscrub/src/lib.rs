// clipscrub/src/lib.rs
//! # clipscrub CLI Application
//!
//! This crate provides the command-line front end for `clipscrub-core`: rule
//! and allowlist management over a file-backed store, one-shot redaction of
//! stdin, files or the system clipboard, and logger setup.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod utils;
