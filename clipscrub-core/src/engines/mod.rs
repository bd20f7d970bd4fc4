// clipscrub-core/src/engines/mod.rs
//! Concrete `SanitizationEngine` implementations.
//!
//! Each engine is a separate file within this directory and implements the
//! `SanitizationEngine` trait.

pub mod regex_engine;
