//! Pattern compilation for rule and site matchers.
//!
//! `compiler` owns the translation from user-facing strings (rule patterns,
//! site globs, literal context values) into compiled regular expressions.

pub mod compiler;
