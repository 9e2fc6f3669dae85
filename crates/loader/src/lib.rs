//! Memload - Loader
//!
//! The batch driver behind the `memload` binary: discovers input files,
//! runs one file pipeline per file with bounded parallelism, and marks
//! each completed file by renaming it with a leading dot.
//!
//! The binary itself (`main.rs`) only parses flags, initializes logging
//! and dispatches here.

pub mod driver;
pub mod selftest;

pub use driver::{BatchSummary, run};
