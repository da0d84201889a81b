//! Shared helpers for the resplice command line tools

pub mod output;
