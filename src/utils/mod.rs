//! Utility functions and the command line entrypoint.
pub mod cli;
pub mod paths;
