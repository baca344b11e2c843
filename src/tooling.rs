//! Tooling & Integration Layer
//!
//! Command-line front end over a locally bound document tree.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
