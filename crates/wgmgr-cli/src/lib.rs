//! # wgmgr-cli
//!
//! Command-line front end for `wgmgr-core`.
//!
//! Each subcommand maps onto one key, interface or peer operation. Results go
//! to stdout, logs go to stderr, and Ctrl-C cancels the external tool that is
//! currently running.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, ConfArgs, PeerCommands};
pub use commands::{execute, load_settings};
