//! Line-oriented front end for the mirror pairing session.
//!
//! A thin shell over [`mirrorlink_client::SessionHandle`]: parses `/commands`
//! from any buffered reader and writes session signals to any writer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod commands;
pub mod error;
pub mod shell;

pub use args::Args;
pub use commands::{ShellCommand, parse};
pub use error::{CliError, Result};
pub use shell::run;
