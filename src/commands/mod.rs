//! Command line subcommands

pub mod init;
pub mod list;
pub mod new;
