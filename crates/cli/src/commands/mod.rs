//! CLI subcommands.

pub mod check_api;
pub mod invoice;
pub mod migrate;
