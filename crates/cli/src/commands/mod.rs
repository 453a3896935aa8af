//! CLI subcommands

pub mod predict;
pub mod status;
