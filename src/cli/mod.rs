//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

pub mod output;
pub mod service;
