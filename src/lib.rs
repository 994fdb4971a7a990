//! The _puppetdb-cli_ library crate.
//!
//! Provides the pieces behind the `puppet-db` and `puppet-query` command
//! line tools: configuration resolution, token handling, the PuppetDB API
//! client and the operations built on top of it.

pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod fs;
pub mod pdb;
pub mod token;
