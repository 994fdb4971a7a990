//! Run a query against PuppetDB.

use std::process::ExitCode;

use puppetdb_cli::cli;
use puppetdb_cli::cli::options::QueryOptions;

fn main() -> ExitCode {
    cli::puppet_query(QueryOptions::from_args())
}
