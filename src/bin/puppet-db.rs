//! Check the status of PuppetDB servers and export or import their data.

use std::process::ExitCode;

use puppetdb_cli::cli;
use puppetdb_cli::cli::options::DbOptions;

fn main() -> ExitCode {
    cli::puppet_db(DbOptions::from_args())
}
