//! The command line tools.

pub mod options;
pub mod report;

use std::process::ExitCode;
use std::str::FromStr;

use crate::config::{self, Config, ConfigFlags, LogLevel};
use crate::pdb::PuppetDb;
use self::options::{DbOptions, GeneralOptions, QueryOptions};
use self::report::Report;


/// Runs `puppet-db` and returns the exit code for the process.
pub fn puppet_db(options: DbOptions) -> ExitCode {
    let config = match setup(&options.general, &options.config_flags()) {
        Ok(config) => config,
        Err(report) => return report.finish(),
    };
    let pdb = PuppetDb::from_config(&config);
    options.command.run(&pdb, &config).finish()
}

/// Runs `puppet-query` and returns the exit code for the process.
pub fn puppet_query(options: QueryOptions) -> ExitCode {
    let config = match setup(&options.general, &options.config_flags()) {
        Ok(config) => config,
        Err(report) => return report.finish(),
    };
    let pdb = PuppetDb::from_config(&config);
    options.run(&pdb, &config).finish()
}

/// Sets up logging and resolves the configuration.
///
/// The log level is checked first so that nothing goes over the network
/// with an invalid one.
fn setup(general: &GeneralOptions, flags: &ConfigFlags) -> Result<Config, Report> {
    let level = LogLevel::from_str(&general.log_level)
        .map_err(|e| Report::Fatal(e.to_string()))?;
    config::init_logging(level).map_err(|e| Report::Fatal(e.to_string()))?;
    Config::resolve(flags, general.config.as_deref()).map_err(Report::failed)
}
