//! The command line options of `puppet-db` and `puppet-query`.

use std::path::PathBuf;

use log::{debug, info};

use crate::api::{ApiClient, Error};
use crate::config::{Config, ConfigFlags};
use crate::constants::{
    DEFAULT_ANONYMIZATION_PROFILE, DEFAULT_LOG_LEVEL, PDB_ENV_CACERT,
    PDB_ENV_CERT, PDB_ENV_CONFIG, PDB_ENV_KEY, PDB_ENV_LOG_LEVEL,
    PDB_ENV_TOKEN, PDB_ENV_URLS, PUPPET_DB_APP, PUPPET_QUERY_APP,
};
use crate::fs::Filesystem;
use crate::pdb::PuppetDb;
use crate::token::TokenSource;
use super::report::Report;


//------------ GeneralOptions ------------------------------------------------

/// The options common between both command line tools.
#[derive(clap::Args, Clone, Debug)]
pub struct GeneralOptions {
    /// The URLs of the PuppetDB servers, separated by commas.
    #[arg(short, long, env = PDB_ENV_URLS, value_name = "URLS")]
    pub urls: Option<String>,

    /// Path to the CA certificate used to verify the servers.
    #[arg(long, env = PDB_ENV_CACERT, value_name = "PATH")]
    pub cacert: Option<String>,

    /// Path to the client certificate.
    #[arg(long, env = PDB_ENV_CERT, value_name = "PATH")]
    pub cert: Option<String>,

    /// Path to the private key of the client certificate.
    #[arg(long, env = PDB_ENV_KEY, value_name = "PATH")]
    pub key: Option<String>,

    /// Path to the RBAC token file.
    #[arg(long, env = PDB_ENV_TOKEN, value_name = "PATH")]
    pub token: Option<String>,

    /// Path to the user config file.
    #[arg(short, long, env = PDB_ENV_CONFIG, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level: none, trace, debug, info, warn or error.
    #[arg(
        short, long,
        env = PDB_ENV_LOG_LEVEL,
        default_value = DEFAULT_LOG_LEVEL,
        value_name = "LEVEL",
    )]
    pub log_level: String,
}

impl GeneralOptions {
    pub fn config_flags(&self, anon: &str) -> ConfigFlags {
        ConfigFlags {
            urls: self.urls.clone(),
            cacert: self.cacert.clone(),
            cert: self.cert.clone(),
            key: self.key.clone(),
            token: self.token.clone(),
            log_level: self.log_level.clone(),
            anon: anon.to_string(),
        }
    }
}


//------------ DbOptions -----------------------------------------------------

/// The command line options for `puppet-db`.
#[derive(clap::Parser, Debug)]
#[command(
    name = PUPPET_DB_APP,
    version,
    about = "Administer PuppetDB: check status, export and import data.",
)]
pub struct DbOptions {
    #[command(flatten)]
    pub general: GeneralOptions,

    /// Anonymization profile used by export.
    #[arg(long, default_value = DEFAULT_ANONYMIZATION_PROFILE, value_name = "PROFILE")]
    pub anon: String,

    #[command(subcommand)]
    pub command: Command,
}

impl DbOptions {
    /// Creates the options from the process arguments.
    ///
    /// If the arguments won't result in usable options, exits the process.
    pub fn from_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    pub fn config_flags(&self) -> ConfigFlags {
        self.general.config_flags(&self.anon)
    }
}


//------------ QueryOptions --------------------------------------------------

/// The command line options for `puppet-query`.
#[derive(clap::Parser, Debug)]
#[command(
    name = PUPPET_QUERY_APP,
    version,
    about = "Query PuppetDB using PQL or the AST query language.",
)]
pub struct QueryOptions {
    #[command(flatten)]
    pub general: GeneralOptions,

    /// The query to run.
    pub query: String,
}

impl QueryOptions {
    /// Creates the options from the process arguments.
    ///
    /// If the arguments won't result in usable options, exits the process.
    pub fn from_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    pub fn config_flags(&self) -> ConfigFlags {
        self.general.config_flags(DEFAULT_ANONYMIZATION_PROFILE)
    }

    pub fn run<C: ApiClient, F: Filesystem, T: TokenSource>(
        &self, pdb: &PuppetDb<C, F, T>, config: &Config,
    ) -> Report {
        match pdb.query(config.primary_url(), &self.query) {
            Ok(payload) => Report::Json(payload),
            Err(Error::Remote(e)) => {
                debug!("{}", e);
                Report::Failed(e.detailed())
            }
            Err(e) => Report::failed(e),
        }
    }
}


//------------ Command -------------------------------------------------------

#[derive(clap::Subcommand, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Show the status of every configured PuppetDB server.
    Status(Status),

    /// Export all PuppetDB data into an archive.
    Export(Export),

    /// Import an archive into PuppetDB.
    Import(Import),
}

impl Command {
    pub fn run<C: ApiClient, F: Filesystem, T: TokenSource>(
        &self, pdb: &PuppetDb<C, F, T>, config: &Config,
    ) -> Report {
        match self {
            Self::Status(cmd) => cmd.run(pdb, config),
            Self::Export(cmd) => cmd.run(pdb, config),
            Self::Import(cmd) => cmd.run(pdb, config),
        }
    }
}


//------------ Status --------------------------------------------------------

#[derive(clap::Parser, Clone, Debug, Eq, PartialEq)]
pub struct Status;

impl Status {
    pub fn run<C: ApiClient, F: Filesystem, T: TokenSource>(
        &self, pdb: &PuppetDb<C, F, T>, config: &Config,
    ) -> Report {
        match pdb.status_all(&config.server_urls) {
            Ok(report) => Report::Json(report.into_json()),
            Err(e) => Report::failed(e),
        }
    }
}


//------------ Export --------------------------------------------------------

#[derive(clap::Parser, Clone, Debug, Eq, PartialEq)]
pub struct Export {
    /// The file to write the archive to.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

impl Export {
    pub fn run<C: ApiClient, F: Filesystem, T: TokenSource>(
        &self, pdb: &PuppetDb<C, F, T>, config: &Config,
    ) -> Report {
        let url = config.primary_url();
        match pdb.export(url, &self.path, &config.anonymization_profile) {
            Ok(()) => Report::Line(
                format!("Wrote archive to \"{}\"", self.path.display())
            ),
            Err(e) if e.is_argument_error() || e.is_filesystem_error() => {
                Report::failed(e)
            }
            Err(e) => Report::Failed(
                format!("Failed to export puppetdb data: {}", e)
            ),
        }
    }
}


//------------ Import --------------------------------------------------------

#[derive(clap::Parser, Clone, Debug, Eq, PartialEq)]
pub struct Import {
    /// The archive to import.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

impl Import {
    pub fn run<C: ApiClient, F: Filesystem, T: TokenSource>(
        &self, pdb: &PuppetDb<C, F, T>, config: &Config,
    ) -> Report {
        let url = config.primary_url();
        match pdb.import(url, &self.path) {
            Ok(_) => {
                info!("Successfully imported \"{}\"", self.path.display());
                Report::Empty
            }
            Err(e) if e.is_argument_error() || e.is_filesystem_error() => {
                Report::failed(e)
            }
            Err(e) => Report::Failed(
                format!("Failed to import puppetdb data: {}", e)
            ),
        }
    }
}


//------------ Tests ---------------------------------------------------------
