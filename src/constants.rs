//! Various crate-wide constants.


//------------ Binary Names -------------------------------------------------

/// The friendly name of the `puppet-db` binary.
pub const PUPPET_DB_APP: &str = "puppet-db";

/// The friendly name of the `puppet-query` binary.
pub const PUPPET_QUERY_APP: &str = "puppet-query";


//------------ Config Files Paths -------------------------------------------

/// The directory below the Puppet Labs directories holding the CLI config.
pub const CLIENT_TOOLS_DIR: &str = "client-tools";

/// The file name of the PuppetDB CLI config file.
pub const CONFIG_FILE_NAME: &str = "puppetdb.conf";

/// The per-user Puppet Labs directory, relative to the home directory.
pub const USER_PUPPETLABS_DIR: &str = ".puppetlabs";

/// The file name of the RBAC token inside the per-user directory.
pub const TOKEN_FILE_NAME: &str = "token";

/// The system wide Puppet Labs directory on unix systems.
#[cfg(not(windows))]
pub const SYSTEM_PUPPETLABS_DIR: &str = "/etc/puppetlabs";

/// The environment variable pointing to the program data directory.
///
/// On Windows the system wide Puppet Labs directory lives below it as
/// `PuppetLabs`.
#[cfg(windows)]
pub const PROGRAM_DATA_ENV: &str = "ProgramData";


//------------ Defaults -----------------------------------------------------

/// The server URL used when nothing else has been configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// The default anonymization profile for exports.
pub const DEFAULT_ANONYMIZATION_PROFILE: &str = "none";

/// The default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";


//------------ Environment Variables ----------------------------------------

/// The environment variable with the PuppetDB server URLs.
pub const PDB_ENV_URLS: &str = "PUPPETDB_CLI_URLS";

/// The environment variable with the path to the CA certificate.
pub const PDB_ENV_CACERT: &str = "PUPPETDB_CLI_CACERT";

/// The environment variable with the path to the client certificate.
pub const PDB_ENV_CERT: &str = "PUPPETDB_CLI_CERT";

/// The environment variable with the path to the client private key.
pub const PDB_ENV_KEY: &str = "PUPPETDB_CLI_KEY";

/// The environment variable with the path to the RBAC token file.
pub const PDB_ENV_TOKEN: &str = "PUPPETDB_CLI_TOKEN";

/// The environment variable with the path to the user config file.
pub const PDB_ENV_CONFIG: &str = "PUPPETDB_CLI_CONFIG";

/// The environment variable with the log level.
pub const PDB_ENV_LOG_LEVEL: &str = "PUPPETDB_CLI_LOG_LEVEL";


//------------ HTTP ---------------------------------------------------------

/// The header carrying the RBAC token.
pub const HEADER_X_AUTHENTICATION: &str = "X-Authentication";

/// The user agent announced to the server.
pub const USER_AGENT_VALUE: &str =
    concat!("puppetdb-cli/", env!("CARGO_PKG_VERSION"));

/// The multipart field name used to upload an archive.
pub const ARCHIVE_FIELD: &str = "archive";
