//! Resolving the effective configuration for one invocation.
//!
//! Settings come from four sources. From lowest to highest precedence these
//! are the built-in defaults, the global config file, the user's config file
//! and the command line flags. Each source is turned into a [`ConfigLayer`]
//! and the layers are applied in that order to produce a [`Config`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{error, fmt, fs, io};

use log::{debug, LevelFilter};
use serde::Deserialize;

use crate::constants::{
    CLIENT_TOOLS_DIR, CONFIG_FILE_NAME, DEFAULT_ANONYMIZATION_PROFILE,
    DEFAULT_SERVER_URL, TOKEN_FILE_NAME, USER_PUPPETLABS_DIR,
};


//------------ Config Keys ---------------------------------------------------

pub const KEY_SERVER_URLS: &str = "puppetdb.server_urls";
pub const KEY_CACERT: &str = "puppetdb.cacert";
pub const KEY_CERT: &str = "puppetdb.cert";
pub const KEY_KEY: &str = "puppetdb.key";
pub const KEY_TOKEN_FILE: &str = "puppetdb.token-file";

/// Maps command line flag names to the config keys they override.
pub const FLAG_ALIASES: &[(&str, &str)] = &[
    ("urls", KEY_SERVER_URLS),
    ("cacert", KEY_CACERT),
    ("cert", KEY_CERT),
    ("key", KEY_KEY),
    ("token", KEY_TOKEN_FILE),
];

/// Returns the config key a command line flag overrides.
pub fn alias_for(flag: &str) -> Option<&'static str> {
    FLAG_ALIASES
        .iter()
        .find(|(name, _)| *name == flag)
        .map(|(_, key)| *key)
}


//------------ Default Paths -------------------------------------------------

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// The per-user Puppet Labs directory, `~/.puppetlabs`.
fn user_puppetlabs_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(USER_PUPPETLABS_DIR))
}

/// The system wide Puppet Labs directory.
#[cfg(not(windows))]
fn system_puppetlabs_dir() -> Option<PathBuf> {
    Some(PathBuf::from(crate::constants::SYSTEM_PUPPETLABS_DIR))
}

#[cfg(windows)]
fn system_puppetlabs_dir() -> Option<PathBuf> {
    std::env::var_os(crate::constants::PROGRAM_DATA_ENV)
        .map(|dir| PathBuf::from(dir).join("PuppetLabs"))
}

/// The default token file, `~/.puppetlabs/token`.
pub fn default_token_path() -> Option<PathBuf> {
    user_puppetlabs_dir().map(|dir| dir.join(TOKEN_FILE_NAME))
}

/// The default user config file,
/// `~/.puppetlabs/client-tools/puppetdb.conf`.
pub fn default_user_config_path() -> Option<PathBuf> {
    user_puppetlabs_dir()
        .map(|dir| dir.join(CLIENT_TOOLS_DIR).join(CONFIG_FILE_NAME))
}

/// The global config file.
pub fn global_config_path() -> Option<PathBuf> {
    system_puppetlabs_dir()
        .map(|dir| dir.join(CLIENT_TOOLS_DIR).join(CONFIG_FILE_NAME))
}

/// The computed default locations used during resolution.
///
/// These are normally derived from the platform and the user's home
/// directory but can be given explicitly for testing.
#[derive(Clone, Debug, Default)]
pub struct DefaultPaths {
    pub global_config: Option<PathBuf>,
    pub user_config: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
}

impl DefaultPaths {
    pub fn system() -> Self {
        DefaultPaths {
            global_config: global_config_path(),
            user_config: default_user_config_path(),
            token_file: default_token_path(),
        }
    }
}


//------------ LogLevel ------------------------------------------------------

/// The log levels that can be selected on the command line.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl LogLevel {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::None => LevelFilter::Off,
        }
    }

    /// Whether HTTP connections should log what goes over the wire.
    pub fn is_verbose(self) -> bool {
        matches!(self, LogLevel::Trace | LogLevel::Debug)
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "none" | "" => Ok(LogLevel::None),
            _ => Err(ConfigError::LogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::None => "none",
        })
    }
}


//------------ ConfigValue ---------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigValue {
    Str(String),
    List(Vec<String>),
}

impl ConfigValue {
    fn into_path(self) -> Option<PathBuf> {
        match self {
            ConfigValue::Str(s) => Some(PathBuf::from(s)),
            ConfigValue::List(_) => None,
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            ConfigValue::Str(s) => split_server_urls(&s),
            ConfigValue::List(list) => list,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigValue::Str(s) => s.fmt(f),
            ConfigValue::List(list) => write!(f, "{}", list.join(",")),
        }
    }
}

/// Splits a comma separated list of server URLs.
pub fn split_server_urls(urls: &str) -> Vec<String> {
    urls.split(',')
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}


//------------ LayerSource ---------------------------------------------------

/// Where the settings of a layer came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LayerSource {
    Defaults,
    GlobalFile(PathBuf),
    UserFile(PathBuf),
    Flags,
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LayerSource::Defaults => f.write_str("defaults"),
            LayerSource::GlobalFile(path) => {
                write!(f, "global config '{}'", path.display())
            }
            LayerSource::UserFile(path) => {
                write!(f, "user config '{}'", path.display())
            }
            LayerSource::Flags => f.write_str("command line"),
        }
    }
}


//------------ ConfigLayer ---------------------------------------------------

/// The settings supplied by a single source.
#[derive(Clone, Debug)]
pub struct ConfigLayer {
    source: LayerSource,
    values: BTreeMap<&'static str, ConfigValue>,
}

impl ConfigLayer {
    pub fn new(source: LayerSource) -> Self {
        ConfigLayer { source, values: BTreeMap::new() }
    }

    /// Sets a value, ignoring empty strings.
    pub fn set(&mut self, key: &'static str, value: ConfigValue) {
        match &value {
            ConfigValue::Str(s) if s.is_empty() => {}
            ConfigValue::List(list) if list.is_empty() => {}
            _ => {
                self.values.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    /// The built-in defaults.
    pub fn defaults(paths: &DefaultPaths) -> Self {
        let mut layer = ConfigLayer::new(LayerSource::Defaults);
        layer.set(
            KEY_SERVER_URLS,
            ConfigValue::List(vec![DEFAULT_SERVER_URL.to_string()]),
        );
        if let Some(token) = &paths.token_file {
            layer.set(
                KEY_TOKEN_FILE,
                ConfigValue::Str(token.to_string_lossy().into_owned()),
            );
        }
        layer
    }

    /// The values given on the command line.
    pub fn from_flags(flags: &ConfigFlags) -> Self {
        let mut layer = ConfigLayer::new(LayerSource::Flags);
        let given = [
            ("urls", &flags.urls),
            ("cacert", &flags.cacert),
            ("cert", &flags.cert),
            ("key", &flags.key),
            ("token", &flags.token),
        ];
        for (flag, value) in given {
            let (Some(key), Some(value)) = (alias_for(flag), value) else {
                continue;
            };
            let value = if key == KEY_SERVER_URLS {
                ConfigValue::List(split_server_urls(value))
            } else {
                ConfigValue::Str(value.clone())
            };
            layer.set(key, value);
        }
        layer
    }

    /// Reads a config file.
    ///
    /// The `source` must be one of the file sources.
    pub fn from_file(source: LayerSource) -> Result<Self, ConfigError> {
        let path = match &source {
            LayerSource::GlobalFile(path) | LayerSource::UserFile(path) => {
                Some(path.clone())
            }
            _ => None,
        };
        let Some(path) = path else {
            return Ok(ConfigLayer::new(source));
        };

        let content = fs::read(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let file: ConfigFile = serde_json::from_slice(&content)
            .map_err(|e| ConfigError::Parse(path.clone(), e))?;

        let mut layer = ConfigLayer::new(source);
        if let Some(section) = file.puppetdb {
            if let Some(urls) = section.server_urls {
                layer.set(KEY_SERVER_URLS, urls.into());
            }
            let paths = [
                (KEY_CACERT, section.cacert),
                (KEY_CERT, section.cert),
                (KEY_KEY, section.key),
                (KEY_TOKEN_FILE, section.token_file),
            ];
            for (key, value) in paths {
                if let Some(value) = value {
                    layer.set(key, ConfigValue::Str(value));
                }
            }
        }
        Ok(layer)
    }
}


//------------ ConfigFile ----------------------------------------------------

/// The on-disk format of a config file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    puppetdb: Option<PdbSection>,
}

#[derive(Debug, Deserialize)]
struct PdbSection {
    server_urls: Option<ServerUrls>,
    cacert: Option<String>,
    cert: Option<String>,
    key: Option<String>,
    #[serde(rename = "token-file")]
    token_file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerUrls {
    List(Vec<String>),
    Joined(String),
}

impl From<ServerUrls> for ConfigValue {
    fn from(urls: ServerUrls) -> Self {
        match urls {
            ServerUrls::List(list) => ConfigValue::List(
                list.iter()
                    .map(|url| url.trim())
                    .filter(|url| !url.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            ServerUrls::Joined(urls) => ConfigValue::List(split_server_urls(&urls)),
        }
    }
}


//------------ ConfigFlags ---------------------------------------------------

/// The configuration related command line flags.
///
/// Flags that were not given are `None`.
#[derive(Clone, Debug)]
pub struct ConfigFlags {
    pub urls: Option<String>,
    pub cacert: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub token: Option<String>,
    pub log_level: String,
    pub anon: String,
}

impl Default for ConfigFlags {
    fn default() -> Self {
        ConfigFlags {
            urls: None,
            cacert: None,
            cert: None,
            key: None,
            token: None,
            log_level: crate::constants::DEFAULT_LOG_LEVEL.to_string(),
            anon: DEFAULT_ANONYMIZATION_PROFILE.to_string(),
        }
    }
}


//------------ Config --------------------------------------------------------

/// The effective configuration of one invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub server_urls: Vec<String>,
    pub cacert: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
    pub log_level: LogLevel,
    pub anonymization_profile: String,
}

impl Config {
    /// Resolves the configuration using the platform's default locations.
    ///
    /// The `user_config` is the config file given on the command line, if
    /// any.
    pub fn resolve(
        flags: &ConfigFlags,
        user_config: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with(flags, user_config, &DefaultPaths::system())
    }

    /// Resolves the configuration using explicit default locations.
    pub fn resolve_with(
        flags: &ConfigFlags,
        user_config: Option<&Path>,
        defaults: &DefaultPaths,
    ) -> Result<Self, ConfigError> {
        let log_level = LogLevel::from_str(&flags.log_level)?;

        let mut layers = vec![ConfigLayer::defaults(defaults)];

        if let Some(path) = &defaults.global_config {
            match ConfigLayer::from_file(LayerSource::GlobalFile(path.clone())) {
                Ok(layer) => layers.push(layer),
                Err(ConfigError::Io(_, e)) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("No global config found at '{}'", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        let user_path = user_config
            .filter(|path| !path.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| defaults.user_config.clone());
        if let Some(path) = user_path {
            let is_default = defaults.user_config.as_deref() == Some(path.as_path());
            match ConfigLayer::from_file(LayerSource::UserFile(path.clone())) {
                Ok(layer) => layers.push(layer),
                Err(ConfigError::Io(_, e))
                    if is_default && e.kind() == io::ErrorKind::NotFound =>
                {
                    debug!("No user config found at '{}'", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        layers.push(ConfigLayer::from_flags(flags));

        let anonymization_profile = if flags.anon.is_empty() {
            DEFAULT_ANONYMIZATION_PROFILE.to_string()
        } else {
            flags.anon.clone()
        };

        Self::from_layers(&layers, log_level, anonymization_profile, defaults)
    }

    /// Applies the layers from lowest to highest precedence.
    pub fn from_layers(
        layers: &[ConfigLayer],
        log_level: LogLevel,
        anonymization_profile: String,
        defaults: &DefaultPaths,
    ) -> Result<Self, ConfigError> {
        let mut merged: BTreeMap<&'static str, ConfigValue> = BTreeMap::new();
        for layer in layers {
            for (key, value) in &layer.values {
                if let Some(previous) = merged.insert(*key, value.clone()) {
                    if previous != *value {
                        debug!(
                            "{} overrides {} with '{}' (was '{}')",
                            layer.source, key, value, previous
                        );
                    }
                }
            }
        }

        let server_urls = merged
            .remove(KEY_SERVER_URLS)
            .map(ConfigValue::into_list)
            .unwrap_or_default();
        if server_urls.is_empty() {
            return Err(ConfigError::NoServerUrls);
        }

        let mut token_file = merged.remove(KEY_TOKEN_FILE).and_then(ConfigValue::into_path);
        if let (Some(token), Some(default)) = (&token_file, &defaults.token_file) {
            if token == default && !token.exists() {
                debug!(
                    "Default token file '{}' does not exist, not using a token",
                    token.display()
                );
                token_file = None;
            }
        }

        Ok(Config {
            server_urls,
            cacert: merged.remove(KEY_CACERT).and_then(ConfigValue::into_path),
            cert: merged.remove(KEY_CERT).and_then(ConfigValue::into_path),
            key: merged.remove(KEY_KEY).and_then(ConfigValue::into_path),
            token_file,
            log_level,
            anonymization_profile,
        })
    }

    /// The server used by operations that talk to a single server.
    ///
    /// Any further configured servers are ignored with a debug message.
    pub fn primary_url(&self) -> &str {
        let url = self.server_urls.first().map(String::as_str).unwrap_or(DEFAULT_SERVER_URL);
        if self.server_urls.len() > 1 {
            debug!("Multiple URLs passed, will only use the first one ({})", url);
        }
        url
    }
}


//------------ Logging -------------------------------------------------------

/// Installs the global logger writing to stderr.
pub fn init_logging(level: LogLevel) -> Result<(), ConfigError> {
    fern_logger(level)
        .chain(io::stderr())
        .apply()
        .map_err(|e| ConfigError::Logging(format!("Failed to init stderr logging: {}", e)))
}

/// Creates a fern logger with log level tweaks.
fn fern_logger(level: LogLevel) -> fern::Dispatch {
    let log_level = level.level_filter();

    // suppress overly noisy logging
    let framework_level = log_level.min(LevelFilter::Warn);

    // reqwest logs connection traffic at trace level
    let wire_level = if level.is_verbose() {
        LevelFilter::Trace
    } else {
        framework_level
    };

    let show_target = level.is_verbose();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            if show_target {
                out.finish(format_args!(
                    "{} [{}] [{}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "{} [{}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    message
                ))
            }
        })
        .level(log_level)
        .level_for("rustls", framework_level)
        .level_for("hyper", framework_level)
        .level_for("hyper_util", framework_level)
        .level_for("mio", framework_level)
        .level_for("reqwest", framework_level)
        .level_for("reqwest::connect::verbose", wire_level)
        .level_for("want", framework_level)
        .level_for("h2", framework_level)
}


//------------ ConfigError ---------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, io::Error),
    Parse(PathBuf, serde_json::Error),
    LogLevel(String),
    NoServerUrls,
    Logging(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => {
                write!(f, "Cannot read config '{}': {}", path.display(), e)
            }
            ConfigError::Parse(path, e) => {
                write!(f, "Cannot parse config '{}': {}", path.display(), e)
            }
            ConfigError::LogLevel(level) => write!(
                f,
                "Invalid log level '{}'. Supported levels are: none, trace, debug, info, warn, and error",
                level
            ),
            ConfigError::NoServerUrls => f.write_str("No PuppetDB server URLs configured"),
            ConfigError::Logging(msg) => msg.fmt(f),
        }
    }
}

impl error::Error for ConfigError {}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
        defaults: DefaultPaths,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let defaults = DefaultPaths {
                global_config: Some(dir.path().join("global.conf")),
                user_config: Some(dir.path().join("user.conf")),
                token_file: Some(dir.path().join("token")),
            };
            Fixture { dir, defaults }
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn resolve(&self, flags: &ConfigFlags) -> Result<Config, ConfigError> {
            Config::resolve_with(flags, None, &self.defaults)
        }
    }

    #[test]
    fn uses_defaults_without_any_config() {
        let fixture = Fixture::new();
        let config = fixture.resolve(&ConfigFlags::default()).unwrap();

        assert_eq!(config.server_urls, vec![DEFAULT_SERVER_URL.to_string()]);
        assert_eq!(config.cacert, None);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.anonymization_profile, "none");
    }

    #[test]
    fn absent_default_token_file_is_dropped() {
        let fixture = Fixture::new();
        let config = fixture.resolve(&ConfigFlags::default()).unwrap();
        assert_eq!(config.token_file, None);
    }

    #[test]
    fn present_default_token_file_is_kept() {
        let fixture = Fixture::new();
        let token = fixture.write("token", "abcd");
        let config = fixture.resolve(&ConfigFlags::default()).unwrap();
        assert_eq!(config.token_file, Some(token));
    }

    #[test]
    fn explicit_token_file_is_kept_even_if_absent() {
        let fixture = Fixture::new();
        let flags = ConfigFlags {
            token: Some("/no/such/token".into()),
            ..Default::default()
        };
        let config = fixture.resolve(&flags).unwrap();
        assert_eq!(config.token_file, Some(PathBuf::from("/no/such/token")));
    }

    #[test]
    fn precedence_is_flags_user_global_defaults() {
        let fixture = Fixture::new();
        fixture.write(
            "global.conf",
            r#"{"puppetdb": {
                "server_urls": ["https://global:8081"],
                "cacert": "/global/ca.pem",
                "cert": "/global/cert.pem",
                "key": "/global/key.pem"
            }}"#,
        );
        fixture.write(
            "user.conf",
            r#"{"puppetdb": {
                "server_urls": "https://user:8081, https://user2:8081",
                "cert": "/user/cert.pem"
            }}"#,
        );
        let flags = ConfigFlags {
            key: Some("/flag/key.pem".into()),
            ..Default::default()
        };

        let config = fixture.resolve(&flags).unwrap();
        assert_eq!(
            config.server_urls,
            vec!["https://user:8081".to_string(), "https://user2:8081".to_string()]
        );
        assert_eq!(config.cacert, Some(PathBuf::from("/global/ca.pem")));
        assert_eq!(config.cert, Some(PathBuf::from("/user/cert.pem")));
        assert_eq!(config.key, Some(PathBuf::from("/flag/key.pem")));
    }

    #[test]
    fn urls_flag_is_split_and_trimmed() {
        let fixture = Fixture::new();
        let flags = ConfigFlags {
            urls: Some("   http://localhost:8080  ,   http://foo.bar.baz:9190".into()),
            ..Default::default()
        };
        let config = fixture.resolve(&flags).unwrap();
        assert_eq!(
            config.server_urls,
            vec![
                "http://localhost:8080".to_string(),
                "http://foo.bar.baz:9190".to_string()
            ]
        );
    }

    #[test]
    fn empty_urls_flag_counts_as_not_given() {
        let fixture = Fixture::new();
        let flags = ConfigFlags { urls: Some(String::new()), ..Default::default() };
        let config = fixture.resolve(&flags).unwrap();
        assert_eq!(config.server_urls, vec![DEFAULT_SERVER_URL.to_string()]);
    }

    #[test]
    fn explicit_missing_user_config_is_an_error() {
        let fixture = Fixture::new();
        let missing = fixture.dir.path().join("missing.conf");
        let err = Config::resolve_with(
            &ConfigFlags::default(),
            Some(&missing),
            &fixture.defaults,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn explicit_default_user_config_may_be_absent() {
        let fixture = Fixture::new();
        let default = fixture.defaults.user_config.clone().unwrap();
        assert!(
            Config::resolve_with(&ConfigFlags::default(), Some(&default), &fixture.defaults)
                .is_ok()
        );
    }

    #[test]
    fn malformed_global_config_is_an_error() {
        let fixture = Fixture::new();
        fixture.write("global.conf", "{ not json");
        assert!(matches!(
            fixture.resolve(&ConfigFlags::default()),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let fixture = Fixture::new();
        let flags = ConfigFlags { log_level: "verbose".into(), ..Default::default() };
        let err = fixture.resolve(&flags).unwrap_err();
        assert!(matches!(err, ConfigError::LogLevel(ref level) if level == "verbose"));
    }

    #[test]
    fn empty_log_level_is_none() {
        let fixture = Fixture::new();
        let flags = ConfigFlags { log_level: String::new(), ..Default::default() };
        let config = fixture.resolve(&flags).unwrap();
        assert_eq!(config.log_level, LogLevel::None);
        assert_eq!(config.log_level.level_filter(), LevelFilter::Off);
    }

    #[test]
    fn empty_server_urls_in_config_list_are_dropped() {
        let fixture = Fixture::new();
        fixture.write(
            "global.conf",
            r#"{"puppetdb": {"server_urls": ["", "  ", " http://x.test "]}}"#,
        );
        let config = fixture.resolve(&ConfigFlags::default()).unwrap();
        assert_eq!(config.server_urls, vec!["http://x.test".to_string()]);
        assert_eq!(config.primary_url(), "http://x.test");
    }

    #[test]
    fn log_levels_map_to_filters() {
        assert_eq!(LogLevel::from_str("none").unwrap().level_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::from_str("trace").unwrap().level_filter(), LevelFilter::Trace);
        assert!(LogLevel::Debug.is_verbose());
        assert!(!LogLevel::Info.is_verbose());
    }

    #[test]
    fn flag_aliases_map_to_config_keys() {
        assert_eq!(alias_for("urls"), Some(KEY_SERVER_URLS));
        assert_eq!(alias_for("token"), Some(KEY_TOKEN_FILE));
        assert_eq!(alias_for("log-level"), None);
    }

    #[test]
    fn higher_layer_wins_regardless_of_content() {
        let mut low = ConfigLayer::new(LayerSource::Defaults);
        low.set(KEY_CACERT, ConfigValue::Str("/low/ca.pem".into()));
        let mut high = ConfigLayer::new(LayerSource::Flags);
        high.set(KEY_CACERT, ConfigValue::Str("/high/ca.pem".into()));
        high.set(KEY_SERVER_URLS, ConfigValue::List(vec!["http://x.test".into()]));

        let config = Config::from_layers(
            &[low, high],
            LogLevel::Warn,
            "none".into(),
            &DefaultPaths::default(),
        )
        .unwrap();
        assert_eq!(config.cacert, Some(PathBuf::from("/high/ca.pem")));
    }

    #[test]
    fn no_server_urls_is_an_error() {
        let layer = ConfigLayer::new(LayerSource::Defaults);
        assert!(matches!(
            Config::from_layers(&[layer], LogLevel::Warn, "none".into(), &DefaultPaths::default()),
            Err(ConfigError::NoServerUrls)
        ));
    }

    #[test]
    fn should_set_correct_log_levels() {
        use log::Level;

        let void_output = fern::Output::writer(Box::new(io::sink()), "");
        let (_, logger) = fern_logger(LogLevel::Info).chain(void_output).into_log();

        let enabled = |target: &str, level: Level| {
            logger.enabled(&log::Metadata::builder().target(target).level(level).build())
        };

        assert!(enabled("puppetdb_cli", Level::Info));
        assert!(!enabled("puppetdb_cli", Level::Debug));
        assert!(!enabled("reqwest", Level::Info));
        assert!(enabled("reqwest", Level::Warn));
        assert!(!enabled("reqwest::connect::verbose", Level::Trace));

        let void_output = fern::Output::writer(Box::new(io::sink()), "");
        let (_, logger) = fern_logger(LogLevel::Debug).chain(void_output).into_log();
        assert!(logger.enabled(
            &log::Metadata::builder()
                .target("reqwest::connect::verbose")
                .level(Level::Trace)
                .build()
        ));
    }
}
