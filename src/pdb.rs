//! Executing authenticated requests against PuppetDB.
//!
//! Every operation follows the same steps. The token is read first, a read
//! failure only being logged. Then the transport is built, with any error
//! returned as is. Finally the request is dispatched with the token in the
//! `X-Authentication` header.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{
    ApiClient, ApiRequest, Error, LiveClient, Operation, TlsFiles,
    TransportProfile,
};
use crate::config::Config;
use crate::fs::{Filesystem, LocalFs};
use crate::token::{Token, TokenFile, TokenSource};


//------------ PuppetDb ------------------------------------------------------

/// Runs the PuppetDB operations with injected capabilities.
pub struct PuppetDb<C, F, T> {
    client: C,
    fs: F,
    token: T,
    tls: TlsFiles,
    token_present: bool,
    verbose: bool,
}

impl PuppetDb<LiveClient, LocalFs, TokenFile> {
    /// Creates the executor used by the command line tools.
    pub fn from_config(config: &Config) -> Self {
        PuppetDb::new(
            LiveClient,
            LocalFs,
            TokenFile::new(config.token_file.clone()),
            TlsFiles::from_config(config),
            config.token_file.is_some(),
            config.log_level.is_verbose(),
        )
    }
}

impl<C: ApiClient, F: Filesystem, T: TokenSource> PuppetDb<C, F, T> {
    /// Creates a new executor.
    ///
    /// The `token_present` flag tells whether a token has been configured
    /// and is used to decide whether an `https` server can be used without
    /// a client certificate.
    pub fn new(
        client: C,
        fs: F,
        token: T,
        tls: TlsFiles,
        token_present: bool,
        verbose: bool,
    ) -> Self {
        PuppetDb { client, fs, token, tls, token_present, verbose }
    }

    fn read_token(&self) -> Token {
        match self.token.read() {
            Ok(token) => token,
            Err(e) => {
                debug!("{}", e);
                Token::empty()
            }
        }
    }

    fn transport(&self, url: &str) -> Result<C::Transport, Error> {
        let profile = TransportProfile::new(
            self.tls.clone(),
            url,
            self.token_present,
            self.verbose,
        )?;
        self.client.build_transport(&profile)
    }

    fn dispatch_json<D: serde::de::DeserializeOwned>(
        &self,
        transport: &C::Transport,
        request: ApiRequest,
    ) -> Result<D, Error> {
        let operation = request.operation();
        let mut body = Vec::new();
        self.client.dispatch(transport, request, &mut body)?;
        serde_json::from_slice(&body).map_err(|e| {
            Error::response(
                operation.path(),
                format!("could not parse JSON response: {}", e),
            )
        })
    }

    /// Fetches the status of the services of one server.
    pub fn status(&self, url: &str) -> Result<Value, Error> {
        let token = self.read_token();
        let transport = self.transport(url)?;
        self.dispatch_json(&transport, ApiRequest::new(Operation::GetStatus, token))
    }

    /// Fetches the status of every server.
    ///
    /// A failing server gets an `error` entry in the report. Argument errors
    /// apply to the configuration as a whole and are returned right away.
    pub fn status_all(&self, urls: &[String]) -> Result<StatusReport, Error> {
        let mut report = StatusReport::default();
        for url in urls {
            match self.status(url) {
                Ok(payload) => report.insert(url, payload),
                Err(e) if e.is_argument_error() => return Err(e),
                Err(e) => {
                    debug!("Status of '{}' failed: {}", url, e);
                    report.insert(url, json!({ "error": e.to_string() }))
                }
            }
        }
        Ok(report)
    }

    /// Runs a query.
    pub fn query(&self, url: &str, query: &str) -> Result<Value, Error> {
        let token = self.read_token();
        let transport = self.transport(url)?;
        let query = convert_ast(query);
        let request = ApiRequest::new(Operation::GetQuery, token).with_query("query", query);
        self.dispatch_json(&transport, request)
    }

    /// Downloads an archive of all data into the file at `path`.
    ///
    /// The file is removed again if the download fails.
    pub fn export(&self, url: &str, path: &Path, anonymization_profile: &str) -> Result<(), Error> {
        let token = self.read_token();
        let transport = self.transport(url)?;
        let mut file = self.fs.create(path)?;

        let request = ApiRequest::new(Operation::GetExport, token)
            .with_query("anonymization_profile", anonymization_profile);

        let res = self
            .client
            .dispatch(&transport, request, &mut file)
            .and_then(|()| {
                file.flush()
                    .map_err(|e| Error::response(Operation::GetExport.path(), e))
            });
        drop(file);

        if let Err(err) = res {
            if let Err(e) = self.fs.remove(path) {
                warn!("Cannot remove incomplete export: {}", e);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Uploads the archive at `path`.
    ///
    /// A response that does not report success is only warned about.
    pub fn import(&self, url: &str, path: &Path) -> Result<ImportResponse, Error> {
        let token = self.read_token();
        let transport = self.transport(url)?;
        let reader = self.fs.open(path)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());
        let request = ApiRequest::new(Operation::PostImport, token)
            .with_archive(file_name, reader);

        let response: ImportResponse = self.dispatch_json(&transport, request)?;
        if !response.ok {
            warn!("API returned 200, but got 'ok: {}' instead of true", response.ok);
        }
        Ok(response)
    }
}


//------------ convert_ast ---------------------------------------------------

/// Normalizes a query given as a JSON array.
///
/// Anything that is not a JSON array is returned unchanged.
pub fn convert_ast(query: &str) -> String {
    match serde_json::from_str::<Vec<Value>>(query) {
        Ok(ast) => match serde_json::to_string(&ast) {
            Ok(converted) => converted,
            Err(e) => {
                debug!("Cannot marshal {:?} to string: {}", ast, e);
                query.to_string()
            }
        },
        Err(e) => {
            debug!("Cannot convert query to AST ({}), sending it as is", e);
            query.to_string()
        }
    }
}


//------------ StatusReport --------------------------------------------------

/// The status of each server, keyed by URL.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct StatusReport(BTreeMap<String, Value>);

impl StatusReport {
    fn insert(&mut self, url: &str, value: Value) {
        self.0.insert(url.to_string(), value);
    }

    pub fn get(&self, url: &str) -> Option<&Value> {
        self.0.get(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}


//------------ ImportResponse ------------------------------------------------

/// The body of a successful import.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ImportResponse {
    #[serde(default)]
    pub ok: bool,
}


//------------ Tests ---------------------------------------------------------
