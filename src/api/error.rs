//! Errors talking to the PuppetDB API.

use std::path::PathBuf;
use std::{error, fmt};

use serde::Deserialize;

use crate::fs::FsError;
use super::{Method, Operation};


//------------ Error ---------------------------------------------------------

type ErrorUri = String;
type ErrorMessage = String;

#[derive(Debug)]
pub enum Error {
    /// The URL uses a scheme other than `http` or `https`.
    ///
    /// Holds the title-cased scheme, which is empty if the URL had none.
    InvalidScheme(String),

    /// An `https` URL without a token or a client certificate and key.
    MissingAuthentication,

    UrlParse(ErrorUri, url::ParseError),
    Certificate(PathBuf, ErrorMessage),
    RequestBuild(ErrorUri, ErrorMessage),
    RequestExecute(ErrorUri, ErrorMessage),
    Response(ErrorUri, ErrorMessage),
    Remote(RemoteError),
    Filesystem(FsError),
}

impl Error {
    pub fn certificate(path: impl Into<PathBuf>, msg: impl fmt::Display) -> Self {
        Error::Certificate(path.into(), msg.to_string())
    }

    pub fn request_build(uri: impl fmt::Display, msg: impl fmt::Display) -> Self {
        Error::RequestBuild(uri.to_string(), msg.to_string())
    }

    pub fn execute(uri: impl fmt::Display, msg: impl fmt::Display) -> Self {
        Error::RequestExecute(uri.to_string(), msg.to_string())
    }

    pub fn response(uri: impl fmt::Display, msg: impl fmt::Display) -> Self {
        Error::Response(uri.to_string(), msg.to_string())
    }

    /// Returns whether this is a misconfiguration of the command line.
    ///
    /// These are reported verbatim and never aggregated.
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Error::InvalidScheme(_) | Error::MissingAuthentication)
    }

    pub fn is_filesystem_error(&self) -> bool {
        matches!(self, Error::Filesystem(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidScheme(scheme) => write!(f, "Invalid scheme for {}", scheme),
            Error::MissingAuthentication => f.write_str(
                "ssl requires a token, please use `puppet access login` to retrieve a token \
                 (alternatively use 'cert' and 'key' for whitelist validation)",
            ),
            Error::UrlParse(uri, e) => write!(f, "Cannot parse URL '{}': {}", uri, e),
            Error::Certificate(path, msg) => {
                write!(f, "Cannot use configured certificate file '{}'. Error: {}", path.display(), msg)
            }
            Error::RequestBuild(uri, msg) => {
                write!(f, "Issue creating request for URI: {}, error: {}", uri, msg)
            }
            Error::RequestExecute(uri, msg) => {
                write!(f, "Issue accessing URI: {}, error: {}", uri, msg)
            }
            Error::Response(uri, msg) => {
                write!(f, "Issue processing response from URI: {}, error: {}", uri, msg)
            }
            Error::Remote(e) => e.fmt(f),
            Error::Filesystem(e) => e.fmt(f),
        }
    }
}

impl error::Error for Error {}

impl From<FsError> for Error {
    fn from(e: FsError) -> Self {
        Error::Filesystem(e)
    }
}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Error::Remote(e)
    }
}


//------------ ErrorEnvelope -------------------------------------------------

/// The JSON body of an error response.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub msg: Option<String>,

    #[serde(default)]
    pub details: Option<serde_json::Value>,

    #[serde(default)]
    pub kind: Option<String>,
}

impl ErrorEnvelope {
    fn details_compact(&self) -> String {
        match &self.details {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
        }
    }

    fn details_pretty(&self) -> String {
        match &self.details {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
        }
    }
}


//------------ RemoteError ---------------------------------------------------

/// An error response returned by the server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteError {
    operation: Operation,
    status: u16,
    envelope: Option<ErrorEnvelope>,
    body: String,
}

impl RemoteError {
    /// Creates the error from the raw response body.
    ///
    /// Bodies that are not an error envelope are kept as text.
    pub fn new(operation: Operation, status: u16, body: &[u8]) -> Self {
        let envelope = serde_json::from_slice::<ErrorEnvelope>(body).ok();
        let body = String::from_utf8_lossy(body).trim().to_string();
        RemoteError { operation, status, envelope, body }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn method(&self) -> Method {
        self.operation.method()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        self.envelope.as_ref()
    }

    fn prefix(&self) -> String {
        format!(
            "[{} {}][{}] {} default ",
            self.method(),
            self.operation.path(),
            self.status,
            self.operation.name()
        )
    }

    /// Renders the message followed by the pretty-printed details.
    ///
    /// Falls back to the single line form if the server did not send an
    /// error envelope.
    pub fn detailed(&self) -> String {
        match &self.envelope {
            Some(envelope) => format!(
                "{} {}\n{}",
                self.prefix(),
                envelope.msg.as_deref().unwrap_or_default(),
                envelope.details_pretty()
            ),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.envelope {
            Some(envelope) => write!(
                f,
                "{} &{{Details:{} Kind:{} Msg:{}}}",
                self.prefix(),
                envelope.details_compact(),
                envelope.kind.as_deref().unwrap_or_default(),
                envelope.msg.as_deref().unwrap_or_default()
            ),
            None => write!(f, "{} {}", self.prefix(), self.body),
        }
    }
}

impl error::Error for RemoteError {}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_single_line() {
        let err = RemoteError::new(
            Operation::GetExport,
            500,
            br#"{"msg": "boom", "kind": "puppetlabs/internal"}"#,
        );
        assert_eq!(
            err.to_string(),
            "[GET /pdb/admin/v1/archive][500] getExport default  \
             &{Details: Kind:puppetlabs/internal Msg:boom}"
        );
    }

    #[test]
    fn remote_error_detailed_pretty_prints_details() {
        let err = RemoteError::new(
            Operation::GetQuery,
            400,
            br#"{"msg": "bad query", "details": {"line": 1}}"#,
        );
        assert_eq!(
            err.detailed(),
            "[GET /pdb/query/v4][400] getQuery default  bad query\n{\n  \"line\": 1\n}"
        );
    }

    #[test]
    fn remote_error_keeps_plain_body() {
        let err = RemoteError::new(Operation::PostImport, 403, b"Permission denied\n");
        assert!(err.envelope().is_none());
        assert_eq!(
            err.to_string(),
            "[POST /pdb/admin/v1/archive][403] postImport default  Permission denied"
        );
        assert_eq!(err.detailed(), err.to_string());
    }

    #[test]
    fn argument_errors_are_recognised() {
        assert!(Error::MissingAuthentication.is_argument_error());
        assert!(Error::InvalidScheme("Ftp".into()).is_argument_error());
        assert!(!Error::execute("http://x.test", "refused").is_argument_error());
    }
}
