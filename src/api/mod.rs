//! The PuppetDB HTTP API.
//!
//! An [`ApiClient`] turns a validated [`TransportProfile`] into a transport
//! and dispatches [`ApiRequest`]s over it. The [`LiveClient`] talks to a real
//! server, the [`RecordingClient`] records requests and replays scripted
//! replies.

//------------ Sub-modules ---------------------------------------------------

pub mod error;
pub mod httpclient;
pub mod recording;
pub mod transport;


//------------ Content -------------------------------------------------------

use std::fmt;
use std::io::{Read, Write};

use crate::token::Token;

pub use self::error::{Error, ErrorEnvelope, RemoteError};
pub use self::httpclient::{LiveClient, LiveTransport};
pub use self::recording::{RecordedRequest, RecordingClient, Reply};
pub use self::transport::{Scheme, TlsFiles, TransportProfile};


//------------ ApiClient -----------------------------------------------------

/// A way of talking to the PuppetDB API.
pub trait ApiClient {
    /// The ready-to-use connection state for one server.
    type Transport;

    /// Creates the transport for a validated profile.
    fn build_transport(
        &self,
        profile: &TransportProfile,
    ) -> Result<Self::Transport, Error>;

    /// Sends a request and writes the body of a successful response to `out`.
    ///
    /// Error responses are turned into [`Error::Remote`] and nothing is
    /// written for them.
    fn dispatch(
        &self,
        transport: &Self::Transport,
        request: ApiRequest,
        out: &mut dyn Write,
    ) -> Result<(), Error>;
}


//------------ Method --------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
        })
    }
}


//------------ Operation -----------------------------------------------------

/// The API operations used by the command line tools.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    GetStatus,
    GetQuery,
    GetExport,
    PostImport,
}

impl Operation {
    /// The name used when reporting errors for this operation.
    pub fn name(self) -> &'static str {
        match self {
            Operation::GetStatus => "getStatus",
            Operation::GetQuery => "getQuery",
            Operation::GetExport => "getExport",
            Operation::PostImport => "postImport",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Operation::PostImport => Method::Post,
            _ => Method::Get,
        }
    }

    /// The path of the endpoint below the server's base path.
    pub fn path(self) -> &'static str {
        match self {
            Operation::GetStatus => "/status/v1/services",
            Operation::GetQuery => "/pdb/query/v4",
            Operation::GetExport | Operation::PostImport => {
                "/pdb/admin/v1/archive"
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}


//------------ Body ----------------------------------------------------------

/// The body of a request.
pub enum Body {
    Empty,

    /// An archive uploaded as a multipart form field.
    Archive {
        file_name: String,
        reader: Box<dyn Read + Send>,
    },
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Archive { file_name, .. } => {
                f.debug_struct("Archive").field("file_name", file_name).finish()
            }
        }
    }
}


//------------ ApiRequest ----------------------------------------------------

/// A single authenticated API request.
#[derive(Debug)]
pub struct ApiRequest {
    operation: Operation,
    query: Vec<(&'static str, String)>,
    token: Token,
    body: Body,
}

impl ApiRequest {
    pub fn new(operation: Operation, token: Token) -> Self {
        ApiRequest { operation, query: Vec::new(), token, body: Body::Empty }
    }

    pub fn with_query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn with_archive(
        mut self,
        file_name: impl Into<String>,
        reader: Box<dyn Read + Send>,
    ) -> Self {
        self.body = Body::Archive { file_name: file_name.into(), reader };
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn query(&self) -> &[(&'static str, String)] {
        &self.query
    }

    /// The value of the `X-Authentication` header, possibly empty.
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_match_endpoints() {
        assert_eq!(Operation::GetStatus.path(), "/status/v1/services");
        assert_eq!(Operation::GetQuery.method(), Method::Get);
        assert_eq!(Operation::GetExport.path(), Operation::PostImport.path());
        assert_eq!(Operation::PostImport.method(), Method::Post);
        assert_eq!(Operation::PostImport.to_string(), "postImport");
    }

    #[test]
    fn request_keeps_query_in_order() {
        let request = ApiRequest::new(Operation::GetExport, Token::empty())
            .with_query("anonymization_profile", "moderate");
        assert_eq!(
            request.query(),
            &[("anonymization_profile", "moderate".to_string())]
        );
        assert!(matches!(request.into_body(), Body::Empty));
    }
}
