//! An API client that records requests instead of sending them.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::token::Token;
use super::{ApiClient, ApiRequest, Body, Error, Operation, RemoteError, TransportProfile};


//------------ RecordedRequest -----------------------------------------------

/// A request as seen by the [`RecordingClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedRequest {
    pub operation: Operation,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub token: Token,

    /// The file name and content of an uploaded archive.
    pub archive: Option<(String, Vec<u8>)>,
}


//------------ Reply ---------------------------------------------------------

/// A scripted reply to the next request.
#[derive(Clone, Debug)]
pub enum Reply {
    /// A successful response with the given body.
    Ok(Vec<u8>),

    /// An error response.
    Remote { status: u16, body: String },

    /// The server could not be reached.
    Unreachable,

    /// The connection broke after part of the body was written.
    Broken { written: Vec<u8> },
}

impl Reply {
    pub fn json(body: &serde_json::Value) -> Self {
        Reply::Ok(body.to_string().into_bytes())
    }

    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Reply::Remote { status, body: body.into() }
    }
}


//------------ RecordingClient -----------------------------------------------

/// Records every transport built and every request dispatched.
///
/// Replies are handed out in the order they were scripted. Once they run
/// out, every request succeeds with an empty JSON object. Clones share
/// their state, so a test can keep one and hand another to the code under
/// test.
#[derive(Clone, Debug, Default)]
pub struct RecordingClient {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    transports: Vec<TransportProfile>,
    requests: Vec<RecordedRequest>,
    replies: VecDeque<Reply>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reply for a future request.
    pub fn reply(&self, reply: Reply) -> &Self {
        self.lock().replies.push_back(reply);
        self
    }

    pub fn transports(&self) -> Vec<TransportProfile> {
        self.lock().transports.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ApiClient for RecordingClient {
    type Transport = TransportProfile;

    fn build_transport(
        &self,
        profile: &TransportProfile,
    ) -> Result<TransportProfile, Error> {
        self.lock().transports.push(profile.clone());
        Ok(profile.clone())
    }

    fn dispatch(
        &self,
        transport: &TransportProfile,
        request: ApiRequest,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        let operation = request.operation();
        let url = transport.endpoint(operation.path()).to_string();
        let query = request
            .query()
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let token = request.token().clone();

        let archive = match request.into_body() {
            Body::Empty => None,
            Body::Archive { file_name, mut reader } => {
                let mut content = Vec::new();
                reader
                    .read_to_end(&mut content)
                    .map_err(|e| Error::request_build(&url, e))?;
                Some((file_name, content))
            }
        };

        let reply = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                operation,
                url: url.clone(),
                query,
                token,
                archive,
            });
            state.replies.pop_front()
        };

        match reply.unwrap_or_else(|| Reply::Ok(b"{}".to_vec())) {
            Reply::Ok(body) => {
                out.write_all(&body).map_err(|e| Error::response(&url, e))
            }
            Reply::Remote { status, body } => {
                Err(RemoteError::new(operation, status, body.as_bytes()).into())
            }
            Reply::Unreachable => Err(Error::execute(&url, "connection refused")),
            Reply::Broken { written } => {
                out.write_all(&written).map_err(|e| Error::response(&url, e))?;
                Err(Error::response(&url, "connection reset"))
            }
        }
    }
}


//------------ Tests ---------------------------------------------------------
