//! The API client talking to a real PuppetDB server.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use log::{debug, trace};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, ClientBuilder};

use crate::constants::{ARCHIVE_FIELD, HEADER_X_AUTHENTICATION, USER_AGENT_VALUE};
use super::{ApiClient, ApiRequest, Body, Error, Method, RemoteError, TransportProfile};


//------------ LiveClient ----------------------------------------------------

/// An API client using a blocking reqwest client.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiveClient;

/// A reqwest client set up for a single server.
#[derive(Clone, Debug)]
pub struct LiveTransport {
    client: Client,
    profile: TransportProfile,
}

impl LiveTransport {
    pub fn profile(&self) -> &TransportProfile {
        &self.profile
    }
}

impl ApiClient for LiveClient {
    type Transport = LiveTransport;

    fn build_transport(
        &self,
        profile: &TransportProfile,
    ) -> Result<LiveTransport, Error> {
        let mut builder = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(USER_AGENT_VALUE)
            .connection_verbose(profile.verbose());

        let tls = profile.tls();
        if let Some(cacert) = &tls.cacert {
            for cert in load_root_certs(cacert)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        if let Some((cert, key)) = tls.identity() {
            builder = builder.identity(load_identity(cert, key)?);
        }

        let client = builder
            .build()
            .map_err(|e| Error::request_build(profile, e))?;

        debug!("Created transport for {}", profile);
        Ok(LiveTransport { client, profile: profile.clone() })
    }

    fn dispatch(
        &self,
        transport: &LiveTransport,
        request: ApiRequest,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        let operation = request.operation();
        let url = transport.profile.endpoint(operation.path());
        let uri = url.to_string();

        let mut builder = match operation.method() {
            Method::Get => transport.client.get(url),
            Method::Post => transport.client.post(url),
        };
        builder = builder.header(HEADER_X_AUTHENTICATION, request.token().as_str());
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }

        if let Body::Archive { file_name, reader } = request.into_body() {
            let part = Part::reader(reader).file_name(file_name);
            builder = builder.multipart(Form::new().part(ARCHIVE_FIELD, part));
        }

        trace!("{} {}", operation.method(), uri);
        let mut res = builder.send().map_err(|e| Error::execute(&uri, e))?;

        let status = res.status();
        debug!("{} {} returned {}", operation.method(), uri, status);
        if status.is_success() {
            io::copy(&mut res, out).map_err(|e| Error::response(&uri, e))?;
            Ok(())
        } else {
            let body = res.bytes().map(|b| b.to_vec()).unwrap_or_default();
            Err(RemoteError::new(operation, status.as_u16(), &body).into())
        }
    }
}


//------------ TLS Material --------------------------------------------------

/// Loads all certificates in a PEM bundle as trust anchors.
fn load_root_certs(path: &Path) -> Result<Vec<reqwest::Certificate>, Error> {
    let file = File::open(path).map_err(|e| Error::certificate(path, e))?;
    let mut reader = BufReader::new(file);

    let mut certs = Vec::new();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| Error::certificate(path, e))?;
        let cert = reqwest::Certificate::from_der(cert.as_ref())
            .map_err(|e| Error::certificate(path, e))?;
        certs.push(cert);
    }

    if certs.is_empty() {
        return Err(Error::certificate(path, "no certificates found"));
    }
    debug!("Loaded {} CA certificate(s) from '{}'", certs.len(), path.display());
    Ok(certs)
}

/// Loads a client certificate and its private key.
fn load_identity(cert: &Path, key: &Path) -> Result<reqwest::Identity, Error> {
    let mut pem = std::fs::read(key).map_err(|e| Error::certificate(key, e))?;
    pem.push(b'\n');
    pem.extend(std::fs::read(cert).map_err(|e| Error::certificate(cert, e))?);
    reqwest::Identity::from_pem(&pem).map_err(|e| Error::certificate(cert, e))
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TlsFiles;

    #[test]
    fn missing_ca_bundle_is_certificate_error() {
        let tls = TlsFiles::new(Some("/no/such/ca.pem".into()), None, None);
        let profile = TransportProfile::new(tls, "http://x.test", false, false).unwrap();
        let err = LiveClient.build_transport(&profile).unwrap_err();
        assert!(matches!(err, Error::Certificate(_, _)));
    }

    #[test]
    fn empty_ca_bundle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.pem");
        std::fs::write(&path, "not a certificate\n").unwrap();

        let tls = TlsFiles::new(Some(path), None, None);
        let profile = TransportProfile::new(tls, "http://x.test", false, false).unwrap();
        let err = LiveClient.build_transport(&profile).unwrap_err();
        assert!(err.to_string().ends_with("no certificates found"));
    }

    #[test]
    fn builds_plain_transport() {
        let profile = TransportProfile::new(TlsFiles::default(), "http://x.test", false, true)
            .unwrap();
        let transport = LiveClient.build_transport(&profile).unwrap();
        assert_eq!(transport.profile(), &profile);
    }
}
