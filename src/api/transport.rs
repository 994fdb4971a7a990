//! Validated connection settings for a single server.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::config::Config;
use super::Error;


//------------ Scheme --------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn from_url(url: &Url) -> Result<Self, Error> {
        match url.scheme() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(Error::InvalidScheme(title_case(other))),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        })
    }
}

/// Upper cases the first letter of every word.
fn title_case(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start {
            res.extend(c.to_uppercase());
        } else {
            res.push(c);
        }
        word_start = !(c.is_alphanumeric() || c == '_');
    }
    res
}


//------------ TlsFiles ------------------------------------------------------

/// The TLS material to use for a connection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TlsFiles {
    pub cacert: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

impl TlsFiles {
    pub fn new(
        cacert: Option<PathBuf>,
        cert: Option<PathBuf>,
        key: Option<PathBuf>,
    ) -> Self {
        let given = |path: Option<PathBuf>| path.filter(|p| !p.as_os_str().is_empty());
        TlsFiles { cacert: given(cacert), cert: given(cert), key: given(key) }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cacert.clone(), config.cert.clone(), config.key.clone())
    }

    /// Returns the client certificate and key if both are present.
    pub fn identity(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.cert.as_ref().zip(self.key.as_ref())
    }
}


//------------ TransportProfile ----------------------------------------------

/// Everything needed to build a transport for one server URL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportProfile {
    url: Url,
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: String,
    tls: TlsFiles,
    token_present: bool,
    verbose: bool,
}

impl TransportProfile {
    /// Validates the URL and the authentication material.
    ///
    /// An `https` URL requires either a token or both a client certificate
    /// and key.
    pub fn new(
        tls: TlsFiles,
        url: &str,
        token_present: bool,
        verbose: bool,
    ) -> Result<Self, Error> {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Err(Error::InvalidScheme(String::new()))
            }
            Err(e) => return Err(Error::UrlParse(url.to_string(), e)),
        };

        let scheme = Scheme::from_url(&url)?;

        if scheme == Scheme::Https && !token_present && tls.identity().is_none() {
            return Err(Error::MissingAuthentication);
        }

        let host = url.host_str().unwrap_or_default().to_string();
        let port = url.port_or_known_default().unwrap_or(match scheme {
            Scheme::Http => 80,
            Scheme::Https => 443,
        });
        let base_path = url.path().trim_end_matches('/').to_string();

        Ok(TransportProfile {
            url,
            scheme,
            host,
            port,
            base_path,
            tls,
            token_present,
            verbose,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The path prefix for all endpoints, without a trailing slash.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn tls(&self) -> &TlsFiles {
        &self.tls
    }

    pub fn token_present(&self) -> bool {
        self.token_present
    }

    /// Whether the connection should log what goes over the wire.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The full URL of an endpoint on this server.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        url.set_path(&format!("{}{}", self.base_path, path));
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

impl fmt::Display for TransportProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.base_path)
    }
}


//------------ Tests ---------------------------------------------------------
