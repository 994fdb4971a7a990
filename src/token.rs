//! Reading the RBAC token used to authenticate against PuppetDB.

use std::path::{Path, PathBuf};
use std::{error, fmt, fs, io};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::config;


//------------ Token ---------------------------------------------------------

/// An authentication token.
///
/// The token is sent as is in the `X-Authentication` header. An empty token
/// is used when none could be read, leaving it to the server to decide
/// whether the request needs one.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Token(String);

impl Token {
    pub fn empty() -> Self {
        Token(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}


//------------ TokenSource ---------------------------------------------------

/// Something a token can be read from.
pub trait TokenSource {
    fn read(&self) -> Result<Token, TokenError>;
}

/// A fixed token always reads as itself.
impl TokenSource for Token {
    fn read(&self) -> Result<Token, TokenError> {
        Ok(self.clone())
    }
}


//------------ TokenFile -----------------------------------------------------

/// A token stored in a file.
#[derive(Clone, Debug, Default)]
pub struct TokenFile {
    path: Option<PathBuf>,
}

impl TokenFile {
    /// Creates a token file for the given path.
    ///
    /// If no path is given, the per-user default `~/.puppetlabs/token` is
    /// read instead.
    pub fn new(path: Option<PathBuf>) -> Self {
        TokenFile { path }
    }

    fn path(&self) -> Result<PathBuf, TokenError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => config::default_token_path().ok_or(TokenError::NoHomeDir),
        }
    }
}

impl TokenSource for TokenFile {
    fn read(&self) -> Result<Token, TokenError> {
        let path = self.path()?;
        let content = fs::read_to_string(&path).map_err(|e| TokenError::io(&path, e))?;
        let token = content.trim_end_matches(['\r', '\n']);

        if is_valid(token) {
            Ok(Token::from(token))
        } else {
            Err(TokenError::Invalid(token.to_string()))
        }
    }
}

lazy_static! {
    static ref JWT_SHAPE: Regex = Regex::new(
        r"[A-Za-z0-9_-]{4,}\.[A-Za-z0-9_-]{4,}\.[A-Za-z0-9_-]{4,}"
    ).unwrap();
    static ref TOKEN_SHAPE: Regex = Regex::new(r"[A-Za-z0-9_-]+").unwrap();
}

/// Checks that the token contains something that looks like a token.
///
/// The shapes are searched for anywhere in the content, so padding and
/// separators around them are accepted.
fn is_valid(token: &str) -> bool {
    if JWT_SHAPE.is_match(token) {
        debug!("Token is in JWT format");
        true
    } else if TOKEN_SHAPE.is_match(token) {
        debug!("Token format is valid");
        true
    } else {
        false
    }
}


//------------ TokenError ----------------------------------------------------

#[derive(Debug)]
pub enum TokenError {
    Io(PathBuf, io::Error),
    Invalid(String),
    NoHomeDir,
}

impl TokenError {
    fn io(path: &Path, e: io::Error) -> Self {
        TokenError::Io(path.to_path_buf(), e)
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Io(path, e) => {
                write!(f, "Cannot read token file '{}': {}", path.display(), e)
            }
            TokenError::Invalid(token) => write!(f, "Token {} is invalid", token),
            TokenError::NoHomeDir => {
                f.write_str("Cannot determine the default token path: no home directory")
            }
        }
    }
}

impl error::Error for TokenError {}


//------------ Tests ---------------------------------------------------------
