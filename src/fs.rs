//! Access to the files read by import and written by export.
//!
//! The request executor never touches the disk directly. It goes through
//! the [`Filesystem`] trait so that archives can be kept in memory while
//! testing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::{error, fmt};


//------------ Filesystem ----------------------------------------------------

/// The file operations needed by the request executor.
pub trait Filesystem {
    /// Opens an existing file for reading.
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError>;

    /// Creates a file for writing, truncating it if it exists.
    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>, FsError>;

    /// Removes a file.
    fn remove(&self, path: &Path) -> Result<(), FsError>;
}


//------------ LocalFs -------------------------------------------------------

/// The local disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        let file = File::open(path).map_err(|e| FsError::open(path, e))?;
        Ok(Box::new(file))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>, FsError> {
        let file = File::create(path).map_err(|e| FsError::create(path, e))?;
        Ok(Box::new(file))
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        std::fs::remove_file(path).map_err(|e| FsError::remove(path, e))
    }
}


//------------ MemoryFs ------------------------------------------------------

/// A filesystem that keeps all files in memory.
///
/// Clones share the same files, so a test can keep a handle around and
/// inspect what the code under test wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryFs {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    read_only: bool,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filesystem on which every create and remove fails.
    pub fn read_only() -> Self {
        MemoryFs { files: Default::default(), read_only: true }
    }

    /// Adds a file with the given content.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.lock().insert(path.into(), content.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Returns a copy of the current content of a file.
    pub fn content(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn permission_denied() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "operation not permitted")
    }
}

impl Filesystem for MemoryFs {
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        match self.content(path) {
            Some(content) => Ok(Box::new(io::Cursor::new(content))),
            None => Err(FsError::open(path, io::ErrorKind::NotFound.into())),
        }
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>, FsError> {
        if self.read_only {
            return Err(FsError::create(path, Self::permission_denied()));
        }
        self.lock().insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryFile { fs: self.clone(), path: path.to_path_buf() }))
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        if self.read_only {
            return Err(FsError::remove(path, Self::permission_denied()));
        }
        match self.lock().remove(path) {
            Some(_) => Ok(()),
            None => Err(FsError::remove(path, io::ErrorKind::NotFound.into())),
        }
    }
}


//------------ MemoryFile ----------------------------------------------------

/// A file of a [`MemoryFs`] opened for writing.
///
/// Writes go straight into the shared map, so a partially written file is
/// visible just like on disk.
struct MemoryFile {
    fs: MemoryFs,
    path: PathBuf,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.fs.lock().get_mut(&self.path) {
            Some(content) => {
                content.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}


//------------ FsError -------------------------------------------------------

/// The file operation that failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FsOp {
    Open,
    Create,
    Remove,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            FsOp::Open => "open",
            FsOp::Create => "create",
            FsOp::Remove => "remove",
        })
    }
}

/// A failed file operation.
#[derive(Debug)]
pub struct FsError {
    op: FsOp,
    path: PathBuf,
    cause: io::Error,
}

impl FsError {
    pub fn open(path: &Path, cause: io::Error) -> Self {
        FsError { op: FsOp::Open, path: path.to_path_buf(), cause }
    }

    pub fn create(path: &Path, cause: io::Error) -> Self {
        FsError { op: FsOp::Create, path: path.to_path_buf(), cause }
    }

    pub fn remove(path: &Path, cause: io::Error) -> Self {
        FsError { op: FsOp::Remove, path: path.to_path_buf(), cause }
    }

    pub fn op(&self) -> FsOp {
        self.op
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.cause.kind()
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}: ", self.op, self.path.display())?;
        match self.cause.kind() {
            io::ErrorKind::NotFound => f.write_str("file does not exist"),
            io::ErrorKind::PermissionDenied => f.write_str("operation not permitted"),
            _ => self.cause.fmt(f),
        }
    }
}

impl error::Error for FsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.cause)
    }
}


//------------ Tests ---------------------------------------------------------
