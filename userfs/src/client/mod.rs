//! Remote storage client seam (client)
//!
//! The adapter never talks to the storage network directly; it is handed a
//! `RemoteClient` at construction and only issues the five calls below.
//!
//! Submodules:
//! - `memory`: in-process client keeping a call log, used by tests and demos
//! - `localfs`: client emulated on top of a local directory tree
//!
//! Responsibilities summary:
//! - Define the async API for create/open/lookup/put/make-directory keyed by a
//!   user-scoped `PathName`.
//! - Report failures through `ClientError` with a structured `ErrorKind`, so
//!   callers can tell "does not exist" apart from every other failure.
pub mod localfs;
pub mod memory;

use crate::vfs::path::PathName;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Kind of an entry stored by the remote directory service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    File,
    Directory,
    Link,
}

/// Metadata returned by `lookup`, `put` and `make_directory`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: PathName,
    pub attr: Attribute,
    /// Target of a link entry.
    pub link: Option<PathName>,
    pub size: u64,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.attr == Attribute::Directory
    }

    pub fn is_link(&self) -> bool {
        self.attr == Attribute::Link
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Exists,
    IsDir,
    NotDir,
    Permission,
    Invalid,
    Closed,
    Io,
}

impl ErrorKind {
    pub fn as_errno(self) -> i32 {
        match self {
            ErrorKind::NotFound => libc::ENOENT,
            ErrorKind::Exists => libc::EEXIST,
            ErrorKind::IsDir => libc::EISDIR,
            ErrorKind::NotDir => libc::ENOTDIR,
            ErrorKind::Permission => libc::EPERM,
            ErrorKind::Invalid => libc::EINVAL,
            ErrorKind::Closed => libc::EBADF,
            ErrorKind::Io => libc::EIO,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ErrorKind::NotFound => "item does not exist",
            ErrorKind::Exists => "item already exists",
            ErrorKind::IsDir => "item is a directory",
            ErrorKind::NotDir => "item is not a directory",
            ErrorKind::Permission => "permission denied",
            ErrorKind::Invalid => "invalid operation",
            ErrorKind::Closed => "file already closed",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(msg)
    }
}

/// Error reported by a remote client.
#[derive(Debug, Error)]
#[error("{op} {name}: {kind}")]
pub struct ClientError {
    kind: ErrorKind,
    op: &'static str,
    name: String,
    #[source]
    source: Option<std::io::Error>,
}

impl ClientError {
    pub fn new(kind: ErrorKind, op: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            op,
            name: name.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: std::io::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// An open file on the remote side.
#[async_trait]
pub trait RemoteFile: Send + Sync {
    /// Full user-scoped name of the file.
    fn name(&self) -> &PathName;

    async fn read(&mut self, buf: &mut [u8]) -> ClientResult<usize>;

    async fn write(&mut self, buf: &[u8]) -> ClientResult<usize>;

    async fn close(&mut self) -> ClientResult<()>;
}

/// The remote storage client consumed by the adapter.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Start a new file; its content becomes visible when the file is closed.
    async fn create(&self, name: &PathName) -> ClientResult<Box<dyn RemoteFile>>;

    async fn open(&self, name: &PathName) -> ClientResult<Box<dyn RemoteFile>>;

    async fn lookup(&self, name: &PathName, follow_links: bool) -> ClientResult<DirEntry>;

    /// Replace the whole content of `name` with `data`.
    async fn put(&self, name: &PathName, data: &[u8]) -> ClientResult<DirEntry>;

    async fn make_directory(&self, name: &PathName) -> ClientResult<DirEntry>;
}

/// Destination of a `BufferedFile` opened for writing.
#[async_trait]
pub(crate) trait Commit: Send + Sync {
    async fn commit(&self, name: &PathName, data: &[u8]) -> ClientResult<()>;
}

enum Mode {
    Read { data: Vec<u8>, pos: usize },
    Write { buf: Vec<u8> },
}

/// File handle shared by the bundled clients: reads serve a snapshot taken at
/// open time, writes are buffered and committed on close.
pub(crate) struct BufferedFile<C: Commit> {
    name: PathName,
    mode: Mode,
    sink: C,
    closed: bool,
}

impl<C: Commit> BufferedFile<C> {
    pub(crate) fn reader(name: PathName, data: Vec<u8>, sink: C) -> Self {
        Self {
            name,
            mode: Mode::Read { data, pos: 0 },
            sink,
            closed: false,
        }
    }

    pub(crate) fn writer(name: PathName, sink: C) -> Self {
        Self {
            name,
            mode: Mode::Write { buf: Vec::new() },
            sink,
            closed: false,
        }
    }

    fn check_open(&self, op: &'static str) -> ClientResult<()> {
        if self.closed {
            return Err(ClientError::new(ErrorKind::Closed, op, self.name.as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Commit> RemoteFile for BufferedFile<C> {
    fn name(&self) -> &PathName {
        &self.name
    }

    async fn read(&mut self, buf: &mut [u8]) -> ClientResult<usize> {
        self.check_open("read")?;
        match &mut self.mode {
            Mode::Read { data, pos } => {
                let n = buf.len().min(data.len() - *pos);
                buf[..n].copy_from_slice(&data[*pos..*pos + n]);
                *pos += n;
                Ok(n)
            }
            Mode::Write { .. } => Err(ClientError::new(
                ErrorKind::Permission,
                "read",
                self.name.as_str(),
            )),
        }
    }

    async fn write(&mut self, data: &[u8]) -> ClientResult<usize> {
        self.check_open("write")?;
        match &mut self.mode {
            Mode::Write { buf } => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
            Mode::Read { .. } => Err(ClientError::new(
                ErrorKind::Permission,
                "write",
                self.name.as_str(),
            )),
        }
    }

    async fn close(&mut self) -> ClientResult<()> {
        self.check_open("close")?;
        self.closed = true;
        match &mut self.mode {
            Mode::Write { buf } => {
                let data = std::mem::take(buf);
                self.sink.commit(&self.name, &data).await
            }
            Mode::Read { data, .. } => {
                data.clear();
                Ok(())
            }
        }
    }
}
