//! VFS layer (generic filesystem adapter)
//!
//! Responsibilities:
//! - Define the generic `Filesystem` contract tools are written against.
//! - Translate relative paths into user-scoped remote names and POSIX open
//!   flags into remote create/open/put calls.
//! - Wrap remote handles so they look like ordinary files.
//!
//! Submodules:
//! - `path`: user and path name types, translation helpers
//! - `flags`: open(2) flag decoding into a per-call `OpenIntent`
//! - `file`: file handle wrapper
//! - `fs`: `UserFs`, the adapter over a `RemoteClient`
//! - `subdir`: filesystem view rooted at a subdirectory
pub mod file;
pub mod flags;
pub mod fs;
pub mod path;
pub mod subdir;

use crate::error::{FsError, FsResult};
use async_trait::async_trait;
use bitflags::bitflags;
use file::File;
use flags::OpenFlags;
use std::fmt;

/// Members of the filesystem contract, named in `Unsupported` errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Open,
    OpenFile,
    Stat,
    ReadDir,
    MkdirAll,
    TempFile,
    Rename,
    Remove,
    Dir,
    Base,
    Seek,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Open => "open",
            Operation::OpenFile => "open_file",
            Operation::Stat => "stat",
            Operation::ReadDir => "read_dir",
            Operation::MkdirAll => "mkdir_all",
            Operation::TempFile => "temp_file",
            Operation::Rename => "rename",
            Operation::Remove => "remove",
            Operation::Dir => "dir",
            Operation::Base => "base",
            Operation::Seek => "seek",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Operations a `Filesystem` implementation actually supports.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const CREATE = 1 << 0;
        const OPEN = 1 << 1;
        const OPEN_FILE = 1 << 2;
        const STAT = 1 << 3;
        const READ_DIR = 1 << 4;
        const MKDIR_ALL = 1 << 5;
        const TEMP_FILE = 1 << 6;
        const RENAME = 1 << 7;
        const REMOVE = 1 << 8;
        const DIR = 1 << 9;
        const BASE = 1 << 10;
        const SEEK = 1 << 11;
    }
}

impl From<Operation> for Capabilities {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Create => Capabilities::CREATE,
            Operation::Open => Capabilities::OPEN,
            Operation::OpenFile => Capabilities::OPEN_FILE,
            Operation::Stat => Capabilities::STAT,
            Operation::ReadDir => Capabilities::READ_DIR,
            Operation::MkdirAll => Capabilities::MKDIR_ALL,
            Operation::TempFile => Capabilities::TEMP_FILE,
            Operation::Rename => Capabilities::RENAME,
            Operation::Remove => Capabilities::REMOVE,
            Operation::Dir => Capabilities::DIR,
            Operation::Base => Capabilities::BASE,
            Operation::Seek => Capabilities::SEEK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// The generic filesystem contract.
///
/// Members without a body in an implementation fail with
/// `FsError::Unsupported`; `capabilities` tells callers up front which ones
/// those are.
#[async_trait]
pub trait Filesystem: Send + Sync {
    async fn create(&self, path: &str) -> FsResult<File>;

    async fn open(&self, path: &str) -> FsResult<File>;

    /// Open with POSIX `flags`; `mode` is advisory.
    async fn open_file(&self, path: &str, flags: OpenFlags, mode: u32) -> FsResult<File>;

    async fn stat(&self, _path: &str) -> FsResult<FileInfo> {
        Err(FsError::Unsupported(Operation::Stat))
    }

    async fn read_dir(&self, _path: &str) -> FsResult<Vec<FileInfo>> {
        Err(FsError::Unsupported(Operation::ReadDir))
    }

    async fn mkdir_all(&self, path: &str, mode: u32) -> FsResult<()>;

    async fn temp_file(&self, _dir: &str, _prefix: &str) -> FsResult<File> {
        Err(FsError::Unsupported(Operation::TempFile))
    }

    async fn rename(&self, _from: &str, _to: &str) -> FsResult<()> {
        Err(FsError::Unsupported(Operation::Rename))
    }

    async fn remove(&self, _path: &str) -> FsResult<()> {
        Err(FsError::Unsupported(Operation::Remove))
    }

    fn join(&self, elems: &[&str]) -> String;

    /// A filesystem whose root is `path` inside this one.
    fn dir(&self, _path: &str) -> FsResult<Box<dyn Filesystem>> {
        Err(FsError::Unsupported(Operation::Dir))
    }

    fn base(&self) -> FsResult<&str> {
        Err(FsError::Unsupported(Operation::Base))
    }

    fn capabilities(&self) -> Capabilities;

    fn supports(&self, op: Operation) -> bool {
        self.capabilities().contains(op.into())
    }
}
