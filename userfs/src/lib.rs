//! userfs: expose a user-namespaced remote storage client through a generic
//! filesystem interface.
//!
//! A `UserFs` is built from a `RemoteClient` and the name of the user whose
//! tree it serves; tools then use it through the `Filesystem` trait with plain
//! relative paths and POSIX open flags.

pub mod client;
pub mod error;
pub mod vfs;

pub use client::{ClientError, DirEntry, ErrorKind, RemoteClient, RemoteFile};
pub use error::{FsError, FsResult};
pub use vfs::file::File;
pub use vfs::flags::OpenFlags;
pub use vfs::fs::UserFs;
pub use vfs::path::{PathName, UserName};
pub use vfs::{Capabilities, Filesystem, Operation};
