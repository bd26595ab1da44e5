use crate::client::ClientError;
use crate::vfs::Operation;
use crate::vfs::path::PathName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("invalid access mode: more than one of O_RDONLY, O_WRONLY or O_RDWR set")]
    InvalidAccessMode,

    #[error("cannot create file: already a directory: {0}")]
    IsADirectory(PathName),

    #[error("cannot create dir, it is already a file: {0}")]
    NotADirectory(PathName),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("{0} is not supported")]
    Unsupported(Operation),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl FsError {
    /// True for the two "wrong kind of entry in the way" errors.
    pub fn is_conflict(&self) -> bool {
        matches!(self, FsError::IsADirectory(_) | FsError::NotADirectory(_))
    }

    pub fn as_errno(&self) -> i32 {
        match self {
            FsError::InvalidAccessMode => libc::EINVAL,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::AlreadyExists(_) => libc::EEXIST,
            FsError::Unsupported(_) => libc::ENOSYS,
            FsError::Client(e) => e.kind().as_errno(),
        }
    }
}

impl From<FsError> for std::io::Error {
    fn from(err: FsError) -> Self {
        std::io::Error::from_raw_os_error(err.as_errno())
    }
}

pub type FsResult<T> = Result<T, FsError>;
