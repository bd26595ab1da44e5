//! File handle wrapper: plain delegation to the remote handle.

use super::Operation;
use super::path::UserName;
use crate::client::RemoteFile;
use crate::error::{FsError, FsResult};
use std::io::SeekFrom;

pub struct File {
    inner: Box<dyn RemoteFile>,
    user: UserName,
    append: bool,
    closed: bool,
}

impl File {
    pub fn new(inner: Box<dyn RemoteFile>, user: UserName) -> Self {
        Self {
            inner,
            user,
            append: false,
            closed: false,
        }
    }

    pub(crate) fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Name relative to the user's root, without the user prefix.
    pub fn name(&self) -> &str {
        self.inner.name().strip_user(&self.user)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the file was opened with O_APPEND.
    pub fn is_append(&self) -> bool {
        self.append
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        Ok(self.inner.read(buf).await?)
    }

    pub async fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        Ok(self.inner.write(buf).await?)
    }

    /// Remote files are sequential; seeking always fails.
    pub async fn seek(&mut self, _pos: SeekFrom) -> FsResult<u64> {
        Err(FsError::Unsupported(Operation::Seek))
    }

    /// Marks the handle closed and closes the remote file. Calling it again
    /// still reaches the remote, which decides what a second close means.
    pub async fn close(&mut self) -> FsResult<()> {
        self.closed = true;
        Ok(self.inner.close().await?)
    }

    /// Read until end of file.
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> FsResult<usize> {
        let mut buf = [0u8; 8192];
        let mut total = 0;
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&buf[..n]);
            total += n;
        }
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("name", &self.inner.name())
            .field("append", &self.append)
            .field("closed", &self.closed)
            .finish()
    }
}
