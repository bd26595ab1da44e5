//! Filesystem view rooted at a subdirectory of another filesystem.

use super::file::File;
use super::flags::OpenFlags;
use super::path::SEPARATOR;
use super::{Capabilities, FileInfo, Filesystem};
use crate::error::FsResult;
use async_trait::async_trait;

#[derive(Clone)]
pub struct SubdirFs<F> {
    underlying: F,
    base: String,
}

impl<F: Filesystem + Clone + 'static> SubdirFs<F> {
    pub fn new(underlying: F, base: &str) -> Self {
        Self {
            underlying,
            base: base.trim_end_matches(SEPARATOR).to_string(),
        }
    }

    fn underlying_path(&self, path: &str) -> String {
        let path = path.trim_start_matches(SEPARATOR);
        if self.base.is_empty() {
            return path.to_string();
        }
        if path.is_empty() {
            return self.base.clone();
        }
        self.underlying.join(&[self.base.as_str(), path])
    }
}

#[async_trait]
impl<F: Filesystem + Clone + 'static> Filesystem for SubdirFs<F> {
    async fn create(&self, path: &str) -> FsResult<File> {
        self.underlying.create(&self.underlying_path(path)).await
    }

    async fn open(&self, path: &str) -> FsResult<File> {
        self.underlying.open(&self.underlying_path(path)).await
    }

    async fn open_file(&self, path: &str, flags: OpenFlags, mode: u32) -> FsResult<File> {
        self.underlying
            .open_file(&self.underlying_path(path), flags, mode)
            .await
    }

    async fn stat(&self, path: &str) -> FsResult<FileInfo> {
        self.underlying.stat(&self.underlying_path(path)).await
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        self.underlying.read_dir(&self.underlying_path(path)).await
    }

    async fn mkdir_all(&self, path: &str, mode: u32) -> FsResult<()> {
        self.underlying
            .mkdir_all(&self.underlying_path(path), mode)
            .await
    }

    async fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<File> {
        self.underlying
            .temp_file(&self.underlying_path(dir), prefix)
            .await
    }

    async fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        self.underlying
            .rename(&self.underlying_path(from), &self.underlying_path(to))
            .await
    }

    async fn remove(&self, path: &str) -> FsResult<()> {
        self.underlying.remove(&self.underlying_path(path)).await
    }

    fn join(&self, elems: &[&str]) -> String {
        self.underlying.join(elems)
    }

    fn dir(&self, path: &str) -> FsResult<Box<dyn Filesystem>> {
        Ok(Box::new(SubdirFs::new(
            self.underlying.clone(),
            &self.underlying_path(path),
        )))
    }

    fn base(&self) -> FsResult<&str> {
        Ok(&self.base)
    }

    fn capabilities(&self) -> Capabilities {
        self.underlying.capabilities() | Capabilities::DIR | Capabilities::BASE
    }
}
