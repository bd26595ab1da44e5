//! 本地文件目录后端：用本地目录树模拟远端（root/<user>/...）。

use super::{
    Attribute, BufferedFile, ClientError, ClientResult, Commit, DirEntry, ErrorKind,
    RemoteClient, RemoteFile,
};
use crate::vfs::path::{PathName, UserName};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct LocalFsClient {
    root: PathBuf,
}

fn map_io(op: &'static str, name: &PathName, err: io::Error) -> ClientError {
    let kind = match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => ErrorKind::Exists,
        io::ErrorKind::IsADirectory => ErrorKind::IsDir,
        io::ErrorKind::NotADirectory => ErrorKind::NotDir,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        io::ErrorKind::InvalidInput => ErrorKind::Invalid,
        _ => ErrorKind::Io,
    };
    ClientError::new(kind, op, name.as_str()).with_source(err)
}

impl LocalFsClient {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, name: &PathName) -> PathBuf {
        self.root.join(name.as_str().trim_start_matches('/'))
    }

    /// Create the root directory of `user` (and the backend root) if missing.
    pub async fn add_user(&self, user: &UserName) -> ClientResult<()> {
        let path = self.root.join(user.as_str());
        fs::create_dir_all(&path)
            .await
            .map_err(|e| map_io("add_user", &PathName::new(user.as_str()), e))
    }
}

struct LocalSink {
    path: PathBuf,
}

#[async_trait]
impl Commit for LocalSink {
    async fn commit(&self, name: &PathName, data: &[u8]) -> ClientResult<()> {
        fs::write(&self.path, data)
            .await
            .map_err(|e| map_io("close", name, e))
    }
}

#[async_trait]
impl RemoteClient for LocalFsClient {
    async fn create(&self, name: &PathName) -> ClientResult<Box<dyn RemoteFile>> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            let meta = fs::metadata(parent)
                .await
                .map_err(|e| map_io("create", name, e))?;
            if !meta.is_dir() {
                return Err(ClientError::new(ErrorKind::NotDir, "create", name.as_str()));
            }
        }
        if let Ok(meta) = fs::metadata(&path).await {
            if meta.is_dir() {
                return Err(ClientError::new(ErrorKind::IsDir, "create", name.as_str()));
            }
        }
        tracing::trace!(path = %path.display(), "create");
        Ok(Box::new(BufferedFile::writer(
            name.clone(),
            LocalSink { path },
        )))
    }

    async fn open(&self, name: &PathName) -> ClientResult<Box<dyn RemoteFile>> {
        let path = self.path_for(name);
        let data = fs::read(&path).await.map_err(|e| map_io("open", name, e))?;
        Ok(Box::new(BufferedFile::reader(
            name.clone(),
            data,
            LocalSink { path },
        )))
    }

    async fn lookup(&self, name: &PathName, follow_links: bool) -> ClientResult<DirEntry> {
        let path = self.path_for(name);
        let meta = if follow_links {
            fs::metadata(&path).await
        } else {
            fs::symlink_metadata(&path).await
        }
        .map_err(|e| map_io("lookup", name, e))?;

        let ft = meta.file_type();
        let (attr, link) = if ft.is_symlink() {
            let target = fs::read_link(&path)
                .await
                .map_err(|e| map_io("lookup", name, e))?;
            (
                Attribute::Link,
                Some(PathName::new(target.to_string_lossy().into_owned())),
            )
        } else if ft.is_dir() {
            (Attribute::Directory, None)
        } else {
            (Attribute::File, None)
        };
        Ok(DirEntry {
            name: name.clone(),
            attr,
            link,
            size: meta.len(),
        })
    }

    async fn put(&self, name: &PathName, data: &[u8]) -> ClientResult<DirEntry> {
        let path = self.path_for(name);
        fs::write(&path, data)
            .await
            .map_err(|e| map_io("put", name, e))?;
        Ok(DirEntry {
            name: name.clone(),
            attr: Attribute::File,
            link: None,
            size: data.len() as u64,
        })
    }

    async fn make_directory(&self, name: &PathName) -> ClientResult<DirEntry> {
        let path = self.path_for(name);
        fs::create_dir(&path)
            .await
            .map_err(|e| map_io("make_directory", name, e))?;
        Ok(DirEntry {
            name: name.clone(),
            attr: Attribute::Directory,
            link: None,
            size: 0,
        })
    }
}
