//! `UserFs`: the generic filesystem contract on top of a `RemoteClient`.
//!
//! Paths handed to `UserFs` are relative to the root of one user; each call
//! translates them into `PathName`s of the form `user/path` before talking to
//! the remote side.

use super::file::File;
use super::flags::{OpenFlags, OpenIntent};
use super::path::{self, PathName, SEPARATOR, UserName};
use super::subdir::SubdirFs;
use super::{Capabilities, Filesystem};
use crate::client::{DirEntry, ErrorKind, RemoteClient};
use crate::error::{FsError, FsResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

/// Permission bits are meaningless on the remote side.
pub const DIR_MODE: u32 = 0;

pub struct UserFs<C: RemoteClient> {
    client: Arc<C>,
    user: UserName,
}

impl<C: RemoteClient> Clone for UserFs<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            user: self.user.clone(),
        }
    }
}

impl<C: RemoteClient + 'static> UserFs<C> {
    pub fn new(client: Arc<C>, user: UserName) -> Self {
        Self { client, user }
    }

    pub fn user(&self) -> &UserName {
        &self.user
    }

    pub fn path_name(&self, path: &str) -> PathName {
        PathName::for_user(&self.user, path)
    }

    /// `Ok(None)` when nothing exists at `name`; every other failure is an error.
    async fn lookup(&self, name: &PathName, follow_links: bool) -> FsResult<Option<DirEntry>> {
        trace!(%name, follow_links, "lookup");
        match self.client.lookup(name, follow_links).await {
            Ok(entry) => Ok(Some(entry)),
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Ok(None),
                ErrorKind::Exists
                | ErrorKind::IsDir
                | ErrorKind::NotDir
                | ErrorKind::Permission
                | ErrorKind::Invalid
                | ErrorKind::Closed
                | ErrorKind::Io => Err(err.into()),
            },
        }
    }

    async fn exists(&self, name: &PathName, follow_links: bool) -> FsResult<bool> {
        Ok(self.lookup(name, follow_links).await?.is_some())
    }

    async fn is_dir(&self, name: &PathName, follow_links: bool) -> FsResult<bool> {
        Ok(self
            .lookup(name, follow_links)
            .await?
            .is_some_and(|entry| entry.is_dir()))
    }

    /// Make sure every directory above `path` exists.
    async fn create_sub_dirs(&self, path: &str) -> FsResult<()> {
        self.mkdir_all(path::parent(path), DIR_MODE).await
    }

    async fn create_with(&self, path: &str, follow_links: bool) -> FsResult<File> {
        let name = self.path_name(path);
        if self.is_dir(&name, follow_links).await? {
            return Err(FsError::IsADirectory(name));
        }

        self.create_sub_dirs(path).await?;

        let f = self.client.create(&name).await?;
        Ok(File::new(f, self.user.clone()))
    }

    async fn open_with(&self, path: &str, intent: &OpenIntent) -> FsResult<File> {
        let name = self.path_name(path);
        if intent.truncates_existing() {
            // 截断与打开是两次独立的远端调用
            debug!(%name, "truncating before open");
            self.client.put(&name, &[]).await?;
        }
        let f = self.client.open(&name).await?;
        Ok(File::new(f, self.user.clone()))
    }
}

#[async_trait]
impl<C: RemoteClient + 'static> Filesystem for UserFs<C> {
    async fn create(&self, path: &str) -> FsResult<File> {
        self.create_with(path, true).await
    }

    async fn open(&self, path: &str) -> FsResult<File> {
        let f = self.client.open(&self.path_name(path)).await?;
        Ok(File::new(f, self.user.clone()))
    }

    /// O_SYNC is ignored, and so is `mode`.
    async fn open_file(&self, path: &str, flags: OpenFlags, _mode: u32) -> FsResult<File> {
        let intent = OpenIntent::from_flags(flags)?;
        debug!(path, ?intent, "open_file");

        let f = if intent.create {
            if intent.exclusive && self.exists(&self.path_name(path), intent.follow_links).await? {
                return Err(FsError::AlreadyExists(path.to_string()));
            }
            self.create_with(path, intent.follow_links).await?
        } else {
            self.open_with(path, &intent).await?
        };

        Ok(f.with_append(intent.append))
    }

    async fn mkdir_all(&self, path: &str, _mode: u32) -> FsResult<()> {
        let mut prefix = String::with_capacity(path.len());
        for component in path.split(SEPARATOR).filter(|c| !c.is_empty()) {
            if !prefix.is_empty() {
                prefix.push(SEPARATOR);
            }
            prefix.push_str(component);

            let name = self.path_name(&prefix);
            match self.lookup(&name, true).await? {
                Some(entry) if entry.is_dir() => continue,
                Some(_) => return Err(FsError::NotADirectory(name)),
                None => {
                    debug!(%name, "make_directory");
                    self.client.make_directory(&name).await?;
                }
            }
        }
        Ok(())
    }

    async fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<File> {
        let base = format!("{prefix}{}", uuid::Uuid::new_v4().simple());
        let path = if dir.is_empty() {
            base
        } else {
            self.join(&[dir, base.as_str()])
        };
        self.open_file(
            &path,
            OpenFlags::RDWR | OpenFlags::CREATE | OpenFlags::EXCL,
            0o600,
        )
        .await
    }

    fn join(&self, elems: &[&str]) -> String {
        path::join(elems)
    }

    fn dir(&self, path: &str) -> FsResult<Box<dyn Filesystem>> {
        Ok(Box::new(SubdirFs::new(self.clone(), path)))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CREATE
            | Capabilities::OPEN
            | Capabilities::OPEN_FILE
            | Capabilities::MKDIR_ALL
            | Capabilities::TEMP_FILE
            | Capabilities::DIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::{ClientCall, InMemoryClient};
    use crate::vfs::Operation;

    async fn setup(user: &str) -> (Arc<InMemoryClient>, UserFs<InMemoryClient>) {
        let user = UserName::new(user);
        let client = Arc::new(InMemoryClient::new());
        client.add_user(&user).await;
        let fs = UserFs::new(client.clone(), user);
        (client, fs)
    }

    #[tokio::test]
    async fn test_create_makes_parent_dirs_in_order() {
        let (client, fs) = setup("alice").await;
        let mut f = fs.create("/a/b/c.txt").await.unwrap();
        assert_eq!(f.name(), "a/b/c.txt");
        f.close().await.unwrap();

        assert_eq!(
            client.mutations().await,
            vec![
                ClientCall::MakeDirectory("alice/a".into()),
                ClientCall::MakeDirectory("alice/a/b".into()),
                ClientCall::Create("alice/a/b/c.txt".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_over_directory_is_a_conflict() {
        let (client, fs) = setup("alice").await;
        fs.mkdir_all("d", DIR_MODE).await.unwrap();
        client.clear_calls().await;

        let err = fs.create("d").await.unwrap_err();
        assert!(matches!(err, FsError::IsADirectory(ref n) if n.as_str() == "alice/d"));
        assert!(err.is_conflict());
        assert!(client.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn test_mkdir_all_is_idempotent() {
        let (client, fs) = setup("alice").await;
        fs.mkdir_all("x/y/z", DIR_MODE).await.unwrap();
        let first = client.mutations().await;
        assert_eq!(first.len(), 3);

        fs.mkdir_all("x/y/z", DIR_MODE).await.unwrap();
        fs.mkdir_all("/x/y/", DIR_MODE).await.unwrap();
        assert_eq!(client.mutations().await, first);
        assert!(client.is_dir(&fs.path_name("x/y/z")).await);
    }

    #[tokio::test]
    async fn test_mkdir_all_stops_at_file() {
        let (client, fs) = setup("alice").await;
        fs.mkdir_all("p", DIR_MODE).await.unwrap();
        client.put(&fs.path_name("p/f"), b"data").await.unwrap();
        client.clear_calls().await;

        let err = fs.mkdir_all("p/f/g/h", DIR_MODE).await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory(ref n) if n.as_str() == "alice/p/f"));
        assert!(client.mutations().await.is_empty());
        assert!(!client.is_dir(&fs.path_name("p/f/g")).await);
    }

    #[tokio::test]
    async fn test_open_file_rejects_both_write_modes() {
        let (client, fs) = setup("alice").await;
        let err = fs
            .open_file("a", OpenFlags::WRONLY | OpenFlags::RDWR, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidAccessMode));
        assert!(client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_open_file_exclusive_on_existing() {
        let (client, fs) = setup("alice").await;
        client.put(&fs.path_name("e.txt"), b"keep").await.unwrap();
        client.clear_calls().await;

        let flags = OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::EXCL;
        let err = fs.open_file("e.txt", flags, 0o644).await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(ref p) if p == "e.txt"));
        assert!(client.mutations().await.is_empty());
        assert_eq!(client.contents(&fs.path_name("e.txt")).await.unwrap(), b"keep");

        // 存在性检查不跟随符号链接
        assert_eq!(
            client.calls().await,
            vec![ClientCall::Lookup {
                name: "alice/e.txt".into(),
                follow_links: false
            }]
        );
    }

    #[tokio::test]
    async fn test_open_file_exclusive_on_dangling_symlink() {
        let (client, fs) = setup("alice").await;
        client
            .symlink(&fs.path_name("ln"), &fs.path_name("missing"))
            .await
            .unwrap();

        let flags = OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::EXCL;
        let err = fs.open_file("ln", flags, 0).await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));

        // without O_EXCL the directory check follows the link to its missing target
        client.clear_calls().await;
        let mut f = fs
            .open_file("ln", OpenFlags::WRONLY | OpenFlags::CREATE, 0)
            .await
            .unwrap();
        f.close().await.unwrap();
        let calls = client.calls().await;
        assert_eq!(
            calls[0],
            ClientCall::Lookup {
                name: "alice/ln".into(),
                follow_links: true
            }
        );
        assert_eq!(calls.last(), Some(&ClientCall::Create("alice/ln".into())));
    }

    #[tokio::test]
    async fn test_open_file_exclusive_creates_new_file() {
        let (client, fs) = setup("alice").await;
        let flags = OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::EXCL | OpenFlags::APPEND;
        let mut f = fs.open_file("n/new.txt", flags, 0).await.unwrap();
        assert!(f.is_append());
        f.write(b"1").await.unwrap();
        f.close().await.unwrap();
        assert_eq!(client.contents(&fs.path_name("n/new.txt")).await.unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_open_file_truncate_empties_before_open() {
        let (client, fs) = setup("alice").await;
        let name = fs.path_name("t.txt");
        client.put(&name, b"old content").await.unwrap();
        client.clear_calls().await;

        let mut f = fs
            .open_file("t.txt", OpenFlags::RDWR | OpenFlags::TRUNC, 0)
            .await
            .unwrap();
        assert!(!f.is_append());
        assert_eq!(client.contents(&name).await.unwrap(), b"");
        assert_eq!(
            client.calls().await,
            vec![
                ClientCall::Put {
                    name: "alice/t.txt".into(),
                    len: 0
                },
                ClientCall::Open("alice/t.txt".into()),
            ]
        );
        let mut out = Vec::new();
        assert_eq!(f.read_to_end(&mut out).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_file_truncate_failure_skips_open() {
        let (client, fs) = setup("alice").await;
        fs.mkdir_all("d", DIR_MODE).await.unwrap();
        client.clear_calls().await;

        let err = fs
            .open_file("d", OpenFlags::WRONLY | OpenFlags::TRUNC, 0)
            .await
            .unwrap_err();
        match err {
            FsError::Client(e) => assert_eq!(e.kind(), ErrorKind::IsDir),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            client.calls().await,
            vec![ClientCall::Put {
                name: "alice/d".into(),
                len: 0
            }]
        );
    }

    #[tokio::test]
    async fn test_open_file_truncate_on_missing_file_leaves_it_empty() {
        let (client, fs) = setup("alice").await;
        let mut f = fs
            .open_file("fresh.txt", OpenFlags::WRONLY | OpenFlags::TRUNC, 0)
            .await
            .unwrap();
        let mut out = Vec::new();
        assert_eq!(f.read_to_end(&mut out).await.unwrap(), 0);
        assert_eq!(client.contents(&fs.path_name("fresh.txt")).await.unwrap(), b"");
    }

    #[tokio::test]
    async fn test_open_file_read_only_never_truncates() {
        let (client, fs) = setup("alice").await;
        let name = fs.path_name("r.txt");
        client.put(&name, b"abc").await.unwrap();

        let mut f = fs.open_file("r.txt", OpenFlags::TRUNC, 0).await.unwrap();
        let mut out = Vec::new();
        f.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_open_missing_passes_client_error_through() {
        let (_client, fs) = setup("alice").await;
        let err = fs.open("nope").await.unwrap_err();
        match err {
            FsError::Client(e) => {
                assert_eq!(e.kind(), ErrorKind::NotFound);
                assert_eq!(e.name(), "alice/nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_surface() {
        let (_client, fs) = setup("alice").await;
        assert!(matches!(
            fs.stat("a").await.unwrap_err(),
            FsError::Unsupported(Operation::Stat)
        ));
        assert!(matches!(
            fs.read_dir("").await.unwrap_err(),
            FsError::Unsupported(Operation::ReadDir)
        ));
        assert!(matches!(
            fs.rename("a", "b").await.unwrap_err(),
            FsError::Unsupported(Operation::Rename)
        ));
        assert!(matches!(
            fs.remove("a").await.unwrap_err(),
            FsError::Unsupported(Operation::Remove)
        ));
        assert!(matches!(
            fs.base().unwrap_err(),
            FsError::Unsupported(Operation::Base)
        ));

        assert_eq!(
            fs.capabilities(),
            Capabilities::CREATE
                | Capabilities::OPEN
                | Capabilities::OPEN_FILE
                | Capabilities::MKDIR_ALL
                | Capabilities::TEMP_FILE
                | Capabilities::DIR
        );
        assert!(fs.supports(Operation::OpenFile));
        assert!(!fs.supports(Operation::Stat));
        assert!(!fs.supports(Operation::Seek));
    }

    #[tokio::test]
    async fn test_temp_file_is_created_exclusively() {
        let (client, fs) = setup("alice").await;
        let mut f = fs.temp_file("tmp", "upload-").await.unwrap();
        assert!(f.name().starts_with("tmp/upload-"));
        f.write(b"x").await.unwrap();
        f.close().await.unwrap();

        let name = fs.path_name(f.name());
        assert_eq!(client.contents(&name).await.unwrap(), b"x");
        assert!(client.is_dir(&fs.path_name("tmp")).await);
    }

    #[test]
    fn test_join_is_verbatim() {
        let fs = UserFs::new(Arc::new(InMemoryClient::new()), UserName::new("u"));
        assert_eq!(fs.user().as_str(), "u");
        assert_eq!(fs.join(&["a", "b", "c"]), "a/b/c");
        assert_eq!(fs.join(&["a/", "b"]), "a//b");
    }
}
