//! 内存版远端客户端：用于本地开发/测试，记录每一次调用。

use super::{
    Attribute, BufferedFile, ClientError, ClientResult, Commit, DirEntry, ErrorKind,
    RemoteClient, RemoteFile,
};
use crate::vfs::path::{PathName, UserName};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Upper bound on link hops before a lookup gives up.
const MAX_LINK_HOPS: usize = 8;

#[derive(Clone, Debug)]
enum Node {
    File(Vec<u8>),
    Dir,
    Link(PathName),
}

/// One call received by `InMemoryClient`, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCall {
    Create(String),
    Open(String),
    Lookup { name: String, follow_links: bool },
    Put { name: String, len: usize },
    MakeDirectory(String),
}

impl ClientCall {
    /// Calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ClientCall::Create(_) | ClientCall::Put { .. } | ClientCall::MakeDirectory(_)
        )
    }
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    calls: Vec<ClientCall>,
}

// "alice/" 与 "alice" 指向同一个根目录
fn key_of(name: &str) -> &str {
    name.trim_end_matches('/')
}

impl State {
    fn check_parent(&self, op: &'static str, key: &str) -> ClientResult<()> {
        let Some((parent, _)) = key.rsplit_once('/') else {
            return Err(ClientError::new(ErrorKind::Invalid, op, key));
        };
        match self.nodes.get(parent) {
            Some(Node::Dir) => Ok(()),
            Some(_) => Err(ClientError::new(ErrorKind::NotDir, op, parent)),
            None => Err(ClientError::new(ErrorKind::NotFound, op, parent)),
        }
    }

    /// Find the node at `key`, chasing links when asked to.
    fn resolve(
        &self,
        op: &'static str,
        key: &str,
        follow_links: bool,
    ) -> ClientResult<(String, Node)> {
        let mut key = key.to_string();
        for _ in 0..MAX_LINK_HOPS {
            match self.nodes.get(&key) {
                None => return Err(ClientError::new(ErrorKind::NotFound, op, key)),
                Some(Node::Link(target)) if follow_links => {
                    key = key_of(target.as_str()).to_string();
                }
                Some(node) => return Ok((key, node.clone())),
            }
        }
        Err(ClientError::new(ErrorKind::Invalid, op, key))
    }

    fn store_file(&mut self, op: &'static str, key: &str, data: &[u8]) -> ClientResult<DirEntry> {
        self.check_parent(op, key)?;
        if let Some(Node::Dir) = self.nodes.get(key) {
            return Err(ClientError::new(ErrorKind::IsDir, op, key));
        }
        self.nodes.insert(key.to_string(), Node::File(data.to_vec()));
        Ok(entry_for(key, &Node::File(Vec::new()), data.len() as u64))
    }
}

fn entry_for(key: &str, node: &Node, size: u64) -> DirEntry {
    let (attr, link) = match node {
        Node::File(_) => (Attribute::File, None),
        Node::Dir => (Attribute::Directory, None),
        Node::Link(target) => (Attribute::Link, Some(target.clone())),
    };
    DirEntry {
        name: PathName::new(key),
        attr,
        link,
        size,
    }
}

/// In-process remote: every user-scoped name maps to a file, directory or link.
#[derive(Clone, Default)]
pub struct InMemoryClient {
    state: Arc<Mutex<State>>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root directory of `user`.
    pub async fn add_user(&self, user: &UserName) {
        let mut state = self.state.lock().await;
        state.nodes.insert(user.as_str().to_string(), Node::Dir);
    }

    /// Place a link at `name` pointing to `target`, which need not exist.
    pub async fn symlink(&self, name: &PathName, target: &PathName) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        let key = key_of(name.as_str());
        state.check_parent("symlink", key)?;
        state
            .nodes
            .insert(key.to_string(), Node::Link(target.clone()));
        Ok(())
    }

    /// Content of the file at `name`, if there is one.
    pub async fn contents(&self, name: &PathName) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        match state.nodes.get(key_of(name.as_str())) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub async fn is_dir(&self, name: &PathName) -> bool {
        let state = self.state.lock().await;
        matches!(state.nodes.get(key_of(name.as_str())), Some(Node::Dir))
    }

    pub async fn calls(&self) -> Vec<ClientCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn mutations(&self) -> Vec<ClientCall> {
        let state = self.state.lock().await;
        state
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

struct MemorySink {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Commit for MemorySink {
    async fn commit(&self, name: &PathName, data: &[u8]) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.store_file("close", key_of(name.as_str()), data)?;
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for InMemoryClient {
    async fn create(&self, name: &PathName) -> ClientResult<Box<dyn RemoteFile>> {
        let mut state = self.state.lock().await;
        state.calls.push(ClientCall::Create(name.to_string()));
        let key = key_of(name.as_str());
        state.check_parent("create", key)?;
        if let Ok((_, Node::Dir)) = state.resolve("create", key, true) {
            return Err(ClientError::new(ErrorKind::IsDir, "create", key));
        }
        let sink = MemorySink {
            state: self.state.clone(),
        };
        Ok(Box::new(BufferedFile::writer(name.clone(), sink)))
    }

    async fn open(&self, name: &PathName) -> ClientResult<Box<dyn RemoteFile>> {
        let mut state = self.state.lock().await;
        state.calls.push(ClientCall::Open(name.to_string()));
        let (key, node) = state.resolve("open", key_of(name.as_str()), true)?;
        match node {
            Node::File(data) => {
                let sink = MemorySink {
                    state: self.state.clone(),
                };
                Ok(Box::new(BufferedFile::reader(name.clone(), data, sink)))
            }
            Node::Dir => Err(ClientError::new(ErrorKind::IsDir, "open", key)),
            Node::Link(_) => Err(ClientError::new(ErrorKind::Invalid, "open", key)),
        }
    }

    async fn lookup(&self, name: &PathName, follow_links: bool) -> ClientResult<DirEntry> {
        let mut state = self.state.lock().await;
        state.calls.push(ClientCall::Lookup {
            name: name.to_string(),
            follow_links,
        });
        let (key, node) = state.resolve("lookup", key_of(name.as_str()), follow_links)?;
        let size = match &node {
            Node::File(data) => data.len() as u64,
            _ => 0,
        };
        Ok(entry_for(&key, &node, size))
    }

    async fn put(&self, name: &PathName, data: &[u8]) -> ClientResult<DirEntry> {
        let mut state = self.state.lock().await;
        state.calls.push(ClientCall::Put {
            name: name.to_string(),
            len: data.len(),
        });
        state.store_file("put", key_of(name.as_str()), data)
    }

    async fn make_directory(&self, name: &PathName) -> ClientResult<DirEntry> {
        let mut state = self.state.lock().await;
        state.calls.push(ClientCall::MakeDirectory(name.to_string()));
        let key = key_of(name.as_str());
        if state.nodes.contains_key(key) {
            return Err(ClientError::new(ErrorKind::Exists, "make_directory", key));
        }
        state.check_parent("make_directory", key)?;
        state.nodes.insert(key.to_string(), Node::Dir);
        Ok(entry_for(key, &Node::Dir, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_client_basic_ops() {
        let user = UserName::new("alice");
        let client = InMemoryClient::new();
        client.add_user(&user).await;

        let dir = PathName::for_user(&user, "docs");
        let entry = client.make_directory(&dir).await.unwrap();
        assert!(entry.is_dir());
        let err = client.make_directory(&dir).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exists);

        let missing = PathName::for_user(&user, "nope/x");
        let err = client.make_directory(&missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let file = PathName::for_user(&user, "docs/a.txt");
        client.put(&file, b"abc").await.unwrap();
        let entry = client.lookup(&file, true).await.unwrap();
        assert_eq!(entry.attr, Attribute::File);
        assert_eq!(entry.size, 3);

        let err = client.lookup(&missing, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_memory_client_links() {
        let user = UserName::new("alice");
        let client = InMemoryClient::new();
        client.add_user(&user).await;

        let target = PathName::for_user(&user, "real");
        let link = PathName::for_user(&user, "ln");
        client.symlink(&link, &target).await.unwrap();

        // dangling: following fails, not following sees the link itself
        let err = client.lookup(&link, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let entry = client.lookup(&link, false).await.unwrap();
        assert!(entry.is_link());
        assert_eq!(entry.link, Some(target.clone()));

        client.put(&target, b"x").await.unwrap();
        let entry = client.lookup(&link, true).await.unwrap();
        assert_eq!(entry.name, target);

        // a self loop gives up instead of spinning
        let looped = PathName::for_user(&user, "loop");
        client.symlink(&looped, &looped).await.unwrap();
        let err = client.lookup(&looped, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_memory_client_create_commits_on_close() {
        let user = UserName::new("alice");
        let client = InMemoryClient::new();
        client.add_user(&user).await;

        let name = PathName::for_user(&user, "f");
        let mut f = client.create(&name).await.unwrap();
        f.write(b"data").await.unwrap();
        assert_eq!(client.contents(&name).await, None);
        f.close().await.unwrap();
        assert_eq!(client.contents(&name).await.unwrap(), b"data");

        let mut r = client.open(&name).await.unwrap();
        let err = r.write(b"x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);

        assert_eq!(
            client.mutations().await,
            vec![ClientCall::Create("alice/f".into())]
        );
    }
}
