//! User-scoped path names.
//!
//! Every name on the remote network starts with the owning user, e.g.
//! `alice@example.com/docs/a.txt`. The adapter works with paths relative to
//! that user's root and translates them on every call.

use std::fmt;

/// Separator between the user name and the path, and between path elements.
pub const SEPARATOR: char = '/';

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserName(String);

impl UserName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified remote name: user name, separator, path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathName(String);

impl PathName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Translate `path`, relative to the root of `user`, into a remote name.
    ///
    /// Exactly one separator ends up between the user and the path whether or
    /// not `path` already starts with one. Nothing else is checked here;
    /// empty elements and `..` are left to the remote side.
    pub fn for_user(user: &UserName, path: &str) -> Self {
        let mut name = String::with_capacity(user.0.len() + path.len() + 1);
        name.push_str(&user.0);
        if !path.starts_with(SEPARATOR) {
            name.push(SEPARATOR);
        }
        name.push_str(path);
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after `user` and the separator, or the whole name if it is
    /// not owned by `user`.
    pub fn strip_user<'a>(&'a self, user: &UserName) -> &'a str {
        self.0
            .strip_prefix(user.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for PathName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Join path elements with the separator, verbatim.
pub fn join(elems: &[&str]) -> String {
    elems.join("/")
}

/// Everything before the last separator; empty when there is none.
pub fn parent(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(i) => &path[..i],
        None => "",
    }
}
