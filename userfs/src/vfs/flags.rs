use crate::error::{FsError, FsResult};
use bitflags::bitflags;

bitflags! {
    /// POSIX open(2) flags understood by `open_file`.
    ///
    /// `O_RDONLY` is zero and therefore has no bit of its own; the access mode
    /// is read from the `O_ACCMODE` bits by `AccessMode::from_flags`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpenFlags: i32 {
        const WRONLY = libc::O_WRONLY;
        const RDWR = libc::O_RDWR;
        const CREATE = libc::O_CREAT;
        const EXCL = libc::O_EXCL;
        const TRUNC = libc::O_TRUNC;
        const APPEND = libc::O_APPEND;
        /// Accepted and ignored.
        const SYNC = libc::O_SYNC;
    }
}

impl OpenFlags {
    pub const RDONLY: Self = Self::empty();

    /// Keep every bit, including ones this type has no name for.
    pub fn from_raw(flags: i32) -> Self {
        Self::from_bits_retain(flags)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    /// Fails when both write bits are set at once.
    pub fn from_flags(flags: OpenFlags) -> FsResult<Self> {
        match flags.bits() & libc::O_ACCMODE {
            libc::O_RDONLY => Ok(AccessMode::ReadOnly),
            libc::O_WRONLY => Ok(AccessMode::WriteOnly),
            libc::O_RDWR => Ok(AccessMode::ReadWrite),
            _ => Err(FsError::InvalidAccessMode),
        }
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

/// Everything one `open_file` call decided from its flags.
///
/// Built per call and passed down the open pipeline, so concurrent opens on a
/// shared filesystem never observe each other's append or link settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenIntent {
    pub access: AccessMode,
    pub create: bool,
    pub exclusive: bool,
    pub truncate: bool,
    pub append: bool,
    /// From open(2): with O_CREAT and O_EXCL, symbolic links are not
    /// followed; if the path is a symlink the open fails wherever it points.
    pub follow_links: bool,
}

impl OpenIntent {
    pub fn from_flags(flags: OpenFlags) -> FsResult<Self> {
        let access = AccessMode::from_flags(flags)?;
        let create = flags.contains(OpenFlags::CREATE);
        let exclusive = create && flags.contains(OpenFlags::EXCL);
        Ok(Self {
            access,
            create,
            exclusive,
            truncate: flags.contains(OpenFlags::TRUNC),
            append: flags.contains(OpenFlags::APPEND),
            follow_links: !exclusive,
        })
    }

    /// Whether the existing content must be dropped before opening.
    pub fn truncates_existing(&self) -> bool {
        !self.create && self.truncate && self.access.can_write()
    }
}
