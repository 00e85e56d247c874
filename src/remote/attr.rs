use std::{
    fs, io,
    os::unix::fs::{MetadataExt, PermissionsExt},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use russh_sftp::protocol::FileAttributes;

const S_IFMT: u32 = 0o170_000;
const S_IFDIR: u32 = 0o040_000;

/// A single entry of a remote directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub attrs: FileAttr,
}

/// Attributes of a remote file, as reported by a stat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttr {
    pub size: Option<u64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub permissions: Option<u32>,
    pub atime: Option<u32>,
    pub mtime: Option<u32>,
}

impl FileAttr {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.permissions
            .is_some_and(|mode| mode & S_IFMT == S_IFDIR)
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Modification time, when the remote reported one
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        self.mtime
            .map(|secs| UNIX_EPOCH + Duration::from_secs(u64::from(secs)))
    }
}

impl From<FileAttributes> for FileAttr {
    fn from(val: FileAttributes) -> Self {
        Self {
            size: val.size,
            uid: val.uid,
            gid: val.gid,
            permissions: val.permissions,
            atime: val.atime,
            mtime: val.mtime,
        }
    }
}

impl TryFrom<fs::Metadata> for FileAttr {
    type Error = io::Error;

    fn try_from(value: fs::Metadata) -> Result<Self, Self::Error> {
        let atime = u32::try_from(value.atime()).map_err(io::Error::other)?;
        let mtime = u32::try_from(value.mtime()).map_err(io::Error::other)?;

        Ok(Self {
            size: Some(value.len()),
            uid: Some(value.uid()),
            gid: Some(value.gid()),
            permissions: Some(value.permissions().mode()),
            atime: Some(atime),
            mtime: Some(mtime),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_bit_is_detected() {
        let dir = FileAttr {
            permissions: Some(0o040_755),
            ..Default::default()
        };
        let file = FileAttr {
            permissions: Some(0o100_644),
            ..Default::default()
        };

        assert!(dir.is_dir());
        assert!(!file.is_dir());
        assert!(!FileAttr::default().is_dir());
    }

    #[test]
    fn modified_is_seconds_since_epoch() {
        let attr = FileAttr {
            mtime: Some(784_111_777),
            ..Default::default()
        };

        assert_eq!(
            attr.modified(),
            Some(UNIX_EPOCH + Duration::from_secs(784_111_777))
        );
        assert_eq!(FileAttr::default().modified(), None);
    }
}
