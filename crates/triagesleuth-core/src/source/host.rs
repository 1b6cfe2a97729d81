/// Host filesystem source: a mounted directory tree read through `std::fs`.
///
/// Symlinks are never followed; a link is reported as a file with its own
/// metadata. Children are listed in byte order of their names so repeated
/// runs produce the same record order.
use crate::error::NodeError;
use crate::model::{no_children, BoxedNode, ChildIter, NodeKind, RawMetadata, RawName, TreeNode};
use std::fs::{self, File, Metadata};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub struct HostNode {
    path: PathBuf,
    name: Option<RawName>,
    meta: Option<Metadata>,
}

impl HostNode {
    /// Stat `path` without following a final symlink.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let meta = fs::symlink_metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            name: path.file_name().map(raw_name),
            meta: Some(meta),
        })
    }

    fn from_entry(entry: &fs::DirEntry) -> Self {
        // A failed stat leaves a named node without metadata: not emitted,
        // still a leaf.
        Self {
            path: entry.path(),
            name: Some(raw_name(&entry.file_name())),
            meta: entry.metadata().ok(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn raw_name(name: &std::ffi::OsStr) -> RawName {
    use std::os::unix::ffi::OsStrExt;
    RawName::Bytes(name.as_bytes().to_vec())
}

#[cfg(not(unix))]
fn raw_name(name: &std::ffi::OsStr) -> RawName {
    RawName::Text(compact_str::CompactString::new(name.to_string_lossy()))
}

fn seconds(time: std::io::Result<std::time::SystemTime>) -> Option<i64> {
    time.ok().map(RawMetadata::epoch_seconds)
}

impl TreeNode for HostNode {
    fn name(&self) -> Option<RawName> {
        self.name.clone()
    }

    fn kind(&self) -> NodeKind {
        match &self.meta {
            Some(meta) if meta.is_dir() => NodeKind::Directory,
            _ => NodeKind::File,
        }
    }

    fn metadata(&self) -> Option<RawMetadata> {
        let meta = self.meta.as_ref()?;
        Some(RawMetadata {
            size: i64::try_from(meta.len()).ok(),
            created: seconds(meta.created()),
            modified: seconds(meta.modified()),
            accessed: seconds(meta.accessed()),
            last_write: None,
        })
    }

    #[cfg(unix)]
    fn node_id(&self) -> Option<u64> {
        use std::os::unix::fs::MetadataExt;
        self.meta.as_ref().map(MetadataExt::ino)
    }

    fn children(&self) -> Result<ChildIter, NodeError> {
        if self.kind() != NodeKind::Directory {
            return Ok(no_children());
        }
        let reader = fs::read_dir(&self.path)
            .map_err(|err| NodeError::subtree(format!("{}: {err}", self.path.display())))?;

        let mut entries: Vec<Result<fs::DirEntry, NodeError>> = reader
            .map(|entry| entry.map_err(|err| NodeError::corrupt(err.to_string())))
            .collect();
        entries.sort_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.file_name().cmp(&b.file_name()),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        Ok(Box::new(entries.into_iter().map(|entry| {
            entry.map(|e| Box::new(HostNode::from_entry(&e)) as BoxedNode)
        })))
    }

    fn content(&self, offset: u64, length: usize) -> Result<Vec<u8>, NodeError> {
        // Links, FIFOs and devices report as files but are never opened.
        if !self.meta.as_ref().is_some_and(Metadata::is_file) {
            return Err(NodeError::content(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        let read = || -> std::io::Result<Vec<u8>> {
            let mut file = File::open(&self.path)?;
            file.seek(SeekFrom::Start(offset))?;
            let mut buf = Vec::with_capacity(length);
            file.take(length as u64).read_to_end(&mut buf)?;
            Ok(buf)
        };
        read().map_err(|err| NodeError::content(format!("{}: {err}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn lists_children_sorted_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let root = HostNode::open(dir.path()).unwrap();
        assert_eq!(root.kind(), NodeKind::Directory);
        let children: Vec<_> = root.children().unwrap().map(|c| c.unwrap()).collect();
        let names: Vec<_> = children
            .iter()
            .map(|c| String::from_utf8_lossy(c.name().unwrap().as_bytes()).into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(children[1].metadata().unwrap().size, Some(2));
        assert!(children[1].metadata().unwrap().modified.is_some());
        assert_eq!(children[2].kind(), NodeKind::Directory);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_content_is_not_read_through() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real.txt");
        fs::write(&target, b"ERROR secret target bytes").unwrap();
        let link = dir.path().join("link.log");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let node = HostNode::open(&link).unwrap();
        assert_eq!(node.kind(), NodeKind::File);
        assert!(node.content(0, 64).is_err());
    }

    #[test]
    fn reads_content_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"0123456789").unwrap();
        let node = HostNode::open(&path).unwrap();
        assert_eq!(node.content(2, 3).unwrap(), b"234");
        assert_eq!(node.content(8, 10).unwrap(), b"89");
    }

    #[test]
    fn directory_content_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let node = HostNode::open(dir.path()).unwrap();
        assert!(matches!(
            node.content(0, 1),
            Err(NodeError::ContentUnavailable { .. })
        ));
    }

    #[test]
    fn missing_root_fails_to_open() {
        assert!(HostNode::open(Path::new("/definitely/not/here")).is_err());
    }
}
