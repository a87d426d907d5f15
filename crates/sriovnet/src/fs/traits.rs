//! Core filesystem trait and path helpers.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Abstract view of the sysfs tree.
///
/// All paths are absolute, written the way the kernel exposes them
/// (`/sys/bus/pci/devices/0000:02:00.0/net`). A fake implementation maps
/// them somewhere else; callers never see the difference.
///
/// A missing entry is always reported as `io::ErrorKind::NotFound`.
pub trait Filesystem: Send + Sync {
    /// List the names of the entries in a directory.
    ///
    /// Order is whatever the backing tree reports. Callers that need a
    /// particular order must sort themselves.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Create a directory and any missing parents.
    ///
    /// Succeeds if `path` is already a directory. `mode` holds the Unix
    /// permission bits for directories that get created.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create a symbolic link at `link` pointing at `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Resolve a symbolic link to the absolute, de-referenced path it points at.
    ///
    /// Links anywhere along the way are followed, including in the link's
    /// own parent directories. Returns `NotFound` if `link` does not exist, is
    /// not a symbolic link, or dangles.
    fn resolve_symlink(&self, link: &Path) -> io::Result<PathBuf>;

    /// Read a small text attribute such as `sriov_numvfs`.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write a file, replacing any previous content.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Check if a path exists without following a trailing symlink.
    fn exists(&self, path: &Path) -> bool;
}

/// Resolve `.` and `..` without touching the disk.
///
/// `..` at the root stays at the root, as the kernel does.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir => result.push("/"),
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => result.push(s),
            Component::Prefix(_) => {}
        }
    }
    result
}

/// Turn a raw link target into an absolute path.
pub(crate) fn absolute_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        normalize(target)
    } else {
        let parent = link.parent().unwrap_or_else(|| Path::new("/"));
        normalize(&parent.join(target))
    }
}

pub(crate) fn not_a_symlink(link: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("not a symbolic link: {}", link.display()),
    )
}
