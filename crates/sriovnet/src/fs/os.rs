//! Real filesystem backend.
//!
//! Paths go straight to the operating system, so this is what reads the
//! kernel's `/sys` in production.

use super::traits::{Filesystem, not_a_symlink};
use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// Filesystem backed by the running kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl OsFs {
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for OsFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    fn resolve_symlink(&self, link: &Path) -> io::Result<PathBuf> {
        let meta = fs::symlink_metadata(link)?;
        if !meta.file_type().is_symlink() {
            return Err(not_a_symlink(link));
        }
        // sysfs directories are links themselves, so `..` in the raw target
        // only means something once every component is followed.
        let target = fs::canonicalize(link)?;
        tracing::trace!(link = %link.display(), target = %target.display(), "resolved link");
        Ok(target)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }
}
