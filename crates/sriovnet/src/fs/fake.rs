//! Synthetic sysfs tree for tests.
//!
//! Every absolute path is re-rooted under a scratch directory, so a test can
//! build `/sys/bus/pci/devices/...` without root and without touching the
//! real `/sys`. The scratch directory is removed when the `FakeFs` is dropped.

use super::traits::{Filesystem, absolute_target, normalize, not_a_symlink};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creation order of entries, keyed by de-referenced synthetic path.
#[derive(Debug, Default)]
struct CreationIndex {
    next: u64,
    seq: HashMap<PathBuf, u64>,
}

impl CreationIndex {
    fn record(&mut self, path: PathBuf) {
        if !self.seq.contains_key(&path) {
            self.seq.insert(path, self.next);
            self.next += 1;
        }
    }
}

/// Fake filesystem rooted at a private scratch directory.
///
/// `list_dir` reports entries in the order they were created through this
/// `FakeFs`, whichever linked path the directory is reached by. Entries
/// created behind its back sort after those, in whatever order the host
/// filesystem returns them.
#[derive(Debug)]
pub struct FakeFs {
    root: PathBuf,
    /// `root` with host symlinks (e.g. a linked `/tmp`) resolved.
    real_root: PathBuf,
    index: RwLock<CreationIndex>,
    torn_down: bool,
}

impl FakeFs {
    /// Create a fresh, empty tree under the system temp directory.
    pub fn new() -> io::Result<Self> {
        let id = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
        let root = env::temp_dir().join(format!("sriovnet-fake-{}-{}", std::process::id(), id));
        Self::with_root(root)
    }

    /// Create a fresh tree at `root`.
    ///
    /// `root` must be missing or an empty directory. It is deleted again when
    /// the `FakeFs` goes away, so pointing it at real data is refused with
    /// `AlreadyExists`.
    pub fn with_root(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        match fs::read_dir(&root) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("fake sysfs root is not empty: {}", root.display()),
                    ));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(&root)?,
            Err(e) => return Err(e),
        }
        let real_root = fs::canonicalize(&root)?;
        tracing::debug!(root = %root.display(), "created fake sysfs tree");
        Ok(Self {
            root,
            real_root,
            index: RwLock::new(CreationIndex::default()),
            torn_down: false,
        })
    }

    /// The scratch directory backing this tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove the scratch directory now and report any failure.
    ///
    /// Dropping the `FakeFs` does the same but swallows errors.
    pub fn teardown(mut self) -> io::Result<()> {
        self.torn_down = true;
        tracing::debug!(root = %self.root.display(), "removing fake sysfs tree");
        fs::remove_dir_all(&self.root)
    }

    /// Map a synthetic absolute path onto the scratch directory.
    fn host_path(&self, path: &Path) -> PathBuf {
        let normalized = normalize(path);
        let relative = normalized.strip_prefix("/").unwrap_or(&normalized);
        self.root.join(relative)
    }

    /// Map a host path back into the synthetic tree, if it lies inside it.
    fn synthetic_path(&self, host: &Path) -> Option<PathBuf> {
        host.strip_prefix(&self.root)
            .or_else(|_| host.strip_prefix(&self.real_root))
            .ok()
            .map(|rest| Path::new("/").join(rest))
    }

    /// Follow every link in `path` and map the result back into the tree.
    fn dereference(&self, path: &Path) -> io::Result<PathBuf> {
        let real = fs::canonicalize(self.host_path(path))?;
        Ok(self.synthetic_path(&real).unwrap_or_else(|| normalize(path)))
    }

    /// Remember that `path` was just created, keyed under its real parent.
    fn record(&self, path: &Path) -> io::Result<()> {
        let key = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => self.dereference(parent)?.join(name),
            _ => return Ok(()),
        };
        let mut index = self
            .index
            .write()
            .map_err(|_| io::Error::other("lock poisoned"))?;
        index.record(key);
        Ok(())
    }
}

impl Filesystem for FakeFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.host_path(path))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        let index = self
            .index
            .read()
            .map_err(|_| io::Error::other("lock poisoned"))?;
        let dir = self.dereference(path)?;
        // Stable sort keeps host order among entries we never saw created.
        names.sort_by_key(|name| index.seq.get(&dir.join(name)).copied().unwrap_or(u64::MAX));
        Ok(names)
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let path = normalize(path);
        let mut missing: Vec<PathBuf> = path
            .ancestors()
            .filter(|p| !self.host_path(p).exists())
            .map(Path::to_path_buf)
            .collect();
        missing.reverse();

        fs::DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(self.host_path(&path))?;

        for dir in &missing {
            self.record(dir)?;
        }
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let link = normalize(link);
        let host_target = if target.is_absolute() {
            self.host_path(target)
        } else {
            target.to_path_buf()
        };
        std::os::unix::fs::symlink(&host_target, self.host_path(&link))?;
        self.record(&link)
    }

    fn resolve_symlink(&self, link: &Path) -> io::Result<PathBuf> {
        let link = normalize(link);
        let host_link = self.host_path(&link);
        let meta = fs::symlink_metadata(&host_link)?;
        if !meta.file_type().is_symlink() {
            return Err(not_a_symlink(&link));
        }

        let real = fs::canonicalize(&host_link)?;
        match self.synthetic_path(&real) {
            Some(target) => Ok(target),
            // Points out of the scratch tree; report what the link says.
            None => Ok(absolute_target(&link, &fs::read_link(&host_link)?)),
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.host_path(path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let path = normalize(path);
        fs::write(self.host_path(&path), data)?;
        self.record(&path)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(self.host_path(path)).is_ok()
    }
}

impl Drop for FakeFs {
    fn drop(&mut self) {
        if !self.torn_down {
            let _ = fs::remove_dir_all(&self.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rerooted() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/sys/bus/pci/devices/0000:02:00.0"), 0o755)
            .unwrap();

        assert!(fs.root().join("sys/bus/pci/devices/0000:02:00.0").is_dir());
        assert!(fs.exists(Path::new("/sys/bus/pci/devices/0000:02:00.0")));
    }

    #[test]
    fn test_list_in_creation_order() {
        let fs = FakeFs::new().unwrap();
        for name in ["zeta", "alpha", "mu"] {
            fs.create_dir_all(&Path::new("/net").join(name), 0o755).unwrap();
        }

        let names = fs.list_dir(Path::new("/net")).unwrap();
        assert_eq!(names, vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_list_missing_is_not_found() {
        let fs = FakeFs::new().unwrap();
        let err = fs.list_dir(Path::new("/sys/bus/pci/devices")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_create_dir_all_idempotent() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/a/b"), 0o755).unwrap();
        fs.create_dir_all(Path::new("/a/b"), 0o755).unwrap();
        assert_eq!(fs.list_dir(Path::new("/a")).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_absolute_symlink_resolves_inside_tree() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/devices/pf"), 0o755).unwrap();
        fs.create_dir_all(Path::new("/devices/vf"), 0o755).unwrap();
        fs.symlink(Path::new("/devices/pf"), Path::new("/devices/vf/physfn"))
            .unwrap();

        let target = fs.resolve_symlink(Path::new("/devices/vf/physfn")).unwrap();
        assert_eq!(target, PathBuf::from("/devices/pf"));
    }

    #[test]
    fn test_relative_symlink() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/devices/pf"), 0o755).unwrap();
        fs.create_dir_all(Path::new("/devices/vf"), 0o755).unwrap();
        fs.symlink(Path::new("../pf"), Path::new("/devices/vf/physfn"))
            .unwrap();

        let target = fs.resolve_symlink(Path::new("/devices/vf/physfn")).unwrap();
        assert_eq!(target, PathBuf::from("/devices/pf"));
    }

    #[test]
    fn test_resolve_follows_linked_parent() {
        let fs = FakeFs::new().unwrap();
        let pci = Path::new("/sys/devices/pci0000:00/0000:02:00.0");
        fs.create_dir_all(&pci.join("net/eth0"), 0o755).unwrap();
        fs.create_dir_all(Path::new("/sys/class/net"), 0o755).unwrap();
        fs.symlink(&pci.join("net/eth0"), Path::new("/sys/class/net/eth0"))
            .unwrap();
        fs.symlink(Path::new("../../../0000:02:00.0"), &pci.join("net/eth0/device"))
            .unwrap();

        let target = fs
            .resolve_symlink(Path::new("/sys/class/net/eth0/device"))
            .unwrap();
        assert_eq!(target, pci);
    }

    #[test]
    fn test_list_through_linked_dir_keeps_creation_order() {
        let fs = FakeFs::new().unwrap();
        let real = Path::new("/sys/devices/pci0000:00/0000:02:00.0");
        for name in ["zeta", "alpha", "mu", "beta", "omega", "kappa"] {
            fs.create_dir_all(&real.join("net").join(name), 0o755).unwrap();
        }
        fs.create_dir_all(Path::new("/sys/bus/pci/devices"), 0o755).unwrap();
        fs.symlink(real, Path::new("/sys/bus/pci/devices/0000:02:00.0"))
            .unwrap();

        let direct = fs.list_dir(&real.join("net")).unwrap();
        let linked = fs
            .list_dir(Path::new("/sys/bus/pci/devices/0000:02:00.0/net"))
            .unwrap();
        assert_eq!(direct, vec!["zeta", "alpha", "mu", "beta", "omega", "kappa"]);
        assert_eq!(linked, direct);
    }

    #[test]
    fn test_with_root_refuses_non_empty_dir() {
        let holder = FakeFs::new().unwrap();
        holder.write(Path::new("/keep.txt"), b"data").unwrap();

        let err = FakeFs::with_root(holder.root()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(holder.read_to_string(Path::new("/keep.txt")).unwrap(), "data");
    }

    #[test]
    fn test_with_root_accepts_empty_dir() {
        let holder = FakeFs::new().unwrap();
        holder.create_dir_all(Path::new("/scratch"), 0o755).unwrap();
        let root = holder.root().join("scratch");

        let fs = FakeFs::with_root(&root).unwrap();
        fs.create_dir_all(Path::new("/sys"), 0o755).unwrap();
        assert!(root.join("sys").is_dir());
    }

    #[test]
    fn test_resolve_missing_or_plain_is_not_found() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/dir"), 0o755).unwrap();

        let err = fs.resolve_symlink(Path::new("/dir")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let err = fs.resolve_symlink(Path::new("/dir/physfn")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_write_and_read() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/pf"), 0o755).unwrap();
        fs.write(Path::new("/pf/sriov_totalvfs"), b"8\n").unwrap();
        assert_eq!(fs.read_to_string(Path::new("/pf/sriov_totalvfs")).unwrap(), "8\n");
    }

    #[test]
    fn test_teardown_removes_scratch() {
        let fs = FakeFs::new().unwrap();
        fs.create_dir_all(Path::new("/sys/bus"), 0o755).unwrap();
        let root = fs.root().to_path_buf();

        fs.teardown().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_removes_scratch() {
        let root = {
            let fs = FakeFs::new().unwrap();
            fs.create_dir_all(Path::new("/sys/bus"), 0o755).unwrap();
            fs.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_on_panic_removes_scratch() {
        let fs = FakeFs::new().unwrap();
        let root = fs.root().to_path_buf();

        fn fail_holding(_fs: FakeFs) {
            panic!("test failure");
        }

        let result = std::panic::catch_unwind(move || fail_holding(fs));
        assert!(result.is_err());
        assert!(!root.exists());
    }
}
