//! PCI address and network device resolution.
//!
//! Every lookup is a short sequence of directory listings and link reads
//! against the resolver's [`Filesystem`]. Nothing is cached; two calls on an
//! unchanged tree give the same answer.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{SriovError, SriovResult, classify};
use crate::fs::{Filesystem, OsFs};
use crate::layout::SysfsLayout;

/// Link from a virtual function to its physical function.
pub const PHYSFN: &str = "physfn";

/// Prefix of the links from a physical function to each of its VFs.
pub const VIRTFN_PREFIX: &str = "virtfn";

/// Subdirectory of a PCI function listing its network interfaces.
pub const NET_DIR: &str = "net";

/// Link from a network interface to its PCI function.
pub const DEVICE_LINK: &str = "device";

/// Number of VFs currently enabled on a PF.
pub const SRIOV_NUM_VFS: &str = "sriov_numvfs";

/// Number of VFs a PF supports.
pub const SRIOV_TOTAL_VFS: &str = "sriov_totalvfs";

/// Resolves SR-IOV relationships from sysfs.
///
/// Holds the filesystem it reads and where the sysfs trees live, nothing else.
/// Cheap to clone.
#[derive(Clone)]
pub struct SriovResolver {
    fs: Arc<dyn Filesystem>,
    layout: SysfsLayout,
}

impl fmt::Debug for SriovResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SriovResolver")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl SriovResolver {
    /// Create a resolver over the given filesystem and layout.
    pub fn new(fs: Arc<dyn Filesystem>, layout: SysfsLayout) -> Self {
        Self { fs, layout }
    }

    /// Resolver for the running kernel at the standard `/sys` paths.
    pub fn system() -> Self {
        Self::new(Arc::new(OsFs::new()), SysfsLayout::default())
    }

    pub fn layout(&self) -> &SysfsLayout {
        &self.layout
    }

    pub fn fs(&self) -> &Arc<dyn Filesystem> {
        &self.fs
    }

    /// Network interface names bound to a PCI function.
    ///
    /// Names come back in the order sysfs lists them. A missing or empty
    /// `net/` directory is `NoDevicesFound`, never an empty `Vec`.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn net_devices_from_pci(&self, pci_address: &str) -> SriovResult<Vec<String>> {
        let net_dir = self.layout.pci_device_dir(pci_address).join(NET_DIR);
        let no_devices = || SriovError::NoDevicesFound {
            pci_address: pci_address.to_string(),
        };

        let names = classify(self.fs.list_dir(&net_dir), &net_dir, no_devices)?;
        if names.is_empty() {
            return Err(no_devices());
        }
        tracing::debug!(count = names.len(), "found network devices");
        Ok(names)
    }

    /// PCI address of the physical function owning a virtual function.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn pf_pci_from_vf_pci(&self, vf_pci_address: &str) -> SriovResult<String> {
        let physfn = self.layout.pci_device_dir(vf_pci_address).join(PHYSFN);
        let not_vf = || SriovError::NotAVirtualFunction {
            pci_address: vf_pci_address.to_string(),
        };

        let pf_dir = classify(self.fs.resolve_symlink(&physfn), &physfn, not_vf)?;
        let pf = last_segment(&pf_dir).ok_or_else(not_vf)?;
        tracing::debug!(pf = %pf, "resolved physical function");
        Ok(pf)
    }

    /// Network interfaces of the PF that owns `vf_pci_address`.
    pub fn pf_net_devices_from_vf_pci(&self, vf_pci_address: &str) -> SriovResult<Vec<String>> {
        let pf = self.pf_pci_from_vf_pci(vf_pci_address)?;
        self.net_devices_from_pci(&pf)
    }

    /// True if the PCI function has a `physfn` link.
    pub fn is_sriov_vf(&self, pci_address: &str) -> bool {
        self.fs
            .exists(&self.layout.pci_device_dir(pci_address).join(PHYSFN))
    }

    /// True if the PCI function advertises SR-IOV capability.
    pub fn is_sriov_pf(&self, pci_address: &str) -> bool {
        self.fs
            .exists(&self.layout.pci_device_dir(pci_address).join(SRIOV_TOTAL_VFS))
    }

    /// Number of VFs currently enabled on a PF.
    pub fn num_vfs(&self, pf_pci_address: &str) -> SriovResult<u32> {
        self.read_counter(pf_pci_address, SRIOV_NUM_VFS)
    }

    /// Number of VFs the PF can expose.
    pub fn total_vfs(&self, pf_pci_address: &str) -> SriovResult<u32> {
        self.read_counter(pf_pci_address, SRIOV_TOTAL_VFS)
    }

    /// PCI addresses of a PF's virtual functions, ordered by VF index.
    ///
    /// A PF with no VFs enabled yields an empty `Vec`.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn vf_pci_addresses(&self, pf_pci_address: &str) -> SriovResult<Vec<String>> {
        let vfs = self.virtfns(pf_pci_address)?;
        Ok(vfs.into_iter().map(|(_, address)| address).collect())
    }

    /// Index of a VF among its PF's virtual functions.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn vf_index_from_vf_pci(&self, vf_pci_address: &str) -> SriovResult<u32> {
        let pf = self.pf_pci_from_vf_pci(vf_pci_address)?;
        self.virtfns(&pf)?
            .into_iter()
            .find(|(_, address)| address == vf_pci_address)
            .map(|(index, _)| index)
            .ok_or_else(|| SriovError::VfIndexNotFound {
                pci_address: vf_pci_address.to_string(),
            })
    }

    /// PCI address behind a network interface.
    ///
    /// Purely virtual interfaces (`lo`, bridges, veths) have no `device`
    /// link and report `NetDeviceNotFound`.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub fn pci_from_net_device(&self, name: &str) -> SriovResult<String> {
        let link = self.layout.net_device_dir(name).join(DEVICE_LINK);
        let not_found = || SriovError::NetDeviceNotFound {
            name: name.to_string(),
        };

        let device_dir = classify(self.fs.resolve_symlink(&link), &link, not_found)?;
        last_segment(&device_dir).ok_or_else(not_found)
    }

    /// `(index, vf_pci_address)` for each `virtfn<N>` link, sorted by index.
    fn virtfns(&self, pf_pci_address: &str) -> SriovResult<Vec<(u32, String)>> {
        let pf_dir = self.layout.pci_device_dir(pf_pci_address);
        let entries = classify(self.fs.list_dir(&pf_dir), &pf_dir, || {
            SriovError::NotAPhysicalFunction {
                pci_address: pf_pci_address.to_string(),
            }
        })?;

        let mut vfs = Vec::new();
        for name in entries {
            let Some(index) = virtfn_index(&name) else {
                continue;
            };
            let link = pf_dir.join(&name);
            let target = self
                .fs
                .resolve_symlink(&link)
                .map_err(|e| SriovError::io(&link, e))?;
            match last_segment(&target) {
                Some(address) => vfs.push((index, address)),
                None => tracing::warn!(link = %link.display(), "virtfn link has no target name"),
            }
        }

        // virtfn10 sorts after virtfn2.
        vfs.sort_by_key(|(index, _)| *index);
        Ok(vfs)
    }

    fn read_counter(&self, pf_pci_address: &str, attribute: &str) -> SriovResult<u32> {
        let path = self.layout.pci_device_dir(pf_pci_address).join(attribute);
        let raw = classify(self.fs.read_to_string(&path), &path, || {
            SriovError::NotAPhysicalFunction {
                pci_address: pf_pci_address.to_string(),
            }
        })?;

        raw.trim()
            .parse::<u32>()
            .map_err(|source| SriovError::InvalidAttribute {
                path,
                value: raw.clone(),
                source,
            })
    }
}

/// Final component of a resolved sysfs path, e.g. the PCI address.
fn last_segment(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// `virtfn12` → `Some(12)`; anything else → `None`.
fn virtfn_index(name: &str) -> Option<u32> {
    name.strip_prefix(VIRTFN_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    /// Filesystem where every call fails with the same error kind.
    struct FailingFs(io::ErrorKind);

    impl Filesystem for FailingFs {
        fn list_dir(&self, _path: &Path) -> io::Result<Vec<String>> {
            Err(io::Error::from(self.0))
        }

        fn create_dir_all(&self, _path: &Path, _mode: u32) -> io::Result<()> {
            Err(io::Error::from(self.0))
        }

        fn symlink(&self, _target: &Path, _link: &Path) -> io::Result<()> {
            Err(io::Error::from(self.0))
        }

        fn resolve_symlink(&self, _link: &Path) -> io::Result<PathBuf> {
            Err(io::Error::from(self.0))
        }

        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            Err(io::Error::from(self.0))
        }

        fn write(&self, _path: &Path, _data: &[u8]) -> io::Result<()> {
            Err(io::Error::from(self.0))
        }

        fn exists(&self, _path: &Path) -> bool {
            false
        }
    }

    fn resolver(kind: io::ErrorKind) -> SriovResolver {
        SriovResolver::new(Arc::new(FailingFs(kind)), SysfsLayout::default())
    }

    #[test]
    fn test_virtfn_index() {
        assert_eq!(virtfn_index("virtfn0"), Some(0));
        assert_eq!(virtfn_index("virtfn12"), Some(12));
        assert_eq!(virtfn_index("virtfn"), None);
        assert_eq!(virtfn_index("physfn"), None);
        assert_eq!(virtfn_index("virtfnx"), None);
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(
            last_segment(Path::new("/sys/bus/pci/devices/0000:02:00.0")),
            Some("0000:02:00.0".to_string())
        );
        assert_eq!(last_segment(Path::new("/")), None);
    }

    #[test]
    fn test_not_found_is_classified() {
        let err = resolver(io::ErrorKind::NotFound)
            .net_devices_from_pci("0000:02:00.0")
            .unwrap_err();
        assert!(matches!(err, SriovError::NoDevicesFound { .. }));

        let err = resolver(io::ErrorKind::NotFound)
            .pf_pci_from_vf_pci("0000:02:00.6")
            .unwrap_err();
        assert!(matches!(err, SriovError::NotAVirtualFunction { .. }));
    }

    #[test]
    fn test_other_io_errors_pass_through() {
        let err = resolver(io::ErrorKind::PermissionDenied)
            .net_devices_from_pci("0000:02:00.0")
            .unwrap_err();
        match err {
            SriovError::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/sys/bus/pci/devices/0000:02:00.0/net"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Io, got {other:?}"),
        }

        let err = resolver(io::ErrorKind::PermissionDenied)
            .pf_pci_from_vf_pci("0000:02:00.6")
            .unwrap_err();
        assert!(matches!(err, SriovError::Io { .. }));
    }

    #[test]
    fn test_debug_shows_layout() {
        let dbg = format!("{:?}", resolver(io::ErrorKind::NotFound));
        assert!(dbg.contains("/sys/bus/pci/devices"));
    }
}
