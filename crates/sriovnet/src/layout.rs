//! Where the sysfs trees live.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory holding one entry per PCI function.
pub const PCI_SYS_DIR: &str = "/sys/bus/pci/devices";

/// Default directory holding one entry per network interface.
pub const NET_SYS_DIR: &str = "/sys/class/net";

/// Locations of the sysfs trees the resolver reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysfsLayout {
    /// PCI device tree, one directory per PCI address.
    #[serde(default = "default_pci_sys_dir")]
    pub pci_sys_dir: PathBuf,

    /// Network class tree, one directory per interface name.
    #[serde(default = "default_net_sys_dir")]
    pub net_sys_dir: PathBuf,
}

fn default_pci_sys_dir() -> PathBuf {
    PathBuf::from(PCI_SYS_DIR)
}

fn default_net_sys_dir() -> PathBuf {
    PathBuf::from(NET_SYS_DIR)
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self {
            pci_sys_dir: default_pci_sys_dir(),
            net_sys_dir: default_net_sys_dir(),
        }
    }
}

impl SysfsLayout {
    /// Layout for a sysfs mounted somewhere other than `/sys`.
    ///
    /// Containers often bind the host's `/sys` at `/host/sys`.
    pub fn rooted_at(sysfs: impl AsRef<Path>) -> Self {
        let sysfs = sysfs.as_ref();
        Self {
            pci_sys_dir: sysfs.join("bus/pci/devices"),
            net_sys_dir: sysfs.join("class/net"),
        }
    }

    /// `<pci_sys_dir>/<pci_address>`
    pub fn pci_device_dir(&self, pci_address: &str) -> PathBuf {
        self.pci_sys_dir.join(pci_address)
    }

    /// `<net_sys_dir>/<name>`
    pub fn net_device_dir(&self, name: &str) -> PathBuf {
        self.net_sys_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let layout = SysfsLayout::default();
        assert_eq!(
            layout.pci_device_dir("0000:02:00.0"),
            PathBuf::from("/sys/bus/pci/devices/0000:02:00.0")
        );
        assert_eq!(layout.net_device_dir("eth0"), PathBuf::from("/sys/class/net/eth0"));
    }

    #[test]
    fn test_rooted_at() {
        let layout = SysfsLayout::rooted_at("/host/sys");
        assert_eq!(layout.pci_sys_dir, PathBuf::from("/host/sys/bus/pci/devices"));
        assert_eq!(layout.net_sys_dir, PathBuf::from("/host/sys/class/net"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let layout: SysfsLayout = toml::from_str(r#"pci_sys_dir = "/tmp/pci""#).unwrap();
        assert_eq!(layout.pci_sys_dir, PathBuf::from("/tmp/pci"));
        assert_eq!(layout.net_sys_dir, PathBuf::from(NET_SYS_DIR));
    }
}
