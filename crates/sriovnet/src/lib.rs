//! sriovnet: map SR-IOV PCI functions to network interfaces through sysfs.
//!
//! This crate provides:
//!
//! - **fs**: The [`Filesystem`] abstraction, with a real backend ([`OsFs`]) and
//!   a scratch-directory fake ([`FakeFs`]) for tests
//! - **layout**: Where the PCI and network sysfs trees live ([`SysfsLayout`])
//! - **resolver**: [`SriovResolver`], the read-only lookups
//!
//! Nothing here writes to sysfs. Creating VFs, binding drivers and link
//! configuration belong to other tools.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use std::sync::Arc;
//! use sriovnet::{FakeFs, Filesystem, SriovResolver, SysfsLayout};
//!
//! let fs = Arc::new(FakeFs::new().unwrap());
//! let pf = Path::new("/sys/bus/pci/devices/0000:02:00.0");
//! let vf = Path::new("/sys/bus/pci/devices/0000:02:00.6");
//! fs.create_dir_all(&pf.join("net/enp2s0f0"), 0o755).unwrap();
//! fs.create_dir_all(vf, 0o755).unwrap();
//! fs.symlink(pf, &vf.join("physfn")).unwrap();
//!
//! let resolver = SriovResolver::new(fs, SysfsLayout::default());
//! assert_eq!(resolver.pf_pci_from_vf_pci("0000:02:00.6").unwrap(), "0000:02:00.0");
//! assert_eq!(resolver.net_devices_from_pci("0000:02:00.0").unwrap(), vec!["enp2s0f0"]);
//! ```

pub mod error;
pub mod fs;
pub mod layout;
pub mod resolver;

pub use error::{SriovError, SriovResult};
pub use fs::{FakeFs, Filesystem, OsFs};
pub use layout::{NET_SYS_DIR, PCI_SYS_DIR, SysfsLayout};
pub use resolver::SriovResolver;
