//! Filesystem abstraction over sysfs.
//!
//! Resolver code only ever talks to a [`Filesystem`]. Two backends exist:
//!
//! - **OsFs**: the running kernel's tree (`/sys` in production)
//! - **FakeFs**: a synthetic tree in a scratch directory, removed on drop
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use sriovnet::fs::{FakeFs, Filesystem};
//!
//! let fs = FakeFs::new().unwrap();
//! fs.create_dir_all(Path::new("/sys/bus/pci/devices/0000:02:00.0/net/eth0"), 0o755).unwrap();
//! assert_eq!(fs.list_dir(Path::new("/sys/bus/pci/devices/0000:02:00.0/net")).unwrap(), vec!["eth0"]);
//! ```

mod fake;
mod os;
mod traits;

pub use fake::FakeFs;
pub use os::OsFs;
pub use traits::{Filesystem, normalize};
