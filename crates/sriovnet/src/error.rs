//! Resolver errors.

use std::io;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for resolver operations.
pub type SriovResult<T> = Result<T, SriovError>;

/// Errors from resolving SR-IOV relationships.
///
/// Only "path absent" is turned into one of the domain variants. Any other
/// I/O failure comes back as [`SriovError::Io`] with its source intact.
#[derive(Debug, Error)]
pub enum SriovError {
    #[error("no network devices found for PCI address {pci_address}")]
    NoDevicesFound { pci_address: String },

    #[error("PCI address {pci_address} is not a virtual function")]
    NotAVirtualFunction { pci_address: String },

    #[error("PCI address {pci_address} is not an SR-IOV physical function")]
    NotAPhysicalFunction { pci_address: String },

    #[error("no virtfn link of its physical function points at {pci_address}")]
    VfIndexNotFound { pci_address: String },

    #[error("network device {name} has no PCI device")]
    NetDeviceNotFound { name: String },

    #[error("failed to parse {value:?} from {}", path.display())]
    InvalidAttribute {
        path: PathBuf,
        value: String,
        source: ParseIntError,
    },

    #[error("io error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl SriovError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Map `NotFound` to a domain error, pass everything else through as `Io`.
pub(crate) fn classify<T>(
    result: io::Result<T>,
    path: &Path,
    absent: impl FnOnce() -> SriovError,
) -> SriovResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(absent()),
        Err(e) => Err(SriovError::io(path, e)),
    }
}
