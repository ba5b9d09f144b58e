//! Container error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("archive entry `{name}` is missing")]
    EntryMissing { name: String },
    #[error("not an archive: bad magic")]
    BadMagic,
    #[error("unsupported archive version {version}")]
    UnsupportedVersion { version: u8 },
    #[error("archive truncated")]
    Truncated,
    #[error("archive entry table is corrupt")]
    Corrupt,
}
