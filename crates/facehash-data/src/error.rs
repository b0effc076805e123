use std::path::PathBuf;

/// All errors that can occur in the facehash data layer.
///
/// A single error type across the crate keeps propagation simple: catalog
/// construction, split carving, and sample resolution all return it.
/// Label-mode sample failures never surface through here — they become
/// `Ok(None)` at the accessor and are filtered out at collation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration that cannot be acted on (e.g. reading the aligned
    /// root without providing one, or carving into the train partition).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The data root is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A flat index outside the dataset's length.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// An image path whose identity cannot be resolved against the catalog.
    #[error("cannot resolve identity for `{0}`")]
    UnknownIdentity(String),

    /// Image decoding failed.
    #[error("failed to decode {path}: {reason}")]
    ImageDecode { path: String, reason: String },

    /// Every sample in a batch failed to resolve, leaving nothing to collate.
    #[error("empty batch: every sample in the batch failed to resolve")]
    EmptyBatch,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
