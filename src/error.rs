use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while reading the dataset
#[derive(Debug, Error)]
pub enum Error {
    /// A split or annotation kind outside of the known values
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("'{path}' is not a valid annotation file: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// An annotation points to an image or category id the document does not define
    #[error("dangling reference: {0}")]
    KeyNotFound(String),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image error on '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    /// Missing files become NotFound, every other io failure stays an Io error
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Error {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.display().to_string())
        } else {
            Error::Io { path, source }
        }
    }
}
