use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the dataset lives and how image file names are normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Folder holding `annotations/` and `images/`
    pub root: PathBuf,
    /// Character used to left-pad file names, COCO uses zeros
    #[serde(default = "default_pad_char")]
    pub pad_char: char,
    /// Width of a canonical file name, extension included (000000000016.jpg)
    #[serde(default = "default_file_name_width")]
    pub file_name_width: usize,
}

fn default_pad_char() -> char {
    '0'
}

fn default_file_name_width() -> usize {
    16
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> StoreConfig {
        StoreConfig {
            root: root.into(),
            pad_char: default_pad_char(),
            file_name_width: default_file_name_width(),
        }
    }

    /// Reads a json5 config file
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::from_io(path.to_owned(), err))?;
        let config = json5::from_str(&text)
            .map_err(|err| Error::Config(format!("{}: {}", path.display(), err)))?;
        Ok(config)
    }
}
