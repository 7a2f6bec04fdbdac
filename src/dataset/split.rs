use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dataset partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
}

/// Annotation document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Captions,
    Instances,
    PersonKeypoints,
}

impl Split {
    /// Search order used by file name lookups
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// train2017 / val2017
    pub fn image_dir_name(&self) -> String {
        format!("{}2017", self.as_str())
    }
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Captions, Kind::Instances, Kind::PersonKeypoints];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Captions => "captions",
            Kind::Instances => "instances",
            Kind::PersonKeypoints => "person_keypoints",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// `instances_train2017.json` and friends
pub fn annotation_file_name(split: Split, kind: Kind) -> String {
    format!("{}_{}2017.json", kind.as_str(), split.as_str())
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Split::ALL
            .iter()
            .copied()
            .find(|split| split.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "split has to be either 'train' or 'val', got '{}'",
                    s
                ))
            })
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "kind has to be either 'captions', 'instances' or 'person_keypoints', got '{}'",
                    s
                ))
            })
    }
}
