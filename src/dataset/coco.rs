use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One annotation file (instances, captions or person_keypoints) of one split
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub licenses: Vec<License>,
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    /// Captions files have no categories
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub description: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub year: Option<i64>,
    pub contributor: Option<String>,
    pub date_created: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub url: String,
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    pub file_name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// license, coco_url, flickr_url, date_captured...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub supercategory: String,
    pub id: u64,
    pub name: String,
    /// Only in person_keypoints files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keypoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skeleton: Vec<[u32; 2]>,
}

/// A single entry of `annotations`. Which fields are present depends on the kind of document it
/// comes from: instances carry a category, bbox and segmentation, captions a caption and
/// person_keypoints the instance fields plus keypoints.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    pub image_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// x, y, width, height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Segmentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iscrowd: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// x, y, visibility triplets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_keypoints: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    pub fn is_crowd(&self) -> bool {
        self.iscrowd.map_or(false, |flag| flag != 0)
    }

    /// Polygon outlines, empty for crowd (RLE) masks
    pub fn polygons(&self) -> &[Vec<f64>] {
        match &self.segmentation {
            Some(Segmentation::Polygons(polygons)) => polygons,
            _ => &[],
        }
    }
}

/// Either a list of flat x1,y1,x2,y2,... polygons or, for crowd regions, a run length mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    Polygons(Vec<Vec<f64>>),
    Rle(Rle),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rle {
    pub counts: RleCounts,
    /// height, width
    pub size: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RleCounts {
    Uncompressed(Vec<u32>),
    Compressed(String),
}
