//! Throwaway dataset folders for tests

use super::split::{annotation_file_name, Kind, Split};
use super::store::AnnotationStore;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SCENARIO_IMAGE_ID: u64 = 391895;
pub const SCENARIO_FILE_NAME: &str = "000000391895.jpg";

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("annotations")).unwrap();
        Fixture { dir }
    }

    pub fn store(&self) -> AnnotationStore {
        AnnotationStore::open(self.dir.path())
    }

    fn document_path(&self, split: Split, kind: Kind) -> PathBuf {
        self.dir
            .path()
            .join("annotations")
            .join(annotation_file_name(split, kind))
    }

    pub fn write_document(&self, split: Split, kind: Kind, document: &Value) {
        self.write_raw(split, kind, &document.to_string());
    }

    pub fn write_raw(&self, split: Split, kind: Kind, text: &str) {
        fs::write(self.document_path(split, kind), text).unwrap();
    }

    pub fn remove_document(&self, split: Split, kind: Kind) {
        fs::remove_file(self.document_path(split, kind)).unwrap();
    }

    pub fn write_image(&self, split: Split, file_name: &str, width: u32, height: u32) {
        let dir = self.dir.path().join("images").join(split.image_dir_name());
        fs::create_dir_all(&dir).unwrap();
        image::RgbImage::from_pixel(width, height, image::Rgb([128, 128, 128]))
            .save(dir.join(file_name))
            .unwrap();
    }
}

/// One image, one category, one person instance
pub fn scenario_instances() -> Value {
    json!({
        "images": [
            {"id": SCENARIO_IMAGE_ID, "file_name": SCENARIO_FILE_NAME, "width": 64, "height": 48}
        ],
        "categories": [{"id": 1, "name": "person", "supercategory": "person"}],
        "annotations": [{
            "id": 1,
            "image_id": SCENARIO_IMAGE_ID,
            "category_id": 1,
            "bbox": [10, 20, 30, 40],
            "area": 1200,
            "iscrowd": 0,
            "segmentation": [[10, 20, 40, 20, 40, 60, 10, 60]]
        }]
    })
}

pub fn scenario_captions() -> Value {
    json!({
        "images": [
            {"id": SCENARIO_IMAGE_ID, "file_name": SCENARIO_FILE_NAME, "width": 64, "height": 48}
        ],
        "annotations": [
            {"id": 7, "image_id": SCENARIO_IMAGE_ID, "caption": "A man standing next to a motorbike."}
        ]
    })
}
