use super::coco::{AnnotationDocument, Category, Image};
use super::instances::InstanceIter;
use super::record::{load_pixels, ImageRecord, Instance};
use super::split::{annotation_file_name, Kind, Split};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use log::{debug, info, warn};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::iter;
use std::path::PathBuf;

/// Lazily loaded view over a COCO 2017 dataset folder.
///
/// Every (split, kind) annotation file is read at most once and then kept for the life of the
/// store. The store is single threaded: the cache cells are not synchronized, use one store per
/// thread.
#[derive(Debug)]
pub struct AnnotationStore {
    config: StoreConfig,
    /// Indexed by [Split::index][Kind::index]
    documents: [[OnceCell<AnnotationDocument>; 3]; 2],
    category_names: OnceCell<Vec<String>>,
    super_category_names: OnceCell<HashSet<String>>,
}

impl AnnotationStore {
    pub fn new(config: StoreConfig) -> AnnotationStore {
        AnnotationStore {
            config,
            documents: Default::default(),
            category_names: OnceCell::new(),
            super_category_names: OnceCell::new(),
        }
    }

    /// Store over `root` with the default file name padding
    pub fn open(root: impl Into<PathBuf>) -> AnnotationStore {
        AnnotationStore::new(StoreConfig::new(root))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn annotation_path(&self, split: Split, kind: Kind) -> PathBuf {
        self.config
            .root
            .join("annotations")
            .join(annotation_file_name(split, kind))
    }

    pub fn image_dir(&self, split: Split) -> PathBuf {
        self.config.root.join("images").join(split.image_dir_name())
    }

    /// Returns the annotation document of (split, kind), reading it from disk on first use.
    pub fn load_annotation_file(&self, split: Split, kind: Kind) -> Result<&AnnotationDocument> {
        let cell = &self.documents[split.index()][kind.index()];
        if let Some(document) = cell.get() {
            debug!("{} already loaded", annotation_file_name(split, kind));
            return Ok(document);
        }
        cell.get_or_try_init(|| self.read_annotation_file(split, kind))
    }

    /// Same as [`load_annotation_file`](Self::load_annotation_file) with the split and kind given
    /// by name, e.g. ("val", "captions").
    pub fn load_annotation_file_by_name(
        &self,
        split: &str,
        kind: &str,
    ) -> Result<&AnnotationDocument> {
        let split: Split = split.parse()?;
        let kind: Kind = kind.parse()?;
        self.load_annotation_file(split, kind)
    }

    fn read_annotation_file(&self, split: Split, kind: Kind) -> Result<AnnotationDocument> {
        let file_name = annotation_file_name(split, kind);
        let path = self.annotation_path(split, kind);
        info!("Loading {}", file_name);
        let file = File::open(&path).map_err(|err| Error::from_io(path.clone(), err))?;
        let document = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| Error::Parse { path, source })?;
        info!("{} loaded", file_name);
        Ok(document)
    }

    /// Streams every instance annotation of `split` with its category and image pixels.
    /// Each call starts over from the first annotation.
    pub fn iterate_instances(&self, split: Split) -> Result<InstanceIter<'_>> {
        let document = self.load_annotation_file(split, Kind::Instances)?;
        Ok(InstanceIter::new(document, self.image_dir(split)))
    }

    /// The instance streams of both splits, train first
    pub fn iterate_train_and_val_instances(&self) -> Result<(InstanceIter<'_>, InstanceIter<'_>)> {
        let train = self.iterate_instances(Split::Train)?;
        let val = self.iterate_instances(Split::Val)?;
        Ok((train, val))
    }

    /// Turns anything like `16`, `16.png` or `000000000016.jpg` into the dataset's file name
    pub fn canonical_file_name(&self, file_name: &str) -> String {
        pad_file_name(file_name, self.config.pad_char, self.config.file_name_width)
    }

    /// Looks an image up by file name in train, then in val.
    ///
    /// A name that is in neither split is not an error: a warning is logged and `None` returned.
    pub fn find_image_id_by_file_name(&self, file_name: &str) -> Result<Option<(u64, Split)>> {
        let file_name = self.canonical_file_name(file_name);
        for split in Split::ALL {
            let document = self.load_annotation_file(split, Kind::Instances)?;
            if let Some(image) = document
                .images
                .iter()
                .find(|image| image.file_name == file_name)
            {
                return Ok(Some((image.id, split)));
            }
        }
        warn!("Image {} not found in train nor val", file_name);
        Ok(None)
    }

    pub fn get_image_record_by_file_name(&self, file_name: &str) -> Result<Option<ImageRecord>> {
        match self.find_image_id_by_file_name(file_name)? {
            Some((id, split)) => self.get_image_record(id, split).map(Some),
            None => Ok(None),
        }
    }

    pub fn image_by_id(&self, id: u64, split: Split) -> Result<Option<Image>> {
        let document = self.load_annotation_file(split, Kind::Instances)?;
        Ok(document.images.iter().find(|image| image.id == id).cloned())
    }

    pub fn category_by_id(&self, id: u64, split: Split) -> Result<Option<Category>> {
        let document = self.load_annotation_file(split, Kind::Instances)?;
        Ok(find_category(document, id))
    }

    /// Builds the full record of image `id`: metadata, instances with their categories, caption
    /// and decoded pixels.
    ///
    /// When several captions describe the image the last one in the captions file is kept.
    pub fn get_image_record(&self, id: u64, split: Split) -> Result<ImageRecord> {
        let document = self.load_annotation_file(split, Kind::Instances)?;
        let image = document
            .images
            .iter()
            .find(|image| image.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("image {} in {} split", id, split)))?;

        let instances = document
            .annotations
            .iter()
            .filter(|annotation| annotation.image_id == id)
            .map(|annotation| Instance {
                category: annotation
                    .category_id
                    .and_then(|category_id| find_category(document, category_id)),
                annotation: annotation.clone(),
            })
            .collect();

        let captions = self.load_annotation_file(split, Kind::Captions)?;
        let caption = captions
            .annotations
            .iter()
            .filter(|annotation| annotation.image_id == id)
            .last()
            .cloned();

        let pixels = load_pixels(&self.image_dir(split).join(&image.file_name))?;

        Ok(ImageRecord {
            image,
            instances,
            caption,
            pixels,
        })
    }

    /// Names of the train categories in file order
    pub fn list_category_names(&self) -> Result<&[String]> {
        let names = self.category_names.get_or_try_init(|| -> Result<_> {
            let document = self.load_annotation_file(Split::Train, Kind::Instances)?;
            Ok(document
                .categories
                .iter()
                .map(|category| category.name.clone())
                .collect())
        })?;
        Ok(names.as_slice())
    }

    /// Distinct supercategories of the train categories, in no particular order
    pub fn list_super_category_names(&self) -> Result<&HashSet<String>> {
        self.super_category_names.get_or_try_init(|| -> Result<_> {
            let document = self.load_annotation_file(Split::Train, Kind::Instances)?;
            Ok(document
                .categories
                .iter()
                .map(|category| category.supercategory.clone())
                .collect())
        })
    }
}

fn find_category(document: &AnnotationDocument, id: u64) -> Option<Category> {
    document
        .categories
        .iter()
        .find(|category| category.id == id)
        .cloned()
}

/// Keeps what comes before the first '.', appends ".jpg" and left pads to `width`.
/// Longer names are returned unpadded.
pub fn pad_file_name(file_name: &str, pad_char: char, width: usize) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let name = format!("{}.jpg", stem);
    let missing = width.saturating_sub(name.chars().count());
    iter::repeat(pad_char)
        .take(missing)
        .chain(name.chars())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_fixtures::{
        scenario_captions, scenario_instances, Fixture, SCENARIO_FILE_NAME, SCENARIO_IMAGE_ID,
    };
    use serde_json::json;

    fn scenario() -> Fixture {
        let fixture = Fixture::new();
        fixture.write_document(Split::Train, Kind::Instances, &scenario_instances());
        fixture.write_document(Split::Train, Kind::Captions, &scenario_captions());
        fixture.write_image(Split::Train, SCENARIO_FILE_NAME, 64, 48);
        fixture
    }

    #[test]
    fn loads_each_file_once() {
        let fixture = scenario();
        let store = fixture.store();
        let first = store
            .load_annotation_file(Split::Train, Kind::Instances)
            .unwrap() as *const AnnotationDocument;
        fixture.remove_document(Split::Train, Kind::Instances);
        let second = store
            .load_annotation_file(Split::Train, Kind::Instances)
            .unwrap() as *const AnnotationDocument;
        assert_eq!(first, second);
    }

    #[test]
    fn load_by_name_rejects_unknown_split_or_kind() {
        let fixture = scenario();
        let store = fixture.store();
        assert!(matches!(
            store.load_annotation_file_by_name("test", "instances"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            store.load_annotation_file_by_name("train", "keypoints"),
            Err(Error::InvalidArgument(_))
        ));
        let document = store
            .load_annotation_file_by_name("train", "instances")
            .unwrap();
        assert_eq!(document.images.len(), 1);
    }

    #[test]
    fn missing_and_malformed_files() {
        let fixture = scenario();
        fixture.write_raw(Split::Val, Kind::Instances, "{\"images\": [");
        let store = fixture.store();
        assert!(matches!(
            store.load_annotation_file(Split::Val, Kind::Captions),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.load_annotation_file(Split::Val, Kind::Instances),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn failed_load_is_retried() {
        let fixture = Fixture::new();
        let store = fixture.store();
        assert!(store
            .load_annotation_file(Split::Val, Kind::PersonKeypoints)
            .is_err());
        fixture.write_document(Split::Val, Kind::PersonKeypoints, &scenario_instances());
        assert!(store
            .load_annotation_file(Split::Val, Kind::PersonKeypoints)
            .is_ok());
    }

    #[test]
    fn image_record_of_scenario() {
        let fixture = scenario();
        let store = fixture.store();
        let record = store
            .get_image_record(SCENARIO_IMAGE_ID, Split::Train)
            .unwrap();
        assert_eq!(record.image.file_name, SCENARIO_FILE_NAME);
        assert_eq!(record.instances.len(), 1);
        let instance = &record.instances[0];
        assert_eq!(instance.category_name(), Some("person"));
        assert_eq!(instance.annotation.bbox, Some([10., 20., 30., 40.]));
        assert_eq!(record.pixels.width(), 64);
        assert_eq!(record.pixels.height(), 48);
    }

    #[test]
    fn image_record_for_unknown_id() {
        let fixture = scenario();
        let store = fixture.store();
        assert!(matches!(
            store.get_image_record(42, Split::Train),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn image_record_instances_in_document_order() {
        let fixture = Fixture::new();
        fixture.write_document(
            Split::Val,
            Kind::Instances,
            &json!({
                "images": [
                    {"id": 1, "file_name": "000000000001.jpg", "width": 8, "height": 8},
                    {"id": 2, "file_name": "000000000002.jpg", "width": 8, "height": 8}
                ],
                "categories": [
                    {"id": 1, "name": "person", "supercategory": "person"},
                    {"id": 3, "name": "car", "supercategory": "vehicle"}
                ],
                "annotations": [
                    {"id": 10, "image_id": 1, "category_id": 3, "bbox": [0, 0, 1, 1], "area": 1, "iscrowd": 0},
                    {"id": 11, "image_id": 2, "category_id": 1, "bbox": [0, 0, 1, 1], "area": 1, "iscrowd": 0},
                    {"id": 12, "image_id": 1, "category_id": 99, "bbox": [0, 0, 2, 2], "area": 4, "iscrowd": 0},
                    {"id": 13, "image_id": 1, "category_id": 1, "bbox": [0, 0, 3, 3], "area": 9, "iscrowd": 0}
                ]
            }),
        );
        fixture.write_document(
            Split::Val,
            Kind::Captions,
            &json!({
                "images": [{"id": 1, "file_name": "000000000001.jpg"}],
                "annotations": [
                    {"id": 1, "image_id": 1, "caption": "first"},
                    {"id": 2, "image_id": 2, "caption": "other image"},
                    {"id": 3, "image_id": 1, "caption": "last"}
                ]
            }),
        );
        fixture.write_image(Split::Val, "000000000001.jpg", 8, 8);
        let store = fixture.store();
        let record = store.get_image_record(1, Split::Val).unwrap();

        let ids: Vec<u64> = record
            .instances
            .iter()
            .map(|instance| instance.annotation.id)
            .collect();
        assert_eq!(ids, vec![10, 12, 13]);
        for instance in &record.instances {
            match &instance.category {
                Some(category) => assert_eq!(Some(category.id), instance.annotation.category_id),
                None => assert_eq!(instance.annotation.category_id, Some(99)),
            }
        }
        assert_eq!(record.caption_text(), Some("last"));
    }

    #[test]
    fn record_is_a_copy() {
        let fixture = scenario();
        let store = fixture.store();
        let mut record = store
            .get_image_record(SCENARIO_IMAGE_ID, Split::Train)
            .unwrap();
        record.instances[0].annotation.bbox = None;
        record.image.file_name.clear();
        let again = store
            .get_image_record(SCENARIO_IMAGE_ID, Split::Train)
            .unwrap();
        assert_eq!(again.instances[0].annotation.bbox, Some([10., 20., 30., 40.]));
        assert_eq!(again.image.file_name, SCENARIO_FILE_NAME);
    }

    #[test]
    fn pads_file_names() {
        assert_eq!(pad_file_name("391895", '0', 16), "000000391895.jpg");
        assert_eq!(pad_file_name("391895.png", '0', 16), "000000391895.jpg");
        assert_eq!(pad_file_name("000000391895.jpg", '0', 16), "000000391895.jpg");
        assert_eq!(pad_file_name("12.tar.gz", '_', 8), "__12.jpg");
        assert_eq!(
            pad_file_name("1234567890123.jpg", '0', 16),
            "1234567890123.jpg"
        );
    }

    #[test]
    fn finds_train_image_without_reading_val() {
        let fixture = scenario();
        let store = fixture.store();
        // no val files on disk, a val lookup would fail
        assert_eq!(
            store.find_image_id_by_file_name("391895.jpg").unwrap(),
            Some((SCENARIO_IMAGE_ID, Split::Train))
        );
    }

    #[test]
    fn falls_back_to_val() {
        let fixture = scenario();
        fixture.write_document(
            Split::Val,
            Kind::Instances,
            &json!({
                "images": [{"id": 16, "file_name": "000000000016.jpg", "width": 4, "height": 4}],
                "annotations": [],
                "categories": []
            }),
        );
        let store = fixture.store();
        assert_eq!(
            store.find_image_id_by_file_name("16").unwrap(),
            Some((16, Split::Val))
        );
        assert_eq!(store.find_image_id_by_file_name("17.jpg").unwrap(), None);
    }

    #[test]
    fn record_by_file_name() {
        let fixture = scenario();
        fixture.write_document(
            Split::Val,
            Kind::Instances,
            &json!({"images": [], "annotations": [], "categories": []}),
        );
        let store = fixture.store();
        let record = store
            .get_image_record_by_file_name("000000391895.jpg")
            .unwrap()
            .unwrap();
        assert_eq!(record.image.id, SCENARIO_IMAGE_ID);
        assert!(store.get_image_record_by_file_name("1.jpg").unwrap().is_none());
    }

    #[test]
    fn lookups_by_id() {
        let fixture = scenario();
        let store = fixture.store();
        assert_eq!(
            store
                .category_by_id(1, Split::Train)
                .unwrap()
                .map(|category| category.name),
            Some("person".to_string())
        );
        assert_eq!(store.category_by_id(2, Split::Train).unwrap(), None);
        assert!(store
            .image_by_id(SCENARIO_IMAGE_ID, Split::Train)
            .unwrap()
            .is_some());
    }

    #[test]
    fn category_names_are_memoized() {
        let fixture = Fixture::new();
        fixture.write_document(
            Split::Train,
            Kind::Instances,
            &json!({
                "images": [],
                "annotations": [],
                "categories": [
                    {"id": 2, "name": "bicycle", "supercategory": "vehicle"},
                    {"id": 1, "name": "person", "supercategory": "person"},
                    {"id": 3, "name": "car", "supercategory": "vehicle"}
                ]
            }),
        );
        let store = fixture.store();
        let first = store.list_category_names().unwrap().to_vec();
        fixture.remove_document(Split::Train, Kind::Instances);
        let second = store.list_category_names().unwrap();
        assert_eq!(first, vec!["bicycle", "person", "car"]);
        assert_eq!(first, second);

        let super_categories = store.list_super_category_names().unwrap();
        let expected: HashSet<String> = ["vehicle", "person"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(super_categories, &expected);
        assert_eq!(store.list_super_category_names().unwrap(), &expected);
    }

    #[test]
    fn iterates_both_splits() {
        let fixture = scenario();
        fixture.write_document(Split::Val, Kind::Instances, &scenario_instances());
        let store = fixture.store();
        let (train, val) = store.iterate_train_and_val_instances().unwrap();
        assert_eq!(train.count(), 1);
        // val has no images folder
        assert!(val.map(|item| item.is_err()).all(|failed| failed));
    }
}
