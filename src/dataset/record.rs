use super::coco::{Annotation, Category, Image};
use crate::error::{Error, Result};
use image::DynamicImage;
use std::path::Path;

/// An annotated instance of an image together with the category it belongs to.
/// The category is `None` when the document does not define the annotation's `category_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub annotation: Annotation,
    pub category: Option<Category>,
}

impl Instance {
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.name.as_str())
    }
}

/// An image with everything known about it: metadata, instances, caption and pixels.
/// All fields are copies, changing them never touches the loaded documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub image: Image,
    pub instances: Vec<Instance>,
    pub caption: Option<Annotation>,
    pub pixels: DynamicImage,
}

impl ImageRecord {
    pub fn caption_text(&self) -> Option<&str> {
        self.caption.as_ref()?.caption.as_deref()
    }
}

/// A single instance annotation with its category names and the pixels of its image
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedAnnotation {
    pub annotation: Annotation,
    pub super_category: String,
    pub category_name: String,
    pub image: DynamicImage,
}

/// Decodes the image file at `path`
pub(crate) fn load_pixels(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Image {
        path: path.to_owned(),
        source,
    })
}
