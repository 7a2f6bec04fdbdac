use super::coco::{Annotation, AnnotationDocument, Category, Image};
use super::record::{load_pixels, EnrichedAnnotation};
use super::DataLoader;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::slice;

/// Streams the annotations of an instances document, one decoded image at a time.
///
/// The id lookups are built when the iterator is created. An annotation whose image or category
/// is missing from the document yields a [`Error::KeyNotFound`] item.
pub struct InstanceIter<'a> {
    image_dir: PathBuf,
    images: HashMap<u64, &'a Image>,
    categories: HashMap<u64, &'a Category>,
    annotations: slice::Iter<'a, Annotation>,
    max_elem_index: usize,
    next_element_index: usize,
}

impl<'a> InstanceIter<'a> {
    pub fn new(document: &'a AnnotationDocument, image_dir: PathBuf) -> InstanceIter<'a> {
        let images = document
            .images
            .iter()
            .map(|image| (image.id, image))
            .collect();
        let categories = document
            .categories
            .iter()
            .map(|category| (category.id, category))
            .collect();
        InstanceIter {
            image_dir,
            images,
            categories,
            annotations: document.annotations.iter(),
            max_elem_index: document.annotations.len(),
            next_element_index: 0,
        }
    }

    fn enrich(&self, annotation: &Annotation) -> Result<EnrichedAnnotation> {
        let category_id = annotation.category_id.ok_or_else(|| {
            Error::KeyNotFound(format!("annotation {} has no category_id", annotation.id))
        })?;
        let category = self.categories.get(&category_id).ok_or_else(|| {
            Error::KeyNotFound(format!(
                "category {} of annotation {}",
                category_id, annotation.id
            ))
        })?;
        let image = self.images.get(&annotation.image_id).ok_or_else(|| {
            Error::KeyNotFound(format!(
                "image {} of annotation {}",
                annotation.image_id, annotation.id
            ))
        })?;
        let pixels = load_pixels(&self.image_dir.join(&image.file_name))?;
        Ok(EnrichedAnnotation {
            annotation: annotation.clone(),
            super_category: category.supercategory.clone(),
            category_name: category.name.clone(),
            image: pixels,
        })
    }
}

impl<'a> Iterator for InstanceIter<'a> {
    type Item = Result<EnrichedAnnotation>;

    fn next(&mut self) -> Option<Self::Item> {
        let annotation = self.annotations.next()?;
        self.next_element_index += 1;
        Some(self.enrich(annotation))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.annotations.size_hint()
    }
}

impl<'a> DataLoader for InstanceIter<'a> {
    fn next_element_index(&self) -> usize {
        self.next_element_index
    }

    fn max_elem_index(&self) -> usize {
        self.max_elem_index
    }
}
