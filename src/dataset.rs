pub mod coco;
pub mod instances;
pub mod record;
pub mod split;
pub mod store;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use coco::*;
pub use instances::InstanceIter;
pub use record::{EnrichedAnnotation, ImageRecord, Instance};
pub use split::{annotation_file_name, Kind, Split};
pub use store::AnnotationStore;

/// Extends the iterator trait to make sure the Dataset has methods display progress
pub trait DataLoader: Iterator {
    /// Returns the next element index, starting from 0
    fn next_element_index(&self) -> usize;
    /// Returns the index of the last element to be loaded
    fn max_elem_index(&self) -> usize;
}
