//! Lazy access to a COCO 2017 style dataset folder: annotation documents cached per split and
//! kind, image records joining instances, categories and captions, and a simple renderer to look
//! at them.

pub mod config;
pub mod dataset;
pub mod drawing;
pub mod error;

pub use config::StoreConfig;
pub use dataset::{AnnotationStore, DataLoader, ImageRecord, Kind, Split};
pub use error::{Error, Result};
