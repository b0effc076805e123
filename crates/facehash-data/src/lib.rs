//! # facehash-data
//!
//! Dataset indexing and sampling for a face-identification training
//! pipeline that learns binary hash codes.
//!
//! The on-disk corpus is one directory per identity with that person's
//! images inside; `val/` and `test/` subfolders hold the physically
//! carved-out held-out splits.  This crate provides:
//! - [`IdentityCatalog`] — immutable snapshot of identities and image paths
//! - [`FaceScrubDataset`] — label and comparison sampling over the catalog
//! - [`pair_from_index`] — flat-index arithmetic over the image cross-product
//! - [`carve_out`] / [`restore`] — held-out split management on disk
//! - [`DataLoader`] — shuffled, collated batches with ABSENT filtering
//! - image transforms — resize, grayscale, crop, per-channel standardize
//!
//! ## Usage
//!
//! ```ignore
//! use facehash_data::{Dataset, FaceScrubDataset, Resize, SampleKind, Split};
//!
//! let ds = FaceScrubDataset::new("data/facescrub")
//!     .split(Split::Train)
//!     .kind(SampleKind::Comparison)
//!     .transform(Box::new(Resize::new(64, 64)))
//!     .build()?;
//! println!("{} pairs over {} identities", ds.len(), ds.identity_names().len());
//! ```

pub mod catalog;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod index;
pub mod loader;
pub mod split;
pub mod transform;

pub use catalog::{IdentityCatalog, Split, RESERVED_SUBFOLDERS};
pub use dataset::{
    Dataset, FaceSample, FaceScrubBuilder, FaceScrubDataset, SampleKind, DEFAULT_HASH_DIM,
};
pub use decode::{decode_image, tensorize, ImageTensor};
pub use error::{Error, Result};
pub use index::{pair_count, pair_from_index};
pub use loader::{collate, Batch, ComparisonBatch, DataLoader, LabeledBatch, LoaderConfig};
pub use split::{carve_out, restore, CarveConfig, CarveStats};
pub use transform::{CenterCrop, Grayscale, ImageTransform, Resize, Standardize};
