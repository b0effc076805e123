// FaceScrubDataset — label and comparison sampling over an identity tree
//
// The dataset addresses the corpus through a single flat integer.  In label
// mode the integer is a position in the catalog's flat image list; in
// comparison mode it addresses one ordered pair out of the full
// cross-product, recovered arithmetically (see the `index` module).
//
// Error policy differs by mode, matching the behavior the training
// pipeline was built around: label mode skips unresolvable samples by
// returning `Ok(None)` (the loader filters them out), while comparison
// mode propagates the failure to the caller.  See DESIGN.md for why this
// asymmetry is kept.

use std::path::{Path, PathBuf};

use crate::catalog::{IdentityCatalog, Split};
use crate::decode::{decode_image, tensorize, ImageTensor};
use crate::error::{Error, Result};
use crate::index::{pair_count, pair_from_index};
use crate::transform::{ImageTransform, Standardize};

/// Hamming-space dimensionality the downstream hashing model trains
/// against.  Carried by the dataset so every consumer agrees on it.
pub const DEFAULT_HASH_DIM: usize = 48;

/// Which sampling contract the dataset exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// One image plus its identity index.
    Label,
    /// An ordered (baseline, compare) pair drawn from the full
    /// cross-product, plus a same-identity flag.
    Comparison,
}

impl Default for SampleKind {
    fn default() -> Self {
        SampleKind::Label
    }
}

/// One resolved sample.
#[derive(Debug, Clone)]
pub enum FaceSample {
    Labeled {
        image: ImageTensor,
        /// Position of the identity in the catalog's name list.
        identity: usize,
    },
    Comparison {
        baseline: ImageTensor,
        compare: ImageTensor,
        /// Whether both images belong to the same identity.
        same: bool,
    },
}

/// The dataset-to-loader seam.
///
/// `Ok(None)` marks a sample that failed to resolve and should be filtered
/// out at collation; `Err` is fatal for the current operation.
pub trait Dataset: Send + Sync {
    /// Total number of addressable samples.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at `index`.
    fn get(&self, index: usize) -> Result<Option<FaceSample>>;
}

// FaceScrubBuilder

/// Builder for [`FaceScrubDataset`].
pub struct FaceScrubBuilder {
    root: PathBuf,
    aligned_root: Option<PathBuf>,
    use_aligned: bool,
    split: Split,
    kind: SampleKind,
    hash_dim: usize,
    transforms: Vec<Box<dyn ImageTransform>>,
    normalize: bool,
}

impl FaceScrubBuilder {
    /// Create a builder rooted at the raw data directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            aligned_root: None,
            use_aligned: false,
            split: Split::Train,
            kind: SampleKind::Label,
            hash_dim: DEFAULT_HASH_DIM,
            transforms: Vec::new(),
            normalize: false,
        }
    }

    /// Parallel root holding the aligned rendition of the same tree.
    pub fn aligned_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.aligned_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Read from the aligned root instead of the raw one.
    pub fn use_aligned(mut self, yes: bool) -> Self {
        self.use_aligned = yes;
        self
    }

    pub fn split(mut self, split: Split) -> Self {
        self.split = split;
        self
    }

    pub fn kind(mut self, kind: SampleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn hash_dim(mut self, dim: usize) -> Self {
        self.hash_dim = dim;
        self
    }

    /// Append a transform to the preprocessing pipeline (applied in order).
    pub fn transform(mut self, t: Box<dyn ImageTransform>) -> Self {
        self.transforms.push(t);
        self
    }

    /// Standardize decoded tensors with the corpus channel statistics.
    pub fn normalize(mut self, yes: bool) -> Self {
        self.normalize = yes;
        self
    }

    /// Validate the configuration, scan the directory tree once, and build
    /// the dataset.
    pub fn build(self) -> Result<FaceScrubDataset> {
        let root = if self.use_aligned {
            match self.aligned_root {
                Some(root) => root,
                None => {
                    return Err(Error::InvalidConfiguration(
                        "use_aligned is set but no aligned root was provided".into(),
                    ))
                }
            }
        } else {
            self.root
        };
        let catalog = IdentityCatalog::build(&root, self.split)?;
        Ok(FaceScrubDataset {
            root,
            split: self.split,
            kind: self.kind,
            hash_dim: self.hash_dim,
            transforms: self.transforms,
            standardize: self.normalize.then(Standardize::facescrub),
            catalog,
        })
    }
}

// FaceScrubDataset

/// A face-identification dataset over a directory-per-identity tree.
///
/// The catalog is an immutable snapshot taken at build time, so `len()` is
/// stable for the lifetime of the instance.  If the tree mutates afterwards
/// (a carve-out runs, files are deleted), rebuild the dataset; until then a
/// label index whose file vanished resolves to `Ok(None)` rather than an
/// error, and a comparison index touching it fails.
pub struct FaceScrubDataset {
    root: PathBuf,
    split: Split,
    kind: SampleKind,
    hash_dim: usize,
    transforms: Vec<Box<dyn ImageTransform>>,
    standardize: Option<Standardize>,
    catalog: IdentityCatalog,
}

impl FaceScrubDataset {
    /// Convenience entry-point: `FaceScrubDataset::new(root)` returns a
    /// builder.
    pub fn new<P: AsRef<Path>>(root: P) -> FaceScrubBuilder {
        FaceScrubBuilder::new(root)
    }

    /// The data root this dataset reads from (aligned or raw, per config).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn hash_dim(&self) -> usize {
        self.hash_dim
    }

    pub fn catalog(&self) -> &IdentityCatalog {
        &self.catalog
    }

    /// Identity names in discovery order; a labeled sample's identity index
    /// points into this list.
    pub fn identity_names(&self) -> &[String] {
        self.catalog.names()
    }

    /// Derive the identity name of an image path: the path component
    /// directly under the data root (the identity directory).  This also
    /// covers paths inside `val/` and `test/` subfolders, whose immediate
    /// parent is the reserved subfolder rather than the identity.
    fn identity_name<'a>(&self, path: &'a Path) -> Result<&'a str> {
        path.strip_prefix(&self.root)
            .ok()
            .and_then(|rel| rel.components().next())
            .and_then(|c| c.as_os_str().to_str())
            .ok_or_else(|| Error::UnknownIdentity(path.display().to_string()))
    }

    /// Decode `path` and run it through the transform pipeline.
    fn load_image(&self, path: &Path) -> Result<ImageTensor> {
        let mut img = decode_image(path)?;
        for t in &self.transforms {
            img = t.apply(img);
        }
        let mut tensor = tensorize(&img);
        if let Some(standardize) = &self.standardize {
            standardize.apply(&mut tensor);
        }
        Ok(tensor)
    }

    /// Resolve a label-mode sample.  An out-of-range index is an error;
    /// past that point any failure (missing file, decode error, identity
    /// lookup miss) is reported to stderr and returned as `None`, to be
    /// filtered out at collation.
    fn get_labeled(&self, index: usize) -> Result<Option<FaceSample>> {
        let paths = self.catalog.image_paths();
        if index >= paths.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: paths.len(),
            });
        }
        let path = &paths[index];
        match self.resolve_labeled(path) {
            Ok(sample) => Ok(Some(sample)),
            Err(e) => {
                eprintln!("facehash: skipping sample {index} ({}): {e}", path.display());
                Ok(None)
            }
        }
    }

    fn resolve_labeled(&self, path: &Path) -> Result<FaceSample> {
        let name = self.identity_name(path)?;
        let identity = self
            .catalog
            .identity_index(name)
            .ok_or_else(|| Error::UnknownIdentity(name.to_string()))?;
        let image = self.load_image(path)?;
        Ok(FaceSample::Labeled { image, identity })
    }

    /// Resolve a comparison-mode sample.  Unlike label mode, failures here
    /// propagate: a missing or undecodable file aborts the caller's
    /// iteration instead of shrinking the batch.
    fn get_comparison(&self, index: usize) -> Result<Option<FaceSample>> {
        let paths = self.catalog.image_paths();
        let len = pair_count(paths.len());
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let (x, y) = pair_from_index(index, paths.len());
        let baseline_path = &paths[x];
        let compare_path = &paths[y];
        let same = self.identity_name(baseline_path)? == self.identity_name(compare_path)?;
        let baseline = self.load_image(baseline_path)?;
        let compare = self.load_image(compare_path)?;
        Ok(Some(FaceSample::Comparison {
            baseline,
            compare,
            same,
        }))
    }
}

impl Dataset for FaceScrubDataset {
    /// Flat image count in label mode; its square in comparison mode.
    fn len(&self) -> usize {
        match self.kind {
            SampleKind::Label => self.catalog.len(),
            SampleKind::Comparison => pair_count(self.catalog.len()),
        }
    }

    fn get(&self, index: usize) -> Result<Option<FaceSample>> {
        match self.kind {
            SampleKind::Label => self.get_labeled(index),
            SampleKind::Comparison => self.get_comparison(index),
        }
    }
}
