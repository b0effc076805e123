// DataLoader — shuffling, batching, and ABSENT filtering
//
// The loader turns a Dataset into collated batches.  Samples that resolved
// to `None` (label mode's skip-on-error) are filtered out before collation;
// a batch left empty by that filter is an error, because silently yielding
// an empty batch would stall a training step.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};
use rayon::prelude::*;

use crate::dataset::{Dataset, FaceSample};
use crate::error::{Error, Result};

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for sample fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl LoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

// Batch types

/// A collated batch of labeled samples.
#[derive(Debug, Clone)]
pub struct LabeledBatch {
    /// Stacked image data, `[len, C, H, W]` flattened row-major.
    pub images: Vec<f64>,
    /// Shape of one image, `[C, H, W]`.
    pub image_shape: [usize; 3],
    /// Identity index per surviving sample.
    pub identities: Vec<usize>,
}

impl LabeledBatch {
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// A collated batch of comparison samples.
#[derive(Debug, Clone)]
pub struct ComparisonBatch {
    /// Stacked baseline images, `[len, C, H, W]` flattened row-major.
    pub baselines: Vec<f64>,
    /// Stacked comparison images, same layout.
    pub compares: Vec<f64>,
    /// Shape of one image, `[C, H, W]`.
    pub image_shape: [usize; 3],
    /// 1 when both images belong to the same identity, else 0.
    pub same: Vec<u8>,
}

impl ComparisonBatch {
    pub fn len(&self) -> usize {
        self.same.len()
    }

    pub fn is_empty(&self) -> bool {
        self.same.is_empty()
    }
}

/// One collated batch, shaped by the dataset's sample kind.
#[derive(Debug, Clone)]
pub enum Batch {
    Labeled(LabeledBatch),
    Comparison(ComparisonBatch),
}

/// Collate resolved samples into one batch, dropping ABSENT entries.
///
/// All surviving samples must share one kind and one image shape —
/// configure a `Resize` transform on the dataset when source images vary.
/// A batch with no surviving samples is an `EmptyBatch` error.
pub fn collate(samples: Vec<Option<FaceSample>>) -> Result<Batch> {
    let samples: Vec<FaceSample> = samples.into_iter().flatten().collect();
    let Some(first) = samples.first() else {
        return Err(Error::EmptyBatch);
    };
    match first {
        FaceSample::Labeled { image, .. } => {
            let image_shape = image.shape;
            let mut images = Vec::with_capacity(samples.len() * image.data.len());
            let mut identities = Vec::with_capacity(samples.len());
            for sample in &samples {
                let FaceSample::Labeled { image, identity } = sample else {
                    return Err(Error::InvalidConfiguration(
                        "cannot collate mixed sample kinds".into(),
                    ));
                };
                images.extend_from_slice(&image.data);
                identities.push(*identity);
            }
            Ok(Batch::Labeled(LabeledBatch {
                images,
                image_shape,
                identities,
            }))
        }
        FaceSample::Comparison { baseline, .. } => {
            let image_shape = baseline.shape;
            let mut baselines = Vec::with_capacity(samples.len() * baseline.data.len());
            let mut compares = Vec::with_capacity(samples.len() * baseline.data.len());
            let mut same_flags = Vec::with_capacity(samples.len());
            for sample in &samples {
                let FaceSample::Comparison {
                    baseline,
                    compare,
                    same,
                } = sample
                else {
                    return Err(Error::InvalidConfiguration(
                        "cannot collate mixed sample kinds".into(),
                    ));
                };
                baselines.extend_from_slice(&baseline.data);
                compares.extend_from_slice(&compare.data);
                same_flags.push(u8::from(*same));
            }
            Ok(Batch::Comparison(ComparisonBatch {
                baselines,
                compares,
                image_shape,
                same: same_flags,
            }))
        }
    }
}

// DataLoader

/// A DataLoader wraps a Dataset and produces collated batches.
pub struct DataLoader<'a> {
    dataset: &'a dyn Dataset,
    config: LoaderConfig,
    indices: Vec<usize>,
}

impl<'a> DataLoader<'a> {
    /// Create a new DataLoader over a dataset.
    pub fn new(dataset: &'a dyn Dataset, config: LoaderConfig) -> Self {
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Self {
            dataset,
            config,
            indices,
        }
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (called at the start of each epoch).
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            match self.config.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    self.indices.shuffle(&mut rng);
                }
                None => {
                    let mut rng = thread_rng();
                    self.indices.shuffle(&mut rng);
                }
            }
        }
    }

    /// Fetch a slice of samples, in parallel when workers are configured.
    fn fetch_samples(&self, indices: &[usize]) -> Result<Vec<Option<FaceSample>>> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.dataset.get(i)).collect()
        }
    }

    /// Iterate over one epoch of collated batches.
    pub fn iter_batches(&mut self) -> BatchIterator<'_, 'a> {
        self.reshuffle();
        BatchIterator {
            loader: self,
            batch_idx: 0,
        }
    }
}

/// Iterator that yields one collated batch at a time.
pub struct BatchIterator<'l, 'a> {
    loader: &'l DataLoader<'a>,
    batch_idx: usize,
}

impl Iterator for BatchIterator<'_, '_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let bs = self.loader.config.batch_size;
        let n = self.loader.dataset.len();
        let start = self.batch_idx * bs;

        if start >= n {
            return None;
        }
        if self.loader.config.drop_last && start + bs > n {
            return None;
        }

        let end = (start + bs).min(n);
        self.batch_idx += 1;

        let batch_indices: Vec<usize> = (start..end).map(|i| self.loader.indices[i]).collect();
        let samples = match self.loader.fetch_samples(&batch_indices) {
            Ok(s) => s,
            Err(e) => return Some(Err(e)),
        };
        Some(collate(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageTensor;
    use crate::error::Result;

    /// Toy dataset: every index yields a 1x1x1 "image" holding the index,
    /// except the listed indices, which resolve to ABSENT.
    struct ToyDataset {
        n: usize,
        missing: Vec<usize>,
    }

    impl Dataset for ToyDataset {
        fn len(&self) -> usize {
            self.n
        }

        fn get(&self, index: usize) -> Result<Option<FaceSample>> {
            if self.missing.contains(&index) {
                return Ok(None);
            }
            Ok(Some(FaceSample::Labeled {
                image: ImageTensor {
                    data: vec![index as f64],
                    shape: [1, 1, 1],
                },
                identity: index % 3,
            }))
        }
    }

    #[test]
    fn num_batches_rounding() {
        let ds = ToyDataset {
            n: 10,
            missing: vec![],
        };
        let config = LoaderConfig::default().batch_size(3).shuffle(false);
        let loader = DataLoader::new(&ds, config);
        assert_eq!(loader.num_batches(), 4);

        let config = LoaderConfig::default()
            .batch_size(3)
            .shuffle(false)
            .drop_last(true);
        let loader = DataLoader::new(&ds, config);
        assert_eq!(loader.num_batches(), 3);
    }

    #[test]
    fn batches_filter_absent() {
        let ds = ToyDataset {
            n: 6,
            missing: vec![1, 4],
        };
        let config = LoaderConfig::default().batch_size(3).shuffle(false);
        let mut loader = DataLoader::new(&ds, config);

        let batches: Vec<Batch> = loader.iter_batches().map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 2);

        let Batch::Labeled(b0) = &batches[0] else {
            panic!("expected labeled batch");
        };
        assert_eq!(b0.len(), 2);
        assert_eq!(b0.images, vec![0.0, 2.0]);

        let Batch::Labeled(b1) = &batches[1] else {
            panic!("expected labeled batch");
        };
        assert_eq!(b1.images, vec![3.0, 5.0]);
    }

    #[test]
    fn all_absent_batch_is_error() {
        let ds = ToyDataset {
            n: 4,
            missing: vec![0, 1, 2, 3],
        };
        let config = LoaderConfig::default().batch_size(4).shuffle(false);
        let mut loader = DataLoader::new(&ds, config);

        let result = loader.iter_batches().next().unwrap();
        assert!(matches!(result, Err(Error::EmptyBatch)));
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let ds = ToyDataset {
            n: 50,
            missing: vec![],
        };
        let config = LoaderConfig::default().batch_size(50).seed(123);

        let mut a = DataLoader::new(&ds, config.clone());
        let mut b = DataLoader::new(&ds, config);
        let Some(Ok(Batch::Labeled(ba))) = a.iter_batches().next() else {
            panic!("expected a batch");
        };
        let Some(Ok(Batch::Labeled(bb))) = b.iter_batches().next() else {
            panic!("expected a batch");
        };
        assert_eq!(ba.images, bb.images);
    }

    #[test]
    fn collate_comparison_batches() {
        let pair = |a: f64, b: f64, same: bool| {
            Some(FaceSample::Comparison {
                baseline: ImageTensor {
                    data: vec![a],
                    shape: [1, 1, 1],
                },
                compare: ImageTensor {
                    data: vec![b],
                    shape: [1, 1, 1],
                },
                same,
            })
        };
        let batch = collate(vec![pair(1.0, 2.0, true), None, pair(3.0, 4.0, false)]).unwrap();
        let Batch::Comparison(b) = batch else {
            panic!("expected comparison batch");
        };
        assert_eq!(b.len(), 2);
        assert_eq!(b.baselines, vec![1.0, 3.0]);
        assert_eq!(b.compares, vec![2.0, 4.0]);
        assert_eq!(b.same, vec![1, 0]);
    }

    #[test]
    fn collate_nothing_is_empty_batch() {
        assert!(matches!(collate(vec![]), Err(Error::EmptyBatch)));
        assert!(matches!(collate(vec![None, None]), Err(Error::EmptyBatch)));
    }
}
