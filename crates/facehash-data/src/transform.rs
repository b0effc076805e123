// Image transforms — the ordered preprocessing pipeline applied after decode
//
// Geometric transforms operate on the decoded `DynamicImage` before it is
// tensorized.  `Standardize` operates on the resulting tensor and backs the
// dataset-level `normalize` flag.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::decode::ImageTensor;

/// A transform applied to a decoded image before tensorization.
///
/// The dataset applies its configured transforms in order on every decode,
/// so implementations must be cheap to call repeatedly and `Send + Sync`
/// for parallel loading.
pub trait ImageTransform: Send + Sync {
    fn apply(&self, image: DynamicImage) -> DynamicImage;
}

/// Resize to fixed (width, height) using the Lanczos3 filter.
#[derive(Debug, Clone)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

impl Resize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ImageTransform for Resize {
    fn apply(&self, image: DynamicImage) -> DynamicImage {
        image.resize_exact(self.width, self.height, FilterType::Lanczos3)
    }
}

/// Convert to single-channel grayscale.
#[derive(Debug, Clone)]
pub struct Grayscale;

impl ImageTransform for Grayscale {
    fn apply(&self, image: DynamicImage) -> DynamicImage {
        DynamicImage::ImageLuma8(image.to_luma8())
    }
}

/// Crop a centered (width, height) window, clamped to the image bounds.
#[derive(Debug, Clone)]
pub struct CenterCrop {
    pub width: u32,
    pub height: u32,
}

impl CenterCrop {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ImageTransform for CenterCrop {
    fn apply(&self, image: DynamicImage) -> DynamicImage {
        let (w, h) = image.dimensions();
        let cw = self.width.min(w);
        let ch = self.height.min(h);
        let x = (w - cw) / 2;
        let y = (h - ch) / 2;
        image.crop_imm(x, y, cw, ch)
    }
}

/// Per-channel standardization of a tensorized image: `(v - mean) / std`.
#[derive(Debug, Clone)]
pub struct Standardize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Standardize {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Self {
        Self { mean, std }
    }

    /// Channel statistics of the FaceScrub corpus, measured once over the
    /// full training partition.
    pub fn facescrub() -> Self {
        Self {
            mean: vec![0.6118626050840847, 0.4627732225147951, 0.39181750819165523],
            std: vec![0.24004882860157573, 0.20515205679125115, 0.19287499225344598],
        }
    }

    /// Apply to a [C, H, W] tensor in place.  Channels beyond the provided
    /// statistics are left untouched.
    pub fn apply(&self, tensor: &mut ImageTensor) {
        let [c, h, w] = tensor.shape;
        let plane = h * w;
        for ch in 0..c.min(self.mean.len()).min(self.std.len()) {
            let mean = self.mean[ch];
            let std = self.std[ch];
            for v in &mut tensor.data[ch * plane..(ch + 1) * plane] {
                *v = (*v - mean) / std;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_changes_dimensions() {
        let img = DynamicImage::new_rgb8(8, 6);
        let out = Resize::new(4, 3).apply(img);
        assert_eq!(out.dimensions(), (4, 3));
    }

    #[test]
    fn grayscale_drops_to_one_channel() {
        let img = DynamicImage::new_rgb8(4, 4);
        let out = Grayscale.apply(img);
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn center_crop_clamps_to_bounds() {
        let img = DynamicImage::new_rgb8(10, 10);
        let out = CenterCrop::new(4, 4).apply(img);
        assert_eq!(out.dimensions(), (4, 4));

        let img = DynamicImage::new_rgb8(2, 2);
        let out = CenterCrop::new(4, 4).apply(img);
        assert_eq!(out.dimensions(), (2, 2));
    }

    #[test]
    fn standardize_per_channel() {
        let mut t = ImageTensor {
            data: vec![0.5, 0.5, 1.0, 1.0],
            shape: [2, 1, 2],
        };
        Standardize::new(vec![0.5, 0.0], vec![0.25, 2.0]).apply(&mut t);
        assert_eq!(t.data, vec![0.0, 0.0, 0.5, 0.5]);
    }
}
