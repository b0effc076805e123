// Image decoding — from file paths to pixel tensors
//
// Decoding is delegated to the `image` crate.  A decoded image becomes an
// `ImageTensor`: planar [C, H, W] f64 data in [0, 1], the layout the
// training side consumes directly.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// A decoded image as a planar [C, H, W] buffer with values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    /// Pixel data, channel-first, row-major within each channel plane.
    pub data: Vec<f64>,
    /// [channels, height, width]
    pub shape: [usize; 3],
}

impl ImageTensor {
    pub fn channels(&self) -> usize {
        self.shape[0]
    }

    pub fn height(&self) -> usize {
        self.shape[1]
    }

    pub fn width(&self) -> usize {
        self.shape[2]
    }
}

/// Decode the image at `path`.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| Error::ImageDecode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Convert a decoded image to a planar [C, H, W] tensor in [0, 1].
///
/// Grayscale images produce a single channel; everything else is read as
/// RGB, rearranged from interleaved [H, W, C] to channel-first planes.
pub fn tensorize(img: &DynamicImage) -> ImageTensor {
    let (w, h) = img.dimensions();
    let npix = (w * h) as usize;
    match img {
        DynamicImage::ImageLuma8(gray) => {
            let data = gray.as_raw().iter().map(|&v| v as f64 / 255.0).collect();
            ImageTensor {
                data,
                shape: [1, h as usize, w as usize],
            }
        }
        _ => {
            let rgb = img.to_rgb8();
            let raw = rgb.as_raw();
            let mut data = vec![0.0f64; 3 * npix];
            for i in 0..npix {
                data[i] = raw[i * 3] as f64 / 255.0;
                data[npix + i] = raw[i * 3 + 1] as f64 / 255.0;
                data[2 * npix + i] = raw[i * 3 + 2] as f64 / 255.0;
            }
            ImageTensor {
                data,
                shape: [3, h as usize, w as usize],
            }
        }
    }
}
