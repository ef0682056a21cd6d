//! Image pair I/O operations service
//!
//! This module keeps decoding and encoding out of the batch loop, so the loop
//! only deals with in-memory buffers and contained per-item errors.

use crate::error::{MergeError, Result};
use image::{DynamicImage, GrayImage, ImageError, ImageFormat, ImageReader, RgbImage};
use std::fmt;
use std::path::Path;

/// Which half of an image/mask pair a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRole {
    Image,
    Mask,
}

impl fmt::Display for PairRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Mask => write!(f, "mask"),
        }
    }
}

/// A decoded colour image and its single-channel mask
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub image: RgbImage,
    pub mask: GrayImage,
}

impl ImagePair {
    /// Whether image and mask have identical width and height
    #[must_use]
    pub fn dimensions_match(&self) -> bool {
        self.image.dimensions() == self.mask.dimensions()
    }

    /// Fail with [`MergeError::DimensionMismatch`] unless the sizes agree
    pub fn ensure_same_dimensions(&self) -> Result<()> {
        if self.dimensions_match() {
            Ok(())
        } else {
            Err(MergeError::DimensionMismatch {
                image: self.image.dimensions(),
                mask: self.mask.dimensions(),
            })
        }
    }
}

/// Service for loading image/mask pairs and writing composites
pub struct ImagePairLoader;

impl ImagePairLoader {
    /// Load a file as a 3-channel RGB image
    ///
    /// Alpha is discarded and grayscale sources are expanded to three channels.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use mask_merger::services::ImagePairLoader;
    ///
    /// let image = ImagePairLoader::load_color_image("photos/IMG_0001.JPG")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_color_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
        let path_ref = path.as_ref();
        let decoded = Self::decode(path_ref).map_err(|source| MergeError::Load {
            role: PairRole::Image,
            path: path_ref.to_path_buf(),
            source,
        })?;
        Ok(decoded.into_rgb8())
    }

    /// Load a file as a single-channel 8-bit mask
    pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
        let path_ref = path.as_ref();
        let decoded = Self::decode(path_ref).map_err(|source| MergeError::Load {
            role: PairRole::Mask,
            path: path_ref.to_path_buf(),
            source,
        })?;
        Ok(decoded.into_luma8())
    }

    /// Load an image and its mask
    ///
    /// The returned error is [`MergeError::Load`] naming whichever file failed
    /// first; the image is tried before the mask.
    pub fn load_pair<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, mask_path: Q) -> Result<ImagePair> {
        let image = Self::load_color_image(image_path)?;
        let mask = Self::load_mask(mask_path)?;
        Ok(ImagePair { image, mask })
    }

    /// Write an RGB image as PNG
    pub fn save_png<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        image
            .save_with_format(path_ref, ImageFormat::Png)
            .map_err(|source| MergeError::Save {
                path: path_ref.to_path_buf(),
                source,
            })?;
        log::debug!("Wrote {}", path_ref.display());
        Ok(())
    }

    // Content sniffing first, extension as fallback: camera exports are not
    // always what their suffix claims.
    fn decode(path: &Path) -> std::result::Result<DynamicImage, ImageError> {
        let reader = ImageReader::open(path)
            .map_err(ImageError::IoError)?
            .with_guessed_format()
            .map_err(ImageError::IoError)?;
        log::debug!("Decoding {} as {:?}", path.display(), reader.format());
        reader.decode()
    }
}
