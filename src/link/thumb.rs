// SPDX-License-Identifier: MPL-2.0

//! Link card thumbnails: downscaled and re-encoded to fit blob limits.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageError};
use thiserror::Error;

use crate::config::{THUMB_MAX_BYTES, THUMB_MAX_DIMENSION};

#[derive(Debug, Error)]
pub enum ThumbError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] ImageError),

    #[error("Thumbnail is still {0} bytes at the lowest quality")]
    TooLarge(usize),
}

/// A JPEG ready to upload as a link card thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

const QUALITY_STEPS: [u8; 7] = [90, 80, 70, 60, 50, 40, 30];

/// Decode any supported format, fit it within the dimension limit and
/// re-encode as JPEG, lowering quality until it fits the size limit.
pub fn resize_thumbnail(bytes: &[u8]) -> Result<Thumbnail, ThumbError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let img = if width > THUMB_MAX_DIMENSION || height > THUMB_MAX_DIMENSION {
        // Triangle filter - fast and good enough for downscaling
        img.resize(THUMB_MAX_DIMENSION, THUMB_MAX_DIMENSION, FilterType::Triangle)
    } else {
        img
    };

    let (width, height) = img.dimensions();
    let rgb = img.to_rgb8();

    let mut smallest = usize::MAX;
    for quality in QUALITY_STEPS {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
        if out.len() <= THUMB_MAX_BYTES {
            return Ok(Thumbnail {
                bytes: out,
                mime: "image/jpeg",
                width,
                height,
            });
        }
        smallest = smallest.min(out.len());
    }

    Err(ThumbError::TooLarge(smallest))
}
