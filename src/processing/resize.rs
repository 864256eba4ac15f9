//! Resize to fixed target dimensions.

use image::DynamicImage;
use image::imageops::FilterType;
use crate::utils::{FetchResult, ValidationError};

/// Filter used for every resize; bicubic.
const FILTER: FilterType = FilterType::CatmullRom;

/// Resizes `image` to exactly `width` × `height`.
///
/// Aspect ratio is not preserved: images are stretched to fit the target box.
pub fn resize_exact(image: &DynamicImage, width: u32, height: u32) -> FetchResult<DynamicImage> {
    check_dimensions(width, height)?;

    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    Ok(image.resize_exact(width, height, FILTER))
}

pub fn check_dimensions(width: u32, height: u32) -> FetchResult<()> {
    if width == 0 || height == 0 {
        return Err(ValidationError::Dimensions { width, height }.into());
    }
    Ok(())
}
