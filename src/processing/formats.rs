//! Maps task format names to encoders and prepares pixel data for each encoder.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Encoders an output can be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Resolves a format name. Anything unrecognised encodes as JPEG.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "png" => Self::Png,
            "webp" => Self::WebP,
            "bmp" => Self::Bmp,
            "tiff" => Self::Tiff,
            // jpg, jpeg and the fallback
            _ => Self::Jpeg,
        }
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::WebP => &["webp"],
            Self::Bmp => &["bmp"],
            Self::Tiff => &["tiff"],
        }
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &str {
        self.extensions()[0]
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::WebP => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Converts `image` into a pixel layout the encoder for `format` accepts.
///
/// JPEG has no alpha: transparent sources are composited onto white.
/// Everything else keeps its channels, only changing the layout where the
/// encoder cannot store it (TIFF has no grey+alpha, so those widen to RGBA).
pub fn prepare_for(image: DynamicImage, format: OutputFormat) -> DynamicImage {
    match format {
        OutputFormat::Jpeg => {
            if image.color().has_alpha() {
                flatten_onto_white(&image)
            } else if matches!(image, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) {
                image
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8())
            }
        }
        OutputFormat::Bmp | OutputFormat::WebP => match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        },
        OutputFormat::Png => match image {
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(image.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(image.to_rgba16()),
            other => other,
        },
        OutputFormat::Tiff => match image {
            DynamicImage::ImageLumaA8(_) => DynamicImage::ImageRgba8(image.to_rgba8()),
            DynamicImage::ImageLumaA16(_) => DynamicImage::ImageRgba16(image.to_rgba16()),
            other => other,
        },
    }
}

/// Composites `image` onto an opaque white background, using its alpha as the mask.
pub fn flatten_onto_white(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        flat.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    DynamicImage::ImageRgb8(flat)
}
