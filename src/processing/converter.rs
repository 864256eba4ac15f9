//! Decode → resize → encode → verify, for one source image.
//!
//! Blocking: callers on the async runtime run this inside
//! `tokio::task::spawn_blocking`.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use crate::utils::{FetchError, FetchResult};

use super::formats::{OutputFormat, prepare_for};
use super::resize::{check_dimensions, resize_exact};

/// A conversion that was written and verified on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Bytes written to `output`
    pub bytes_written: u64,
}

/// Converts `source` into `destination`, resized to exactly `width` × `height`.
///
/// Succeeds only when the output file is present after the write. The source
/// is never touched here.
pub fn convert(
    source: &Path,
    destination: &Path,
    width: u32,
    height: u32,
    format: OutputFormat,
) -> FetchResult<Conversion> {
    check_dimensions(width, height)?;

    let image = decode(source)?;
    debug!(
        "Loaded '{}': {}×{}",
        source.display(),
        image.width(),
        image.height()
    );

    let resized = resize_exact(&image, width, height)?;
    let prepared = prepare_for(resized, format);
    let bytes = encode(&prepared, format)?;

    write_output(destination, &bytes)?;

    // The existence check is what gates deleting the source.
    if !destination.is_file() {
        return Err(FetchError::Verification(destination.to_path_buf()));
    }

    debug!(
        "'{}' → '{}' ({} bytes)",
        source.display(),
        destination.display(),
        bytes.len()
    );

    Ok(Conversion {
        source: source.to_path_buf(),
        output: destination.to_path_buf(),
        bytes_written: bytes.len() as u64,
    })
}

/// Opens and decodes an image, sniffing the format from content rather than extension.
pub fn decode(source: &Path) -> FetchResult<DynamicImage> {
    ImageReader::open(source)
        .map_err(|e| FetchError::decode(format!("Cannot open '{}': {e}", source.display())))?
        .with_guessed_format()
        .map_err(|e| FetchError::decode(format!("Cannot read '{}': {e}", source.display())))?
        .decode()
        .map_err(|e| FetchError::decode(format!("Failed to decode '{}': {e}", source.display())))
}

fn encode(image: &DynamicImage, format: OutputFormat) -> FetchResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format.image_format())
        .map_err(|e| FetchError::encode(format!("{format:?} encode failed: {e}")))?;
    Ok(buffer.into_inner())
}

// Encoding happened in memory, so the only partial output possible is a
// short write; that file is removed before reporting the error.
fn write_output(destination: &Path, bytes: &[u8]) -> FetchResult<()> {
    if let Err(e) = std::fs::write(destination, bytes) {
        let _ = std::fs::remove_file(destination);
        return Err(FetchError::encode(format!(
            "Cannot write '{}': {e}",
            destination.display()
        )));
    }
    Ok(())
}
