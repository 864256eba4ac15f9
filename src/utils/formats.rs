/// Extensions picked up from a watch folder. Also the set of accepted output formats.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "bmp", "tiff"];

/// Check whether a format name (or bare extension) is one we handle
pub fn is_supported_format(name: &str) -> bool {
    let name = name.to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&name.as_str())
}

/// Check whether a file name ends in a supported image extension (case-insensitive)
pub fn is_supported_image(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| lower.strip_suffix(ext).is_some_and(|stem| stem.ends_with('.')))
}
