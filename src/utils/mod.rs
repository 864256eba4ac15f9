pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{FetchError, FetchResult, ValidationError};
pub use validation::{validate_task, validate_settings};
pub use formats::{SUPPORTED_EXTENSIONS, is_supported_format, is_supported_image};
pub use fs::{dir_exists, ensure_dir};
