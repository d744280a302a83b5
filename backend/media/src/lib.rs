//! Upload validation and image handling for the formlens gateway.

pub mod image;
pub mod mime_detect;
pub mod upload;

pub use crate::image::{JPEG_QUALITY, PreparedImage, prepare_for_vision};
pub use mime_detect::{detect_mime_type, file_extension, is_image, mime_essence};
pub use upload::{AcceptedUpload, DeclaredFile, UploadValidator, sanitize_filename};
