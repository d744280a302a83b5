//! MIME helpers for uploaded documents.
//!
//! Used by the upload validator to compare declared types against the allow-list.

/// Lower-cased text after the last `.`, or `""` when there is none.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Detect MIME type by file extension.
pub fn detect_mime_type(filename: &str) -> &'static str {
    match file_extension(filename).as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",

        // Documents
        "pdf" => "application/pdf",

        _ => "application/octet-stream",
    }
}

/// The `type/subtype` part of a Content-Type header, lower-cased, parameters dropped.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime_essence(mime).starts_with("image/")
}
