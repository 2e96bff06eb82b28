//! Pure filename classification: extension to category, no I/O.

use crate::types::FileKind;

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "xls", "xlsx", "csv", "rtf", "ods", "ppt", "pptx", "odp", "md",
    "html", "htm", "epub", "pages", "fig", "psd", "ai", "indd", "xd", "sketch", "afdesign",
    "afphoto",
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "heic"];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "flv", "wmv", "m4v"];

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma", "opus"];

/// Derive the category and normalized extension from a file name.
///
/// The extension is everything after the last `.`, ASCII-lowercased. Names
/// without a dot, names ending in a dot, and dotfiles like `.gitignore` all
/// classify as `(Other, "")`. Unrecognized extensions keep the extension but
/// classify as `Other`. Total and deterministic.
pub fn classify(name: &str) -> (FileKind, String) {
    let extension = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    };
    (kind_for_extension(&extension), extension)
}

/// Look up the category for an already-normalized extension
pub fn kind_for_extension(extension: &str) -> FileKind {
    if DOCUMENT_EXTENSIONS.contains(&extension) {
        FileKind::Document
    } else if IMAGE_EXTENSIONS.contains(&extension) {
        FileKind::Image
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        FileKind::Video
    } else if AUDIO_EXTENSIONS.contains(&extension) {
        FileKind::Audio
    } else {
        FileKind::Other
    }
}
