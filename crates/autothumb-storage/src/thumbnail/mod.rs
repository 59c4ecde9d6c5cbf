//! Thumbnail rendering: resize geometry, decoding, encoding, and naming.

pub mod generator;
pub mod geometry;

pub use generator::ThumbnailGenerator;
pub use geometry::{CropBox, ResizePlan};

use autothumb_core::types::thumbnail::OutputFormat;

/// Tag naming the record field a thumbnail belongs to: `{record_id}_{field}`
/// with anything outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn owner_tag(record_id: &str, field: &str) -> String {
    format!("{}_{}", path_safe(record_id), path_safe(field))
}

/// Storage path for the thumbnail of `source_path` under `upload_to`.
///
/// The file is named `{stem}_{owner}.{ext}` so that records whose sources
/// share a stem never write the same file. The source extension is kept
/// when it already names the output format; otherwise the format's own
/// extension is used.
pub fn thumbnail_path(
    upload_to: &str,
    source_path: &str,
    owner: &str,
    format: OutputFormat,
) -> String {
    let file_name = source_path.rsplit('/').next().unwrap_or(source_path);
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    let ext = match ext {
        Some(ext) if ext_names(ext, format) => ext.to_string(),
        _ => default_extension(format).to_string(),
    };

    let dir = upload_to.trim_end_matches('/');
    if dir.is_empty() {
        format!("{stem}_{owner}.{ext}")
    } else {
        format!("{dir}/{stem}_{owner}.{ext}")
    }
}

/// Whether `path` is a thumbnail [`thumbnail_path`] produced for `owner`
/// under `upload_to`. Anything else was put there by someone else and must
/// not be deleted on the owner's behalf.
pub fn is_owned_thumbnail(upload_to: &str, path: &str, owner: &str) -> bool {
    let dir = upload_to.trim_end_matches('/');
    let name = if dir.is_empty() {
        path
    } else {
        match path.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
            Some(name) => name,
            None => return false,
        }
    };
    if name.contains('/') {
        return false;
    }
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.strip_suffix(owner)
        .is_some_and(|rest| rest.len() > 1 && rest.ends_with('_'))
}

fn path_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn ext_names(ext: &str, format: OutputFormat) -> bool {
    let ext = ext.to_ascii_lowercase();
    match format {
        OutputFormat::Jpeg => ext == "jpg" || ext == "jpeg",
        OutputFormat::Png => ext == "png",
        OutputFormat::WebP => ext == "webp",
    }
}

fn default_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Jpeg => "jpg",
        OutputFormat::Png => "png",
        OutputFormat::WebP => "webp",
    }
}
