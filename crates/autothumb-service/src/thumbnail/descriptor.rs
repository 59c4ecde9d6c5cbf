//! Source image descriptors for change comparison.

use autothumb_core::result::AppResult;
use autothumb_core::traits::storage::StorageProvider;
use autothumb_core::types::thumbnail::SourceImageDescriptor;

/// Describe the stored source at `path`.
///
/// The byte size comes from storage metadata. With `fingerprint` set the
/// whole source is read and hashed.
pub async fn describe_source(
    storage: &dyn StorageProvider,
    path: &str,
    fingerprint: bool,
) -> AppResult<SourceImageDescriptor> {
    let meta = storage.metadata(path).await?;
    let content_fingerprint = if fingerprint {
        let bytes = storage.read_bytes(path).await?;
        Some(content_hash(meta.size_bytes, &bytes))
    } else {
        None
    };

    Ok(SourceImageDescriptor {
        name: path.to_string(),
        byte_size: meta.size_bytes,
        content_fingerprint,
    })
}

/// BLAKE3 over the length prefix and the content, first 16 hex chars.
fn content_hash(size: u64, bytes: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&size.to_le_bytes());
    hasher.update(bytes);
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..16].to_string()
}
