//! Storage key derivation.
//!
//! Keys are hierarchical strings `{kind_prefix}/{owner_id}/{slot}/{uuid}{ext}`,
//! e.g. `units/7/profileImage/9f2c….png`. The ledger stores full URLs, so the
//! reverse direction (key from stored URL) is needed for deletion.

use std::path::Path;

use atlas_core::{ContentKind, Id};
use percent_encoding::percent_decode_str;
use url::Url;
use uuid::Uuid;

use crate::model::AssetSlot;

/// Build a unique storage key for an attachment.
pub fn asset_key(kind: ContentKind, owner_id: Id, slot: AssetSlot, filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s.to_lowercase()))
        .unwrap_or_default();

    format!(
        "{}/{}/{}/{}{}",
        kind.key_prefix(),
        owner_id,
        slot.as_str(),
        Uuid::new_v4(),
        ext
    )
}

/// Prefix under which all gallery keys for an owner live.
pub fn gallery_prefix(kind: ContentKind, owner_id: Id) -> String {
    format!("{}/{}/{}/", kind.key_prefix(), owner_id, AssetSlot::Gallery)
}

/// Prefix under which all keys for an owner live (any slot).
pub fn owner_prefix(kind: ContentKind, owner_id: Id) -> String {
    format!("{}/{}/", kind.key_prefix(), owner_id)
}

/// Content type for a filename, falling back to octet-stream.
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

/// Recover the storage key from a stored asset URL.
///
/// The key is the URL path with the leading slash stripped and percent
/// escapes decoded. Returns `None` for strings that are not absolute URLs.
pub fn key_from_url(file_url: &str) -> Option<String> {
    let url = Url::parse(file_url).ok()?;
    let path = url.path().strip_prefix('/').unwrap_or(url.path());
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_shape() {
        let key = asset_key(ContentKind::Unit, 42, AssetSlot::ProfileImage, "photo.PNG");
        assert!(key.starts_with("units/42/profileImage/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_asset_key_without_extension() {
        let key = asset_key(ContentKind::Post, 3, AssetSlot::Gallery, "noext");
        assert!(key.starts_with("posts/3/gallery/"));
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_key_from_url() {
        let key = key_from_url("https://bucket.s3.amazonaws.com/units/1/gallery/a%20b.png");
        assert_eq!(key.as_deref(), Some("units/1/gallery/a b.png"));
    }

    #[test]
    fn test_key_from_url_rejects_non_urls() {
        assert_eq!(key_from_url("units/1/gallery/a.png"), None);
        assert_eq!(key_from_url("https://host.example/"), None);
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for("photo.png"), "image/png");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(gallery_prefix(ContentKind::Class, 9), "classes/9/gallery/");
        assert_eq!(owner_prefix(ContentKind::Unit, 9), "units/9/");
    }
}
