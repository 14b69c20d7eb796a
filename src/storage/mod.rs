// Object storage abstraction for uploaded item images

pub mod s3;

pub use s3::S3Backend;

use crate::error::AppResult;

/// Storage backend interface (S3-compatible services).
#[tonic::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Uploads an object and returns its storage path.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<String>;

    /// Deletes an object.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Bucket name.
    fn bucket(&self) -> &str;
}

/// Recovers the object key from a stored image URL so a replaced image can
/// be deleted. Returns None for URLs this deployment did not produce.
pub fn key_from_image_url(
    image_url: &str,
    bucket: &str,
    asset_base_url: Option<&str>,
) -> Option<String> {
    if let Some(base) = asset_base_url {
        let prefix = format!("{}/", base.trim_end_matches('/'));
        if let Some(key) = image_url.strip_prefix(&prefix) {
            return Some(key.to_string());
        }
    }
    let s3_prefix = format!("s3://{}/", bucket);
    image_url.strip_prefix(&s3_prefix).map(|key| key.to_string())
}

/// Maps an image content type to the file extension used in object keys.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[test]
    fn test_key_from_asset_url() {
        let key = key_from_image_url(
            "https://assets.example.com/items/org-1/abc.png",
            "bins",
            Some("https://assets.example.com"),
        );
        assert_eq!(key.as_deref(), Some("items/org-1/abc.png"));

        // Trailing slash on the configured base is tolerated
        let key = key_from_image_url(
            "https://assets.example.com/items/org-1/abc.png",
            "bins",
            Some("https://assets.example.com/"),
        );
        assert_eq!(key.as_deref(), Some("items/org-1/abc.png"));
    }

    #[test]
    fn test_key_from_s3_url() {
        let key = key_from_image_url("s3://bins/items/org-1/abc.png", "bins", None);
        assert_eq!(key.as_deref(), Some("items/org-1/abc.png"));
    }

    #[test]
    fn test_foreign_urls_yield_no_key() {
        assert_eq!(
            key_from_image_url("https://elsewhere.example.com/pic.png", "bins", None),
            None
        );
        assert_eq!(
            key_from_image_url("s3://other-bucket/items/abc.png", "bins", None),
            None
        );
    }
}
