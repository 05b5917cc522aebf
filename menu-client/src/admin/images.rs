use std::path::Path;

use shared::models::UploadedImage;

use crate::{ClientConfig, ClientError, ClientResult, HttpClient};

/// Maximum image size accepted for upload (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats (extension, MIME type)
const SUPPORTED_FORMATS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// MIME type for a supported image file name
pub fn image_content_type(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .find(|(supported, _)| *supported == ext)
        .map(|(_, mime)| *mime)
}

fn validate_image(file_name: &str, size: usize) -> ClientResult<&'static str> {
    let content_type = image_content_type(file_name).ok_or_else(|| {
        ClientError::Validation(format!("Unsupported image format: {file_name}"))
    })?;
    if size == 0 {
        return Err(ClientError::Validation(format!("Image is empty: {file_name}")));
    }
    if size > MAX_IMAGE_SIZE {
        return Err(ClientError::Validation(format!(
            "Image too large: {} bytes (max {}MB)",
            size,
            MAX_IMAGE_SIZE / 1024 / 1024
        )));
    }
    Ok(content_type)
}

/// Upload an in-memory image after checking format and size
pub async fn upload_image_bytes(
    http: &HttpClient,
    file_name: &str,
    bytes: Vec<u8>,
) -> ClientResult<UploadedImage> {
    let content_type = validate_image(file_name, bytes.len())?;
    http.upload_image(file_name, content_type, bytes).await
}

/// Upload an image file; returns the absolute URL to store on the product
pub async fn upload_image_file(
    http: &HttpClient,
    config: &ClientConfig,
    path: &Path,
) -> ClientResult<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ClientError::Validation(format!("Invalid file name: {}", path.display())))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Validation(format!("Cannot read {}: {e}", path.display())))?;

    let uploaded = upload_image_bytes(http, file_name, bytes).await?;
    Ok(config.resolve_url(&uploaded.image_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(image_content_type("tra-dao.JPG"), Some("image/jpeg"));
        assert_eq!(image_content_type("banner.webp"), Some("image/webp"));
        assert_eq!(image_content_type("menu.pdf"), None);
        assert_eq!(image_content_type("noext"), None);
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image("a.png", 1024).is_ok());
        assert!(matches!(validate_image("a.png", 0), Err(ClientError::Validation(_))));
        assert!(matches!(
            validate_image("a.png", MAX_IMAGE_SIZE + 1),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(validate_image("a.bmp", 10), Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected_before_upload() {
        let config = ClientConfig::new("http://127.0.0.1:9");
        let http = HttpClient::new(&config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = upload_image_file(&http, &config, &dir.path().join("missing.png")).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }
}
