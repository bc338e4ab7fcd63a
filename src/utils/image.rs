use base64::{engine::general_purpose::STANDARD, Engine};
use std::env;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::errors::ApiError;

/// Parse a `data:image/<ext>;base64,<payload>` string into an extension and
/// the decoded bytes. A bare base64 string (no data-URI prefix) is accepted
/// and treated as PNG, matching the original API's lenient field.
pub fn parse_data_uri(data: &str) -> Result<(String, Vec<u8>), ApiError> {
    let (ext, payload) = match data.strip_prefix("data:image/") {
        Some(rest) => {
            let (ext, payload) = rest.split_once(";base64,").ok_or_else(|| {
                ApiError::Validation("Invalid image data URI".to_string())
            })?;
            (ext.to_string(), payload)
        }
        None => ("png".to_string(), data),
    };

    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::Validation("Invalid image format".to_string()));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ApiError::Validation("Invalid base64 image data".to_string()))?;

    if bytes.is_empty() {
        return Err(ApiError::Validation("Empty image data".to_string()));
    }

    Ok((ext, bytes))
}

/// Decode a base64 image and store it under `MEDIA_ROOT/<subdir>/` with a
/// random file name. Returns the relative path stored on the entity.
pub fn save_base64_image(data: &str, subdir: &str) -> Result<String, ApiError> {
    let (ext, bytes) = parse_data_uri(data)?;

    let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
    let dir = Path::new(&media_root).join(subdir);
    fs::create_dir_all(&dir)
        .map_err(|e| ApiError::Internal(format!("Failed to create media dir: {}", e)))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    fs::write(dir.join(&file_name), bytes)
        .map_err(|e| ApiError::Internal(format!("Failed to write image: {}", e)))?;

    Ok(format!("{}/{}", subdir, file_name))
}

/// Remove a previously stored image file. Missing files are ignored: the
/// reference is already gone from the entity and that is what matters.
pub fn delete_image(relative_path: &str) {
    let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
    let _ = fs::remove_file(Path::new(&media_root).join(relative_path));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_uri() {
        // "hi" in base64
        let (ext, bytes) = parse_data_uri("data:image/jpeg;base64,aGk=").unwrap();
        assert_eq!(ext, "jpeg");
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn test_parse_bare_base64_defaults_to_png() {
        let (ext, bytes) = parse_data_uri("aGk=").unwrap();
        assert_eq!(ext, "png");
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_data_uri("data:image/png;base64,!!!").is_err());
        assert!(parse_data_uri("data:image/;base64,aGk=").is_err());
        assert!(parse_data_uri("").is_err());
    }
}
