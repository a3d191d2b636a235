//! Image payloads arrive as `data:<mime>;base64,<payload>` URLs. They are
//! stored split into payload and MIME type and re-joined on the way out.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::{IMAGE_MIME_PREFIX, MAX_IMAGE_BYTES};
use crate::error::AppError;

/// A stored image: Base64 payload plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub data: String,
    pub mime: String,
}

impl StoredImage {
    /// Split and validate a `data:` URL
    pub fn from_data_url(url: &str) -> Result<Self, AppError> {
        let invalid = || AppError::BadRequest("Invalid image data".into());

        let rest = url.trim().strip_prefix("data:").ok_or_else(invalid)?;
        let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
        let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;

        if !mime.starts_with(IMAGE_MIME_PREFIX) || mime.len() == IMAGE_MIME_PREFIX.len() {
            return Err(AppError::BadRequest("Only image uploads are allowed".into()));
        }

        let decoded = STANDARD.decode(payload).map_err(|_| invalid())?;
        if decoded.is_empty() {
            return Err(invalid());
        }
        if decoded.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image exceeds {} MB limit",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }

        Ok(Self {
            data: payload.to_string(),
            mime: mime.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Parse an optional, possibly blank, image field
pub fn parse_optional(url: Option<&str>) -> Result<Option<StoredImage>, AppError> {
    match url.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) => StoredImage::from_data_url(url).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_splits_data_url() {
        let image = StoredImage::from_data_url(PNG).unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
        assert_eq!(image.to_data_url(), PNG);
    }

    #[test]
    fn test_rejects_malformed_urls() {
        for bad in [
            "iVBORw0KGgo=",
            "data:image/png,iVBORw0KGgo=",
            "data:image/png;base64",
            "data:image/png;base64,not base64!",
            "data:image/png;base64,",
        ] {
            assert!(
                matches!(StoredImage::from_data_url(bad), Err(AppError::BadRequest(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_non_image_mime() {
        let err = StoredImage::from_data_url("data:text/html;base64,PGI+").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("image")));
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let payload = STANDARD.encode(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let url = format!("data:image/jpeg;base64,{payload}");
        assert!(StoredImage::from_data_url(&url).is_err());
    }

    #[test]
    fn test_parse_optional_treats_blank_as_absent() {
        assert_eq!(parse_optional(None).unwrap(), None);
        assert_eq!(parse_optional(Some("  ")).unwrap(), None);
        assert!(parse_optional(Some(PNG)).unwrap().is_some());
    }
}
