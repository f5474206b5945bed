use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{CardError, Result};

pub const PNG_MIME: &str = "image/png";
pub const SVG_MIME: &str = "image/svg+xml";
pub const PDF_MIME: &str = "application/pdf";

/// Where an image placed on the card comes from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// An inline `data:` URL, kept verbatim until the surface decodes it.
    Data(String),
    Remote(String),
    File(PathBuf),
}

impl ImageRef {
    /// Classifies a logo reference. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("data:") {
            Some(ImageRef::Data(value.to_string()))
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(ImageRef::Remote(value.to_string()))
        } else {
            let path = value.strip_prefix("file://").unwrap_or(value);
            Some(ImageRef::File(PathBuf::from(path)))
        }
    }

    pub fn from_png(bytes: &[u8]) -> Self {
        ImageRef::Data(format!("data:{};base64,{}", PNG_MIME, BASE64.encode(bytes)))
    }

    /// Short human-readable location used in logs and errors.
    pub fn location(&self) -> String {
        match self {
            ImageRef::Data(url) => {
                let header = url.split(',').next().unwrap_or("data:");
                format!("{}, ({} bytes)", header, url.len())
            }
            ImageRef::Remote(url) => url.clone(),
            ImageRef::File(path) => path.display().to_string(),
        }
    }
}

/// Decoded image bytes ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Decodes a base64 `data:` URL into its mime type and payload.
pub fn decode_data_url(url: &str) -> Result<ImageData> {
    let fail = |reason: &str| CardError::ImageLoad {
        location: ImageRef::Data(url.to_string()).location(),
        reason: reason.to_string(),
    };
    let rest = url
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &url[5..])
        .ok_or_else(|| fail("not a data url"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| fail("missing payload"))?;
    let mut parts = header.split(';');
    let declared = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !parts.any(|part| part.trim().eq_ignore_ascii_case("base64")) {
        return Err(fail("only base64 data urls are supported"));
    }
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|err| fail(&format!("invalid base64: {}", err)))?;
    let declared = if declared.is_empty() {
        None
    } else {
        Some(declared.as_str())
    };
    let mime = detect_image_mime(&bytes, declared, None).ok_or_else(|| fail("not an image"))?;
    Ok(ImageData { mime, bytes })
}

/// Resolves the image mime type from content, then the declared type, then the
/// file extension. Returns `None` when the bytes are not an image.
pub fn detect_image_mime(bytes: &[u8], declared: Option<&str>, path: Option<&Path>) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    if let Some(kind) = infer::get(bytes) {
        let detected = kind.mime_type();
        if detected.starts_with("image/") {
            return Some(detected.to_string());
        }
    }
    if let Some(declared) = declared {
        let declared = declared.split(';').next().unwrap_or_default().trim();
        if declared.eq_ignore_ascii_case(SVG_MIME) || looks_like_svg(bytes) {
            return Some(SVG_MIME.to_string());
        }
    }
    let ext = path
        .and_then(|path| path.extension())
        .and_then(|value| value.to_str())
        .map(|value| value.to_lowercase());
    if ext.as_deref() == Some("svg") || looks_like_svg(bytes) {
        return Some(SVG_MIME.to_string());
    }
    None
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    String::from_utf8_lossy(head).contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
        0x15, 0xc4, 0x89,
    ];

    #[test]
    fn classifies_references() {
        assert_eq!(ImageRef::parse("   "), None);
        assert!(matches!(
            ImageRef::parse("https://i.imgur.com/2Y40q3c.png"),
            Some(ImageRef::Remote(_))
        ));
        assert!(matches!(
            ImageRef::parse("data:image/png;base64,AAAA"),
            Some(ImageRef::Data(_))
        ));
        assert_eq!(
            ImageRef::parse("file:///tmp/logo.png"),
            Some(ImageRef::File(PathBuf::from("/tmp/logo.png")))
        );
    }

    #[test]
    fn decodes_png_data_url() {
        let url = ImageRef::from_png(PNG_1X1);
        let ImageRef::Data(url) = url else {
            panic!("expected data url");
        };
        let data = decode_data_url(&url).expect("decode");
        assert_eq!(data.mime, PNG_MIME);
        assert_eq!(data.bytes, PNG_1X1);
        assert!(data.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn rejects_non_image_payloads() {
        let url = format!("data:text/plain;base64,{}", BASE64.encode("hello"));
        assert!(decode_data_url(&url).is_err());
        assert!(decode_data_url("data:image/png,rawbytes").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn recognizes_svg_without_magic_bytes() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;
        assert_eq!(
            detect_image_mime(svg, Some("image/svg+xml"), None).as_deref(),
            Some(SVG_MIME)
        );
        assert_eq!(
            detect_image_mime(svg, None, Some(Path::new("logo.svg"))).as_deref(),
            Some(SVG_MIME)
        );
        assert_eq!(detect_image_mime(b"plain text", None, None), None);
    }
}
