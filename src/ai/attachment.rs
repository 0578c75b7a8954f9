use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Upper bound accepted by the upstream vision API.
pub const MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a supported image type")]
    Unsupported(String),
    #[error("{0} is empty")]
    Empty(String),
    #[error("{name} is {size} bytes, the limit is {}", MAX_ATTACHMENT_BYTES)]
    TooLarge { name: String, size: usize },
}

/// An image picked by the user but not yet sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub id: String,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Arc<[u8]>,
}

impl ImageAttachment {
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        // Check the type before touching the file.
        mime_for_name(&file_name).ok_or_else(|| AttachmentError::Unsupported(file_name.clone()))?;

        let bytes = std::fs::read(path).map_err(|source| AttachmentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(file_name, bytes)
    }

    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, AttachmentError> {
        let file_name = file_name.into();
        let bytes = bytes.into();
        let mime = mime_for_name(&file_name).ok_or_else(|| AttachmentError::Unsupported(file_name.clone()))?;

        if bytes.is_empty() {
            return Err(AttachmentError::Empty(file_name));
        }
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                name: file_name,
                size: bytes.len(),
            });
        }

        tracing::debug!("Attached {} ({}, {} bytes)", file_name, mime, bytes.len());
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name,
            mime,
            bytes,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}

/// File extension egui's image loader expects for a MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        _ => "png",
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL. Remote URLs return `None`.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn data_url_carries_mime_and_payload() {
        let attachment = ImageAttachment::from_bytes("leaf.PNG", vec![1u8, 2, 3]).unwrap();
        assert_eq!(attachment.mime, "image/png");
        assert_eq!(attachment.to_data_url(), "data:image/png;base64,AQID");

        let (mime, bytes) = decode_data_url(&attachment.to_data_url()).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_non_images_and_empty_files() {
        assert!(matches!(
            ImageAttachment::from_bytes("notes.txt", vec![1u8]),
            Err(AttachmentError::Unsupported(_))
        ));
        assert!(matches!(
            ImageAttachment::from_bytes("leaf.jpg", Vec::<u8>::new()),
            Err(AttachmentError::Empty(_))
        ));
    }

    #[test]
    fn rejects_oversized_images() {
        let big = vec![0u8; MAX_ATTACHMENT_BYTES + 1];
        assert!(matches!(
            ImageAttachment::from_bytes("leaf.webp", big),
            Err(AttachmentError::TooLarge { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".jpeg").tempfile().unwrap();
        file.write_all(b"\xff\xd8\xff").unwrap();

        let attachment = ImageAttachment::from_path(file.path()).unwrap();
        assert_eq!(attachment.mime, "image/jpeg");
        assert_eq!(attachment.size(), 3);

        let missing = ImageAttachment::from_path(Path::new("/nonexistent/leaf.png"));
        assert!(matches!(missing, Err(AttachmentError::Read { .. })));
    }

    #[test]
    fn remote_urls_are_not_decoded() {
        assert!(decode_data_url("https://example.com/leaf.png").is_none());
        assert!(decode_data_url("data:image/png,rawbytes").is_none());
    }
}
