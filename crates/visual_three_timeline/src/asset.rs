// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset references handed over by the media library.
//!
//! The engine only interprets [`AssetRef::kind`]; everything else is carried
//! along opaquely so the renderer and the track view can display it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding a drop transfer
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The drag carried no payload at all
    #[error("Drop payload is empty")]
    Empty,

    /// The payload was not a valid asset reference
    #[error("Malformed drop payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Opaque identifier of an asset owned by the media library
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create an asset ID from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of media an asset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video with or without sound
    Video,
    /// Audio only
    Audio,
}

impl MediaKind {
    /// Classify a MIME type such as `video/mp4`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else if mime.starts_with("audio/") {
            Some(Self::Audio)
        } else {
            None
        }
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }

    /// Get the clip color used on the track view
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Image => [34, 197, 94],
            Self::Video => [59, 130, 246],
            Self::Audio => [234, 179, 8],
        }
    }

    /// Whether media of this kind has an intrinsic playback length
    pub fn is_timed(&self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

/// Reference to an asset, as serialized into a drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Library-owned identifier
    pub id: AssetId,
    /// Media kind
    pub kind: MediaKind,
    /// Name shown on the clip
    pub display_name: String,
    /// Handle the renderer uses to fetch a preview (URL, path, texture key)
    #[serde(default)]
    pub preview: Option<String>,
    /// File size in bytes
    #[serde(default)]
    pub size_bytes: u64,
    /// Pixel width for images and video
    #[serde(default)]
    pub width: Option<u32>,
    /// Pixel height for images and video
    #[serde(default)]
    pub height: Option<u32>,
}

impl AssetRef {
    /// Create a reference with only the fields the engine needs
    pub fn new(id: impl Into<String>, kind: MediaKind, display_name: impl Into<String>) -> Self {
        Self {
            id: AssetId::new(id),
            kind,
            display_name: display_name.into(),
            preview: None,
            size_bytes: 0,
            width: None,
            height: None,
        }
    }

    /// Set pixel dimensions
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the file size
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Set the preview handle
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Serialize into the structured text attached to a drag gesture
    pub fn to_drop_payload(&self) -> String {
        // A struct of strings and integers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode the structured text attached to a drop
    pub fn from_drop_payload(payload: &str) -> Result<Self, PayloadError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(PayloadError::Empty);
        }
        Ok(serde_json::from_str(payload)?)
    }

    /// File size in megabytes, as shown by the media library
    pub fn size_megabytes(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }

    /// `WxH` label for video assets with known dimensions
    pub fn dimensions_label(&self) -> Option<String> {
        if self.kind != MediaKind::Video {
            return None;
        }
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime(" Audio/MPEG "), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_mime("application/pdf"), None);
        assert_eq!(MediaKind::from_mime(""), None);
    }

    #[test]
    fn test_drop_payload() {
        let asset = AssetRef::new("abc123", MediaKind::Video, "clip.mp4")
            .with_dimensions(1920, 1080)
            .with_size(3 * 1024 * 1024);
        let decoded = AssetRef::from_drop_payload(&asset.to_drop_payload()).unwrap();
        assert_eq!(decoded, asset);
        assert!((decoded.size_megabytes() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_minimal_payload_uses_defaults() {
        let decoded = AssetRef::from_drop_payload(
            r#"{"id":"x","kind":"image","display_name":"photo.jpg"}"#,
        )
        .unwrap();
        assert_eq!(decoded.kind, MediaKind::Image);
        assert_eq!(decoded.size_bytes, 0);
        assert!(decoded.preview.is_none());
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(AssetRef::from_drop_payload("   "), Err(PayloadError::Empty)));
        assert!(matches!(AssetRef::from_drop_payload("{not json"), Err(PayloadError::Json(_))));
        assert!(matches!(
            AssetRef::from_drop_payload(r#"{"id":"x","kind":"document","display_name":"a"}"#),
            Err(PayloadError::Json(_))
        ));
    }

    #[test]
    fn test_dimensions_label() {
        let video = AssetRef::new("v", MediaKind::Video, "v.mp4").with_dimensions(640, 480);
        assert_eq!(video.dimensions_label().as_deref(), Some("640x480"));

        let image = AssetRef::new("i", MediaKind::Image, "i.png").with_dimensions(640, 480);
        assert_eq!(image.dimensions_label(), None);
    }
}
