// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer and clip definitions.

use crate::asset::{AssetRef, MediaKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a layer; survives reordering and deletion of siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Create a new random layer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of one placement of media on a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Media placed on a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// The placed asset
    pub media: AssetRef,
    /// Start time in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl Clip {
    /// Create a new clip
    pub fn new(media: AssetRef, start: f64, duration: f64) -> Self {
        Self {
            id: ClipId::new(),
            media,
            start,
            duration,
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Media kind of the placed asset
    pub fn kind(&self) -> MediaKind {
        self.media.kind
    }

    /// Whether `time` falls inside the half-open interval `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end()
    }
}

/// A slot in the layer stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique layer ID
    pub id: LayerId,
    /// Clip on this layer, if any
    pub clip: Option<Clip>,
    /// Locked layers reject clip edits
    pub locked: bool,
    /// Hidden layers are drawn dimmed in the track list
    pub hidden: bool,
    /// Expanded layers are drawn taller with clip details
    pub expanded: bool,
}

impl Layer {
    /// Create an empty layer
    pub fn new() -> Self {
        Self {
            id: LayerId::new(),
            clip: None,
            locked: false,
            hidden: false,
            expanded: false,
        }
    }

    /// Whether the layer holds no clip
    pub fn is_empty(&self) -> bool {
        self.clip.is_none()
    }

    /// Display name for the layer at `index` (1-based)
    pub fn display_name(index: usize) -> String {
        format!("Layer {}", index + 1)
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_interval_is_half_open() {
        let clip = Clip::new(AssetRef::new("a", MediaKind::Video, "a.mp4"), 10.0, 10.0);
        assert_eq!(clip.end(), 20.0);
        assert!(!clip.contains(9.999));
        assert!(clip.contains(10.0));
        assert!(clip.contains(19.999));
        assert!(!clip.contains(20.0));
    }

    #[test]
    fn test_new_layer_is_empty() {
        let layer = Layer::new();
        assert!(layer.is_empty());
        assert!(!layer.locked && !layer.hidden && !layer.expanded);
        assert_eq!(Layer::display_name(0), "Layer 1");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(LayerId::new(), LayerId::new());
        assert_ne!(ClipId::new(), ClipId::new());
    }
}
