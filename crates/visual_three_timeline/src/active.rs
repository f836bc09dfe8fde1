// SPDX-License-Identifier: MIT OR Apache-2.0
//! Active media resolution.
//!
//! A clip is active while the playhead lies inside `[start, start + duration)`.
//! Each active clip carries a free-form canvas transform. The transform is
//! created from the default when the clip becomes active, kept verbatim
//! (including renderer edits) while it stays active, and forgotten when it
//! leaves the active set; reactivation starts from the default again.

use crate::layer::{Clip, ClipId, LayerId};
use crate::store::ClipStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Whether hidden layers contribute to the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HiddenLayerPolicy {
    /// Hidden only affects the track list; media stays active
    #[default]
    Include,
    /// Media on hidden layers is never active
    Exclude,
}

/// A canvas length, absolute or relative to the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    /// Absolute size in canvas pixels
    Pixels(f32),
    /// Percentage of the canvas dimension
    Percent(f32),
}

impl Extent {
    /// Size in pixels for a canvas dimension of `container` pixels
    pub fn resolve(self, container: f32) -> f32 {
        match self {
            Self::Pixels(px) => px,
            Self::Percent(pct) => container * pct / 100.0,
        }
    }
}

/// Position and size of active media on the preview canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveTransform {
    /// Left offset in canvas pixels
    pub x: f32,
    /// Top offset in canvas pixels
    pub y: f32,
    /// Width
    pub width: Extent,
    /// Height
    pub height: Extent,
}

impl Default for ActiveTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: Extent::Percent(30.0),
            height: Extent::Percent(30.0),
        }
    }
}

impl ActiveTransform {
    /// Transform moved to `(x, y)`
    pub fn with_position(self, x: f32, y: f32) -> Self {
        Self { x, y, ..self }
    }

    /// Transform resized to `width` x `height`
    pub fn with_size(self, width: Extent, height: Extent) -> Self {
        Self { width, height, ..self }
    }

    /// Pixel rectangle `[x, y, width, height]` on a canvas of `canvas` size
    pub fn resolve(&self, canvas: [f32; 2]) -> [f32; 4] {
        [
            self.x,
            self.y,
            self.width.resolve(canvas[0]),
            self.height.resolve(canvas[1]),
        ]
    }
}

/// Whether `clip` is active at `time`
pub fn is_active(clip: &Clip, time: f64) -> bool {
    clip.contains(time)
}

/// Active clip together with its transform, as handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMedia {
    /// Index of the layer in stacking order
    pub layer_index: usize,
    /// Layer holding the clip
    pub layer_id: LayerId,
    /// The active clip
    pub clip: Clip,
    /// Its current canvas transform
    pub transform: ActiveTransform,
}

/// Clips that entered and left the active set in one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveDelta {
    /// Newly active clips, in stacking order
    pub entered: Vec<ClipId>,
    /// Clips no longer active, in their previous stacking order
    pub left: Vec<ClipId>,
}

impl ResolveDelta {
    /// Whether membership did not change
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ActiveEntry {
    layer_index: usize,
    layer_id: LayerId,
    clip: Clip,
}

/// Tracks the active set and the per-clip transforms across resolutions
#[derive(Debug, Clone)]
pub struct ActiveMediaResolver {
    active: Vec<ActiveEntry>,
    transforms: HashMap<ClipId, ActiveTransform>,
    default_transform: ActiveTransform,
    hidden_layers: HiddenLayerPolicy,
}

impl ActiveMediaResolver {
    /// Create a resolver with nothing active
    pub fn new(default_transform: ActiveTransform, hidden_layers: HiddenLayerPolicy) -> Self {
        Self {
            active: Vec::new(),
            transforms: HashMap::new(),
            default_transform,
            hidden_layers,
        }
    }

    /// Hidden layer policy
    pub fn hidden_layers(&self) -> HiddenLayerPolicy {
        self.hidden_layers
    }

    /// Change the hidden layer policy; takes effect on the next resolution
    pub fn set_hidden_layers(&mut self, policy: HiddenLayerPolicy) {
        self.hidden_layers = policy;
    }

    /// Recompute the active set for `time`
    pub fn resolve(&mut self, time: f64, store: &ClipStore) -> ResolveDelta {
        let active: Vec<ActiveEntry> = store
            .layers()
            .enumerate()
            .filter(|(_, layer)| {
                !(layer.hidden && self.hidden_layers == HiddenLayerPolicy::Exclude)
            })
            .filter_map(|(layer_index, layer)| {
                layer
                    .clip
                    .as_ref()
                    .filter(|clip| is_active(clip, time))
                    .map(|clip| ActiveEntry {
                        layer_index,
                        layer_id: layer.id,
                        clip: clip.clone(),
                    })
            })
            .collect();

        let current: HashSet<ClipId> = active.iter().map(|entry| entry.clip.id).collect();

        let mut delta = ResolveDelta::default();
        for entry in &self.active {
            if !current.contains(&entry.clip.id) {
                self.transforms.remove(&entry.clip.id);
                delta.left.push(entry.clip.id);
            }
        }
        for entry in &active {
            if !self.transforms.contains_key(&entry.clip.id) {
                self.transforms.insert(entry.clip.id, self.default_transform);
                delta.entered.push(entry.clip.id);
            }
        }

        if !delta.is_empty() {
            tracing::debug!(
                time,
                entered = delta.entered.len(),
                left = delta.left.len(),
                "Active media changed"
            );
        }
        self.active = active;
        delta
    }

    /// Active clips with their transforms, in stacking order
    pub fn active_media(&self) -> Vec<ActiveMedia> {
        self.active
            .iter()
            .map(|entry| ActiveMedia {
                layer_index: entry.layer_index,
                layer_id: entry.layer_id,
                clip: entry.clip.clone(),
                transform: self.transforms.get(&entry.clip.id).copied().unwrap_or(self.default_transform),
            })
            .collect()
    }

    /// IDs of the active clips, in stacking order
    pub fn active_ids(&self) -> impl Iterator<Item = ClipId> + '_ {
        self.active.iter().map(|entry| entry.clip.id)
    }

    /// Number of active clips
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether the clip is currently active
    pub fn is_clip_active(&self, clip_id: ClipId) -> bool {
        self.transforms.contains_key(&clip_id)
    }

    /// Current transform of an active clip
    pub fn transform(&self, clip_id: ClipId) -> Option<ActiveTransform> {
        self.transforms.get(&clip_id).copied()
    }

    /// Replace the transform of an active clip after a renderer edit
    ///
    /// Returns false, changing nothing, if the clip is not active.
    pub fn on_transform_edit(&mut self, clip_id: ClipId, transform: ActiveTransform) -> bool {
        match self.transforms.get_mut(&clip_id) {
            Some(current) => {
                *current = transform;
                true
            }
            None => {
                tracing::debug!(?clip_id, "Transform edit ignored: clip is not active");
                false
            }
        }
    }

    /// Move an active clip, keeping its size
    pub fn move_to(&mut self, clip_id: ClipId, x: f32, y: f32) -> bool {
        match self.transform(clip_id) {
            Some(current) => self.on_transform_edit(clip_id, current.with_position(x, y)),
            None => false,
        }
    }

    /// Resize an active clip, keeping its position
    pub fn resize_to(&mut self, clip_id: ClipId, width: Extent, height: Extent) -> bool {
        match self.transform(clip_id) {
            Some(current) => self.on_transform_edit(clip_id, current.with_size(width, height)),
            None => false,
        }
    }

    /// Forget all active media
    pub fn clear(&mut self) {
        self.active.clear();
        self.transforms.clear();
    }
}

impl Default for ActiveMediaResolver {
    fn default() -> Self {
        Self::new(ActiveTransform::default(), HiddenLayerPolicy::default())
    }
}
