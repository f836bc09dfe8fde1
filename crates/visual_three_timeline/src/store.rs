// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer stack holding the placed clips.
//!
//! A [`ClipStore`] is an immutable snapshot: every edit returns the next
//! snapshot and leaves the receiver untouched. Edits that change nothing
//! return a snapshot sharing the receiver's allocation, so callers can
//! detect no-ops with [`ClipStore::ptr_eq`] as well as with `==`.
//!
//! Invalid edits never fail. Out-of-range times are clamped so that every
//! clip satisfies `0 <= start` and `start + duration <= total_duration`;
//! edits against a locked layer, an empty layer or a stale index are
//! ignored.

use crate::asset::{AssetRef, MediaKind};
use crate::config::TimelineConfig;
use crate::layer::{Clip, Layer, LayerId};
use indexmap::IndexMap;
use std::sync::Arc;

/// Edge of a clip moved by a trim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    /// Left edge; the clip end stays fixed
    Start,
    /// Right edge; the clip start stays fixed
    End,
}

/// Duration rules applied to clips
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipLimits {
    /// Shortest clip a trim may produce
    pub min_clip_duration: f64,
    /// Initial length of a placed image
    pub image_clip_duration: f64,
    /// Initial length of placed audio or video
    pub av_clip_duration: f64,
}

impl ClipLimits {
    /// Limits from the engine configuration
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self {
            min_clip_duration: config.min_clip_duration,
            image_clip_duration: config.image_clip_duration,
            av_clip_duration: config.av_clip_duration,
        }
    }

    /// Minimum duration on a timeline of `total` seconds
    ///
    /// A timeline shorter than the minimum still has to contain its clips,
    /// so the bound gives way to the timeline length.
    pub fn effective_min(&self, total: f64) -> f64 {
        self.min_clip_duration.min(total)
    }

    /// Initial duration of a clip of `kind` on a timeline of `total` seconds
    pub fn default_duration(&self, kind: MediaKind, total: f64) -> f64 {
        let duration = match kind {
            MediaKind::Image => self.image_clip_duration,
            MediaKind::Video | MediaKind::Audio => self.av_clip_duration,
        };
        duration.min(total).max(0.0)
    }
}

impl Default for ClipLimits {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

/// Immutable snapshot of the layer stack
#[derive(Debug, Clone)]
pub struct ClipStore {
    layers: Arc<IndexMap<LayerId, Layer>>,
    total_duration: f64,
    limits: ClipLimits,
}

impl PartialEq for ClipStore {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality ignores order; layer order is significant here.
        self.total_duration == other.total_duration
            && self.limits == other.limits
            && (Arc::ptr_eq(&self.layers, &other.layers)
                || (self.layers.len() == other.layers.len()
                    && self.layers.values().zip(other.layers.values()).all(|(a, b)| a == b)))
    }
}

impl ClipStore {
    /// Create an empty store with default clip limits
    pub fn new(total_duration: f64) -> Self {
        Self::with_limits(total_duration, ClipLimits::default())
    }

    /// Create an empty store with explicit clip limits
    pub fn with_limits(total_duration: f64, limits: ClipLimits) -> Self {
        Self {
            layers: Arc::new(IndexMap::new()),
            total_duration: sanitize_duration(total_duration),
            limits,
        }
    }

    /// Create an empty store from the engine configuration
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self::with_limits(config.default_total_duration, ClipLimits::from_config(config))
    }

    /// Whether both snapshots share the same layer allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers) && self.total_duration == other.total_duration
    }

    /// Timeline length in seconds
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Clip duration rules
    pub fn limits(&self) -> ClipLimits {
        self.limits
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether there are no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer at `index`
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get_index(index).map(|(_, layer)| layer)
    }

    /// Layer with the given ID
    pub fn layer_by_id(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Current index of the layer with the given ID
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.get_index_of(&id)
    }

    /// All layers in stacking order
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// All placed clips with their layer, in stacking order
    pub fn clips(&self) -> impl Iterator<Item = (&Layer, &Clip)> {
        self.layers
            .values()
            .filter_map(|layer| layer.clip.as_ref().map(|clip| (layer, clip)))
    }

    /// Latest end time over all clips
    pub fn content_end(&self) -> f64 {
        self.clips().map(|(_, clip)| clip.end()).fold(0.0, f64::max)
    }

    /// Append an empty layer
    pub fn add_layer(&self) -> Self {
        self.insert_layer(self.layers.len())
    }

    /// Insert an empty layer at `index`, shifting later layers down
    ///
    /// Indices past the end append.
    pub fn insert_layer(&self, index: usize) -> Self {
        let layer = Layer::new();
        let index = index.min(self.layers.len());
        tracing::debug!(index, layer = ?layer.id, "Inserting layer");

        let mut next = self.clone();
        Arc::make_mut(&mut next.layers).shift_insert(index, layer.id, layer);
        next
    }

    /// Delete the layer at `index`, shifting later layers up
    pub fn remove_layer(&self, index: usize) -> Self {
        if index >= self.layers.len() {
            tracing::debug!(index, "Remove ignored: layer index out of range");
            return self.clone();
        }
        tracing::debug!(index, "Removing layer");

        let mut next = self.clone();
        Arc::make_mut(&mut next.layers).shift_remove_index(index);
        next
    }

    /// Place `media` at the start of the layer, replacing any clip already there
    pub fn place_clip(&self, index: usize, media: AssetRef) -> Self {
        if !self.editable(index, "place") {
            return self.clone();
        }
        let duration = self.limits.default_duration(media.kind, self.total_duration);
        tracing::debug!(index, asset = %media.id, duration, "Placing clip");

        let clip = Clip::new(media, 0.0, duration);
        self.update_layer(index, |layer| layer.clip = Some(clip))
    }

    /// Remove the clip from the layer, keeping the layer
    pub fn clear_clip(&self, index: usize) -> Self {
        if !self.editable(index, "clear") {
            return self.clone();
        }
        self.update_layer(index, |layer| layer.clip = None)
    }

    /// Move the clip so it starts at `new_start`, clamped to the timeline
    pub fn move_clip(&self, index: usize, new_start: f64) -> Self {
        if !self.editable(index, "move") {
            return self.clone();
        }
        if new_start.is_nan() {
            tracing::debug!(index, "Ignoring NaN move target");
            return self.clone();
        }
        let total = self.total_duration;
        self.update_clip(index, |clip| {
            clip.start = clamp_upper(new_start, 0.0, total - clip.duration);
        })
    }

    /// Drag one edge of the clip to `new_time`
    pub fn trim_clip(&self, index: usize, edge: TrimEdge, new_time: f64) -> Self {
        if !self.editable(index, "trim") {
            return self.clone();
        }
        if new_time.is_nan() {
            tracing::debug!(index, "Ignoring NaN trim target");
            return self.clone();
        }
        let total = self.total_duration;
        let min = self.limits.effective_min(total);
        self.update_clip(index, |clip| match edge {
            TrimEdge::Start => {
                let end = clip.end();
                let start = clamp_lower(new_time, 0.0, end - min);
                clip.start = start;
                clip.duration = end - start;
            }
            TrimEdge::End => {
                clip.duration = clamp_upper(new_time - clip.start, min, total - clip.start);
            }
        })
    }

    /// Flip the locked flag
    pub fn toggle_lock(&self, index: usize) -> Self {
        self.update_layer(index, |layer| layer.locked = !layer.locked)
    }

    /// Flip the hidden flag
    pub fn toggle_hidden(&self, index: usize) -> Self {
        self.update_layer(index, |layer| layer.hidden = !layer.hidden)
    }

    /// Flip the expanded flag
    pub fn toggle_expanded(&self, index: usize) -> Self {
        self.update_layer(index, |layer| layer.expanded = !layer.expanded)
    }

    /// Change the timeline length
    ///
    /// Clips that no longer fit are pulled back inside: first moved left
    /// keeping their duration, then shortened if they are longer than the
    /// whole timeline. Clips cut below the minimum duration by an earlier
    /// shrink grow back to it once there is room. Locked layers are refit as well since the bound is a
    /// store invariant, not a user edit.
    pub fn set_total_duration(&self, total_duration: f64) -> Self {
        if total_duration.is_nan() {
            tracing::debug!("Ignoring NaN timeline duration");
            return self.clone();
        }
        let total = sanitize_duration(total_duration);
        if total == self.total_duration {
            return self.clone();
        }
        tracing::debug!(from = self.total_duration, to = total, "Changing timeline duration");

        let mut next = self.clone();
        next.total_duration = total;
        let min = self.limits.effective_min(total);
        let misfit = self
            .clips()
            .any(|(_, clip)| clip.end() > total || clip.duration < min);
        if misfit {
            for layer in Arc::make_mut(&mut next.layers).values_mut() {
                if let Some(clip) = layer.clip.as_mut() {
                    fit_clip(clip, total, min);
                }
            }
        }
        next
    }

    /// Whether clip edits on `index` are accepted, logging why not
    fn editable(&self, index: usize, op: &'static str) -> bool {
        match self.layer(index) {
            None => {
                tracing::debug!(index, op, "Edit ignored: layer index out of range");
                false
            }
            Some(layer) if layer.locked => {
                tracing::debug!(index, op, "Edit ignored: layer is locked");
                false
            }
            Some(_) => true,
        }
    }

    /// Apply `edit` to the clip on `index`, if there is one
    fn update_clip(&self, index: usize, edit: impl FnOnce(&mut Clip)) -> Self {
        if self.layer(index).is_some_and(Layer::is_empty) {
            tracing::debug!(index, "Edit ignored: layer has no clip");
            return self.clone();
        }
        self.update_layer(index, |layer| {
            if let Some(clip) = layer.clip.as_mut() {
                edit(clip);
            }
        })
    }

    /// Copy-on-write update of a single layer
    fn update_layer(&self, index: usize, edit: impl FnOnce(&mut Layer)) -> Self {
        let Some(current) = self.layer(index) else {
            tracing::debug!(index, "Edit ignored: layer index out of range");
            return self.clone();
        };

        let mut updated = current.clone();
        edit(&mut updated);
        if updated == *current {
            return self.clone();
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.layers)[index] = updated;
        next
    }
}

impl Default for ClipStore {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() {
        duration.max(0.0)
    } else if duration == f64::INFINITY {
        f64::MAX
    } else {
        0.0
    }
}

/// Clamp where the upper bound wins if the bounds cross
fn clamp_upper(value: f64, lower: f64, upper: f64) -> f64 {
    value.max(lower).min(upper)
}

/// Clamp where the lower bound wins if the bounds cross
fn clamp_lower(value: f64, lower: f64, upper: f64) -> f64 {
    value.min(upper).max(lower)
}

fn fit_clip(clip: &mut Clip, total: f64, min: f64) {
    clip.duration = clip.duration.max(min);
    if clip.duration > total {
        clip.start = 0.0;
        clip.duration = total;
    } else if clip.end() > total {
        clip.start = (total - clip.duration).max(0.0);
    }
}
