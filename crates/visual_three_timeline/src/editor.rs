// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer gestures turned into clip store edits.
//!
//! A drag is bound to the layer's [`LayerId`] rather than its index, so a
//! layer inserted or removed above it mid-drag does not redirect the edit.

use crate::asset::AssetRef;
use crate::layer::LayerId;
use crate::mapper::TrackGeometry;
use crate::store::{ClipStore, TrimEdge};
use crate::view::ViewState;

/// Part of a clip grabbed by the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The clip body; moves the whole clip
    Body,
    /// Left trim handle
    StartHandle,
    /// Right trim handle
    EndHandle,
}

impl DragTarget {
    /// Trim edge driven by this target, if it is a handle
    pub fn trim_edge(self) -> Option<TrimEdge> {
        match self {
            Self::Body => None,
            Self::StartHandle => Some(TrimEdge::Start),
            Self::EndHandle => Some(TrimEdge::End),
        }
    }
}

/// An in-progress drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Layer whose clip is being dragged
    pub layer_id: LayerId,
    /// What was grabbed
    pub target: DragTarget,
    /// Pointer time minus the grabbed edge time at drag start
    pub grab_offset: f64,
}

/// Drag state machine for clip move and trim gestures
#[derive(Debug, Clone, Default)]
pub struct ClipEditor {
    drag: Option<DragSession>,
}

impl ClipEditor {
    /// Create an idle editor
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The in-progress drag, if any
    pub fn session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Start dragging the clip on layer `index`
    ///
    /// Returns false if the layer does not exist, is locked or holds no clip.
    pub fn begin_drag(
        &mut self,
        store: &ClipStore,
        index: usize,
        target: DragTarget,
        pointer_x: f64,
        geometry: &TrackGeometry,
        view: &ViewState,
    ) -> bool {
        let Some(layer) = store.layer(index) else {
            tracing::debug!(index, "Drag ignored: layer index out of range");
            return false;
        };
        if layer.locked {
            tracing::debug!(index, "Drag ignored: layer is locked");
            return false;
        }
        let Some(clip) = layer.clip.as_ref() else {
            tracing::debug!(index, "Drag ignored: layer has no clip");
            return false;
        };

        let pointer_time = view.pixel_to_time(pointer_x, geometry, store.total_duration());
        let anchor = match target {
            DragTarget::Body | DragTarget::StartHandle => clip.start,
            DragTarget::EndHandle => clip.end(),
        };
        let session = DragSession {
            layer_id: layer.id,
            target,
            grab_offset: pointer_time - anchor,
        };
        tracing::debug!(index, ?target, grab_offset = session.grab_offset, "Drag started");
        self.drag = Some(session);
        true
    }

    /// Apply the pointer position of the current drag to `store`
    ///
    /// Returns `store` unchanged when no drag is active or the dragged
    /// layer no longer exists.
    pub fn drag_to(
        &self,
        store: &ClipStore,
        pointer_x: f64,
        geometry: &TrackGeometry,
        view: &ViewState,
    ) -> ClipStore {
        let Some(session) = self.drag else {
            return store.clone();
        };
        let Some(index) = store.index_of(session.layer_id) else {
            tracing::debug!(layer = ?session.layer_id, "Drag ignored: layer was removed");
            return store.clone();
        };

        let pointer_time = view.pixel_to_time(pointer_x, geometry, store.total_duration());
        let time = pointer_time - session.grab_offset;
        match session.target.trim_edge() {
            None => store.move_clip(index, time),
            Some(edge) => store.trim_clip(index, edge, time),
        }
    }

    /// Finish the current drag
    pub fn end_drag(&mut self) -> Option<DragSession> {
        let session = self.drag.take();
        if let Some(session) = &session {
            tracing::debug!(target = ?session.target, "Drag finished");
        }
        session
    }

    /// Place the asset carried by a drop transfer on layer `index`
    ///
    /// A malformed payload leaves the store unchanged.
    pub fn drop_payload(store: &ClipStore, index: usize, payload: &str) -> ClipStore {
        match AssetRef::from_drop_payload(payload) {
            Ok(asset) => store.place_clip(index, asset),
            Err(err) => {
                tracing::debug!(index, %err, "Drop ignored: malformed payload");
                store.clone()
            }
        }
    }

    /// Seek time for a pointer dragged along the ruler
    pub fn scrub_playhead(
        pointer_x: f64,
        geometry: &TrackGeometry,
        view: &ViewState,
        total_duration: f64,
    ) -> f64 {
        view.pixel_to_time(pointer_x, geometry, total_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MediaKind;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-9;

    fn video() -> AssetRef {
        AssetRef::new("vid", MediaKind::Video, "clip.mp4")
    }

    /// Two layers, a 30 s video on each, the one on layer 0 starting at 100 s
    fn store() -> ClipStore {
        ClipStore::new(300.0)
            .add_layer()
            .add_layer()
            .place_clip(0, video())
            .place_clip(1, video())
            .move_clip(0, 100.0)
    }

    fn clip_span(store: &ClipStore, index: usize) -> (f64, f64) {
        let clip = store.layer(index).and_then(|l| l.clip.as_ref()).unwrap();
        (clip.start, clip.duration)
    }

    fn views() -> Vec<ViewState> {
        let base = ViewState::default();
        vec![
            base,
            base.with_zoom(2.0),
            base.with_zoom(2.0).with_scroll(300.0),
            base.with_zoom(0.5),
        ]
    }

    #[test]
    fn test_body_drag_keeps_grab_offset() {
        let geometry = TrackGeometry::new(180.0, 600.0);
        for view in views() {
            let store = store();
            let mut editor = ClipEditor::new();
            let grab = view.time_to_pixel(110.0, &geometry, 300.0);
            assert!(editor.begin_drag(&store, 0, DragTarget::Body, grab, &geometry, &view));
            assert_abs_diff_eq!(editor.session().unwrap().grab_offset, 10.0, epsilon = 1e-6);

            let pointer = view.time_to_pixel(150.0, &geometry, 300.0);
            let next = editor.drag_to(&store, pointer, &geometry, &view);
            let (start, duration) = clip_span(&next, 0);
            assert_abs_diff_eq!(start, 140.0, epsilon = 1e-6);
            assert_abs_diff_eq!(duration, 30.0, epsilon = EPS);
        }
    }

    #[test]
    fn test_body_drag_clamps_to_timeline() {
        let geometry = TrackGeometry::new(0.0, 600.0);
        let view = ViewState::default();
        let store = store();
        let mut editor = ClipEditor::new();
        let grab = view.time_to_pixel(100.0, &geometry, 300.0);
        editor.begin_drag(&store, 0, DragTarget::Body, grab, &geometry, &view);

        let far_right = editor.drag_to(&store, 10_000.0, &geometry, &view);
        assert_abs_diff_eq!(clip_span(&far_right, 0).0, 270.0, epsilon = EPS);
        let far_left = editor.drag_to(&store, -10_000.0, &geometry, &view);
        assert_abs_diff_eq!(clip_span(&far_left, 0).0, 0.0, epsilon = EPS);
    }

    #[test]
    fn test_end_handle_trims() {
        let geometry = TrackGeometry::new(180.0, 600.0);
        let view = ViewState::default().with_zoom(2.0).with_scroll(150.0);
        let store = store();
        let mut editor = ClipEditor::new();

        let grab = view.time_to_pixel(130.0, &geometry, 300.0);
        assert!(editor.begin_drag(&store, 0, DragTarget::EndHandle, grab, &geometry, &view));
        let pointer = view.time_to_pixel(120.0, &geometry, 300.0);
        let next = editor.drag_to(&store, pointer, &geometry, &view);
        let (start, duration) = clip_span(&next, 0);
        assert_abs_diff_eq!(start, 100.0, epsilon = EPS);
        assert_abs_diff_eq!(duration, 20.0, epsilon = 1e-6);
    }

    #[test]
    fn test_start_handle_holds_end() {
        let geometry = TrackGeometry::new(180.0, 600.0);
        let view = ViewState::default();
        let store = store();
        let mut editor = ClipEditor::new();

        let grab = view.time_to_pixel(100.0, &geometry, 300.0);
        editor.begin_drag(&store, 0, DragTarget::StartHandle, grab, &geometry, &view);

        let pointer = view.time_to_pixel(90.0, &geometry, 300.0);
        let (start, duration) = clip_span(&editor.drag_to(&store, pointer, &geometry, &view), 0);
        assert_abs_diff_eq!(start, 90.0, epsilon = 1e-6);
        assert_abs_diff_eq!(start + duration, 130.0, epsilon = 1e-6);

        // Past the end: stops at the minimum duration
        let pointer = view.time_to_pixel(200.0, &geometry, 300.0);
        let (start, duration) = clip_span(&editor.drag_to(&store, pointer, &geometry, &view), 0);
        assert_abs_diff_eq!(start, 129.5, epsilon = 1e-6);
        assert_abs_diff_eq!(duration, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_begin_drag_rejected() {
        let geometry = TrackGeometry::new(0.0, 600.0);
        let view = ViewState::default();
        let store = store().toggle_lock(0).add_layer();
        let mut editor = ClipEditor::new();

        assert!(!editor.begin_drag(&store, 0, DragTarget::Body, 0.0, &geometry, &view));
        assert!(!editor.begin_drag(&store, 2, DragTarget::Body, 0.0, &geometry, &view));
        assert!(!editor.begin_drag(&store, 9, DragTarget::Body, 0.0, &geometry, &view));
        assert!(!editor.is_dragging());
        assert!(editor.drag_to(&store, 50.0, &geometry, &view).ptr_eq(&store));
    }

    #[test]
    fn test_drag_follows_layer_identity() {
        let geometry = TrackGeometry::new(0.0, 600.0);
        let view = ViewState::default();
        let store = store();
        let mut editor = ClipEditor::new();
        let grab = view.time_to_pixel(0.0, &geometry, 300.0);
        assert!(editor.begin_drag(&store, 1, DragTarget::Body, grab, &geometry, &view));

        // The layer above goes away mid-drag
        let shifted = store.remove_layer(0);
        let pointer = view.time_to_pixel(50.0, &geometry, 300.0);
        let next = editor.drag_to(&shifted, pointer, &geometry, &view);
        assert_abs_diff_eq!(clip_span(&next, 0).0, 50.0, epsilon = 1e-6);

        // And then the dragged layer itself
        let gone = next.remove_layer(0);
        assert!(editor.drag_to(&gone, pointer, &geometry, &view).ptr_eq(&gone));

        assert!(editor.end_drag().is_some());
        assert!(editor.end_drag().is_none());
    }

    #[test]
    fn test_drop_payload() {
        let store = ClipStore::new(300.0).add_layer();
        let payload = AssetRef::new("img", MediaKind::Image, "a.png").to_drop_payload();

        let dropped = ClipEditor::drop_payload(&store, 0, &payload);
        assert_eq!(clip_span(&dropped, 0), (0.0, 5.0));

        for garbage in ["", "not json", "{\"id\":1}"] {
            assert!(ClipEditor::drop_payload(&store, 0, garbage).ptr_eq(&store));
        }
        assert!(ClipEditor::drop_payload(&store.toggle_lock(0), 0, &payload)
            .layer(0)
            .is_some_and(|l| l.is_empty()));
    }

    #[test]
    fn test_scrub_playhead() {
        let geometry = TrackGeometry::new(180.0, 600.0);
        let view = ViewState::default();
        assert_abs_diff_eq!(ClipEditor::scrub_playhead(480.0, &geometry, &view, 300.0), 150.0);
        assert_eq!(ClipEditor::scrub_playhead(0.0, &geometry, &view, 300.0), 0.0);
        assert_eq!(ClipEditor::scrub_playhead(5000.0, &geometry, &view, 300.0), 300.0);
    }
}
