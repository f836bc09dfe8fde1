// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline session: the single owner of the editing state.
//!
//! The session holds the current [`ClipStore`] snapshot, the playback clock,
//! the view and the active media resolver. Every mutator swaps in the next
//! store snapshot wholesale and re-resolves active media whenever the store
//! or the playhead time changed, whether or not the clock is playing.

use crate::active::{ActiveMedia, ActiveMediaResolver, ActiveTransform, Extent, HiddenLayerPolicy};
use crate::asset::AssetRef;
use crate::clock::{EndBehavior, FrameId, FrameScheduler, PlaybackClock, PlayheadState};
use crate::config::TimelineConfig;
use crate::editor::{ClipEditor, DragTarget};
use crate::layer::ClipId;
use crate::mapper::TrackGeometry;
use crate::store::{ClipStore, TrimEdge};
use crate::timecode::{self, TimecodeError};
use crate::view::ViewState;

/// Editing and playback state of one timeline
#[derive(Debug)]
pub struct TimelineSession {
    config: TimelineConfig,
    store: ClipStore,
    view: ViewState,
    clock: PlaybackClock,
    resolver: ActiveMediaResolver,
    editor: ClipEditor,
}

impl TimelineSession {
    /// Create an empty session from the engine configuration
    pub fn new(config: TimelineConfig) -> Self {
        tracing::debug!(total = config.default_total_duration, "Creating timeline session");
        Self {
            store: ClipStore::from_config(&config),
            view: ViewState::from_config(&config),
            clock: PlaybackClock::new(config.end_behavior, config.skip_step),
            resolver: ActiveMediaResolver::new(config.default_transform, config.hidden_layers),
            editor: ClipEditor::new(),
            config,
        }
    }

    // Queries

    /// Engine configuration
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Current store snapshot
    pub fn store(&self) -> &ClipStore {
        &self.store
    }

    /// Current view
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Current playhead
    pub fn playhead(&self) -> PlayheadState {
        self.clock.state()
    }

    /// Playhead time in seconds
    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    /// Whether the clock is playing
    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Whether the clock holds a pending frame request
    pub fn is_armed(&self) -> bool {
        self.clock.is_armed()
    }

    /// Timeline length in seconds
    pub fn total_duration(&self) -> f64 {
        self.store.total_duration()
    }

    /// Playhead position as a percentage of the timeline
    pub fn progress_percent(&self) -> f64 {
        crate::mapper::time_to_percent(self.current_time(), self.total_duration())
    }

    /// Whether a clip drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.editor.is_dragging()
    }

    /// Active clips with their transforms, in layer order
    pub fn active_media(&self) -> Vec<ActiveMedia> {
        self.resolver.active_media()
    }

    /// Transform of an active clip
    pub fn transform(&self, clip_id: ClipId) -> Option<ActiveTransform> {
        self.resolver.transform(clip_id)
    }

    /// Hidden layer policy of the resolver
    pub fn hidden_layers(&self) -> HiddenLayerPolicy {
        self.resolver.hidden_layers()
    }

    // Store edits

    /// Replace the store snapshot, re-resolving if it changed
    ///
    /// Returns whether the snapshot was replaced.
    pub fn commit_store(&mut self, next: ClipStore) -> bool {
        if next.ptr_eq(&self.store) {
            return false;
        }
        self.store = next;
        self.resolve();
        true
    }

    /// Append an empty layer
    pub fn add_layer(&mut self) -> bool {
        let next = self.store.add_layer();
        self.commit_store(next)
    }

    /// Insert an empty layer at `index`
    pub fn insert_layer(&mut self, index: usize) -> bool {
        let next = self.store.insert_layer(index);
        self.commit_store(next)
    }

    /// Delete the layer at `index`
    pub fn remove_layer(&mut self, index: usize) -> bool {
        let next = self.store.remove_layer(index);
        self.commit_store(next)
    }

    /// Place `media` on layer `index`
    pub fn place_clip(&mut self, index: usize, media: AssetRef) -> bool {
        let next = self.store.place_clip(index, media);
        self.commit_store(next)
    }

    /// Place the asset carried by a drop transfer on layer `index`
    pub fn drop_payload(&mut self, index: usize, payload: &str) -> bool {
        let next = ClipEditor::drop_payload(&self.store, index, payload);
        self.commit_store(next)
    }

    /// Remove the clip from layer `index`
    pub fn clear_clip(&mut self, index: usize) -> bool {
        let next = self.store.clear_clip(index);
        self.commit_store(next)
    }

    /// Move the clip on layer `index` to start at `new_start`
    pub fn move_clip(&mut self, index: usize, new_start: f64) -> bool {
        let next = self.store.move_clip(index, new_start);
        self.commit_store(next)
    }

    /// Trim one edge of the clip on layer `index`
    pub fn trim_clip(&mut self, index: usize, edge: TrimEdge, new_time: f64) -> bool {
        let next = self.store.trim_clip(index, edge, new_time);
        self.commit_store(next)
    }

    /// Flip the locked flag of layer `index`
    pub fn toggle_lock(&mut self, index: usize) -> bool {
        let next = self.store.toggle_lock(index);
        self.commit_store(next)
    }

    /// Flip the hidden flag of layer `index`
    pub fn toggle_hidden(&mut self, index: usize) -> bool {
        let next = self.store.toggle_hidden(index);
        self.commit_store(next)
    }

    /// Flip the expanded flag of layer `index`
    pub fn toggle_expanded(&mut self, index: usize) -> bool {
        let next = self.store.toggle_expanded(index);
        self.commit_store(next)
    }

    /// Change the timeline length, refitting clips and the playhead
    pub fn set_total_duration(&mut self, total_duration: f64) -> bool {
        let next = self.store.set_total_duration(total_duration);
        if next.ptr_eq(&self.store) {
            return false;
        }
        self.store = next;
        self.clock.clamp_to(self.store.total_duration());
        self.resolve();
        true
    }

    /// Change the timeline length from `MM:SS` or `MM:SS:CC` text
    ///
    /// Text that does not parse leaves the session unchanged.
    pub fn set_total_duration_text(&mut self, text: &str) -> Result<bool, TimecodeError> {
        let seconds = timecode::parse_timecode(text)?;
        Ok(self.set_total_duration(seconds))
    }

    /// Change the hidden layer policy
    pub fn set_hidden_layers(&mut self, policy: HiddenLayerPolicy) {
        self.resolver.set_hidden_layers(policy);
        self.resolve();
    }

    /// Change the end-of-timeline behaviour
    pub fn set_end_behavior(&mut self, end_behavior: EndBehavior) {
        self.clock.set_end_behavior(end_behavior);
    }

    // View

    /// Set the zoom factor
    pub fn set_zoom(&mut self, zoom: f64) {
        self.view = self.view.with_zoom(zoom);
    }

    /// Zoom in one step
    pub fn zoom_in(&mut self) {
        self.view = self.view.zoomed_in();
    }

    /// Zoom out one step
    pub fn zoom_out(&mut self) {
        self.view = self.view.zoomed_out();
    }

    /// Set the horizontal scroll, limited to the overflow of `geometry`
    pub fn set_scroll(&mut self, scroll_offset: f64, geometry: &TrackGeometry) {
        self.view = self.view.with_scroll(scroll_offset).clamped_to(geometry);
    }

    /// Scroll by `delta` pixels, limited to the overflow of `geometry`
    pub fn scroll_by(&mut self, delta: f64, geometry: &TrackGeometry) {
        self.view = self.view.scrolled_by(delta).clamped_to(geometry);
    }

    // Transport

    /// Start playing
    pub fn play(&mut self, now_ms: f64, scheduler: &dyn FrameScheduler) {
        self.clock.play(now_ms, scheduler);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self, now_ms: f64, scheduler: &dyn FrameScheduler) {
        self.clock.toggle(now_ms, scheduler);
    }

    /// Deliver an animation frame to the clock
    ///
    /// Returns whether the playhead moved.
    pub fn on_frame(&mut self, frame: FrameId, timestamp_ms: f64, scheduler: &dyn FrameScheduler) -> bool {
        let total = self.store.total_duration();
        let moved = self.clock.on_frame(frame, timestamp_ms, total, scheduler);
        if moved {
            self.resolve();
        }
        moved
    }

    /// Move the playhead to `time`
    pub fn seek(&mut self, time: f64) {
        self.clock.seek(time, self.store.total_duration());
        self.resolve();
    }

    /// Move the playhead back one skip step
    pub fn skip_back(&mut self) {
        self.clock.skip_back(self.store.total_duration());
        self.resolve();
    }

    /// Move the playhead forward one skip step
    pub fn skip_forward(&mut self) {
        self.clock.skip_forward(self.store.total_duration());
        self.resolve();
    }

    /// Move the playhead to the start
    pub fn seek_start(&mut self) {
        self.clock.seek_start(self.store.total_duration());
        self.resolve();
    }

    /// Move the playhead to the end
    pub fn seek_end(&mut self) {
        self.clock.seek_end(self.store.total_duration());
        self.resolve();
    }

    /// Seek to the time under a pointer dragged along the ruler
    pub fn scrub(&mut self, pointer_x: f64, geometry: &TrackGeometry) {
        let time = ClipEditor::scrub_playhead(pointer_x, geometry, &self.view, self.store.total_duration());
        self.seek(time);
    }

    // Clip drags

    /// Start dragging part of the clip on layer `index`
    pub fn begin_drag(
        &mut self,
        index: usize,
        target: DragTarget,
        pointer_x: f64,
        geometry: &TrackGeometry,
    ) -> bool {
        self.editor
            .begin_drag(&self.store, index, target, pointer_x, geometry, &self.view)
    }

    /// Continue the current drag at `pointer_x`
    pub fn drag_to(&mut self, pointer_x: f64, geometry: &TrackGeometry) -> bool {
        let next = self.editor.drag_to(&self.store, pointer_x, geometry, &self.view);
        self.commit_store(next)
    }

    /// Finish the current drag
    pub fn end_drag(&mut self) {
        self.editor.end_drag();
    }

    // Renderer callbacks

    /// Replace the transform of an active clip
    pub fn on_transform_edit(&mut self, clip_id: ClipId, transform: ActiveTransform) -> bool {
        self.resolver.on_transform_edit(clip_id, transform)
    }

    /// Move an active clip on the canvas
    pub fn move_active(&mut self, clip_id: ClipId, x: f32, y: f32) -> bool {
        self.resolver.move_to(clip_id, x, y)
    }

    /// Resize an active clip on the canvas
    pub fn resize_active(&mut self, clip_id: ClipId, width: Extent, height: Extent) -> bool {
        self.resolver.resize_to(clip_id, width, height)
    }

    /// Release the frame loop and any drag; call before dropping the host
    pub fn teardown(&mut self) {
        self.editor.end_drag();
        self.clock.teardown();
    }

    fn resolve(&mut self) {
        self.resolver.resolve(self.clock.current_time(), &self.store);
    }
}

impl Default for TimelineSession {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MediaKind;
    use crate::clock::FrameQueue;
    use approx::assert_abs_diff_eq;

    fn video() -> AssetRef {
        AssetRef::new("video", MediaKind::Video, "clip.mp4")
    }

    fn clip_span(session: &TimelineSession, index: usize) -> (f64, f64) {
        let clip = session.store().layer(index).and_then(|l| l.clip.as_ref()).unwrap();
        (clip.start, clip.duration)
    }

    fn clip_id(session: &TimelineSession, index: usize) -> ClipId {
        session.store().layer(index).and_then(|l| l.clip.as_ref()).map(|c| c.id).unwrap()
    }

    /// Deliver every due frame at `timestamp_ms`
    fn pump(session: &mut TimelineSession, queue: &FrameQueue, timestamp_ms: f64) {
        for frame in queue.drain() {
            session.on_frame(frame, timestamp_ms, queue);
        }
    }

    #[test]
    fn test_scenario_a_place_trim_move() {
        let mut session = TimelineSession::default();
        assert_eq!(session.total_duration(), 300.0);
        session.add_layer();

        assert!(session.place_clip(0, video()));
        assert_eq!(clip_span(&session, 0), (0.0, 30.0));
        assert!(session.trim_clip(0, TrimEdge::End, 10.0));
        assert_eq!(clip_span(&session, 0), (0.0, 10.0));
        assert!(session.move_clip(0, 295.0));
        assert_eq!(clip_span(&session, 0), (290.0, 10.0));
    }

    #[test]
    fn test_scenario_b_locked_layer() {
        let mut session = TimelineSession::default();
        session.add_layer();
        session.add_layer();
        for index in 0..2 {
            session.place_clip(index, video());
            session.trim_clip(index, TrimEdge::End, 5.0);
            session.move_clip(index, 10.0);
        }
        session.toggle_lock(0);

        let before = session.store().clone();
        assert!(!session.move_clip(0, 50.0));
        assert_eq!(session.store(), &before);
        assert!(session.move_clip(1, 50.0));
        assert_eq!(clip_span(&session, 0), (10.0, 5.0));
        assert_eq!(clip_span(&session, 1), (50.0, 5.0));
    }

    #[test]
    fn test_scenario_c_clamp_at_end() {
        let queue = FrameQueue::new();
        let mut session = TimelineSession::default();
        session.seek(295.0);
        session.play(0.0, &queue);
        pump(&mut session, &queue, 15_000.0);

        assert_eq!(session.current_time(), 300.0);
        assert!(session.is_playing());
        assert!(session.is_armed());

        pump(&mut session, &queue, 16_000.0);
        assert_eq!(session.current_time(), 300.0);
    }

    #[test]
    fn test_pause_at_end_behavior() {
        let queue = FrameQueue::new();
        let config = TimelineConfig {
            end_behavior: EndBehavior::Pause,
            ..TimelineConfig::default()
        };
        let mut session = TimelineSession::new(config);
        session.seek(295.0);
        session.play(0.0, &queue);
        pump(&mut session, &queue, 15_000.0);

        assert_eq!(session.current_time(), 300.0);
        assert!(!session.is_playing());
        assert!(!session.is_armed());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_scenario_d_transform_lifecycle() {
        let mut session = TimelineSession::default();
        session.add_layer();
        session.place_clip(0, video());
        session.trim_clip(0, TrimEdge::End, 10.0);
        session.move_clip(0, 10.0);
        let id = clip_id(&session, 0);

        session.seek(15.0);
        assert_eq!(session.transform(id), Some(ActiveTransform::default()));

        let edited = ActiveTransform {
            x: 40.0,
            y: 20.0,
            ..ActiveTransform::default()
        };
        assert!(session.on_transform_edit(id, edited));

        session.seek(18.0);
        assert_eq!(session.transform(id), Some(edited));

        session.seek(21.0);
        assert!(session.active_media().is_empty());

        session.seek(12.0);
        assert_eq!(session.transform(id), Some(ActiveTransform::default()));
    }

    #[test]
    fn test_playback_resolves_each_frame() {
        let queue = FrameQueue::new();
        let mut session = TimelineSession::default();
        session.add_layer();
        session.place_clip(0, AssetRef::new("img", MediaKind::Image, "a.png"));
        session.move_clip(0, 1.0);

        session.play(0.0, &queue);
        pump(&mut session, &queue, 500.0);
        assert!(session.active_media().is_empty());
        pump(&mut session, &queue, 1_500.0);
        assert_eq!(session.active_media().len(), 1);
        pump(&mut session, &queue, 6_500.0);
        assert!(session.active_media().is_empty());
    }

    #[test]
    fn test_edits_while_paused_re_resolve() {
        let mut session = TimelineSession::default();
        session.add_layer();
        session.seek(50.0);

        session.place_clip(0, video());
        assert!(session.active_media().is_empty());

        session.move_clip(0, 40.0);
        assert_eq!(session.active_media().len(), 1);

        session.trim_clip(0, TrimEdge::End, 45.0);
        assert!(session.active_media().is_empty());

        session.trim_clip(0, TrimEdge::End, 60.0);
        session.remove_layer(0);
        assert!(session.active_media().is_empty());
    }

    #[test]
    fn test_hidden_layers_policy() {
        let mut session = TimelineSession::default();
        session.add_layer();
        session.place_clip(0, video());
        session.seek(1.0);
        session.toggle_hidden(0);
        assert_eq!(session.active_media().len(), 1);

        session.set_hidden_layers(HiddenLayerPolicy::Exclude);
        assert!(session.active_media().is_empty());

        session.toggle_hidden(0);
        assert_eq!(session.active_media().len(), 1);
    }

    #[test]
    fn test_total_duration_refits_clips_and_playhead() {
        let mut session = TimelineSession::default();
        session.add_layer();
        session.place_clip(0, video());
        session.move_clip(0, 250.0);
        session.seek(280.0);

        assert_eq!(session.set_total_duration_text("04:00"), Ok(true));
        assert_eq!(session.total_duration(), 240.0);
        assert_eq!(clip_span(&session, 0), (210.0, 30.0));
        assert_eq!(session.current_time(), 240.0);

        assert!(session.set_total_duration_text("4 minutes").is_err());
        assert_eq!(session.total_duration(), 240.0);
        assert_eq!(session.set_total_duration_text("04:00"), Ok(false));
    }

    #[test]
    fn test_zero_length_then_regrow_keeps_clip_playable() {
        let mut session = TimelineSession::default();
        session.add_layer();
        session.place_clip(0, video());

        assert_eq!(session.set_total_duration_text("00:00"), Ok(true));
        assert_eq!(clip_span(&session, 0), (0.0, 0.0));

        assert_eq!(session.set_total_duration_text("05:00"), Ok(true));
        session.move_clip(0, 100.0);
        let (start, duration) = clip_span(&session, 0);
        assert_eq!(start, 100.0);
        assert!(duration >= 0.5);

        session.seek(100.25);
        assert_eq!(session.active_media().len(), 1);
    }

    #[test]
    fn test_drag_during_playback() {
        let queue = FrameQueue::new();
        let geometry = TrackGeometry::new(0.0, 600.0);
        let mut session = TimelineSession::default();
        session.add_layer();
        session.place_clip(0, video());

        session.play(0.0, &queue);
        let grab = session.view().time_to_pixel(10.0, &geometry, 300.0);
        assert!(session.begin_drag(0, DragTarget::Body, grab, &geometry));
        pump(&mut session, &queue, 1_000.0);

        let pointer = session.view().time_to_pixel(110.0, &geometry, 300.0);
        assert!(session.drag_to(pointer, &geometry));
        pump(&mut session, &queue, 2_000.0);
        session.end_drag();

        assert_abs_diff_eq!(clip_span(&session, 0).0, 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(session.current_time(), 2.0, epsilon = 1e-9);
        assert!(session.active_media().is_empty());
    }

    #[test]
    fn test_zoom_and_scroll() {
        let geometry = TrackGeometry::new(0.0, 600.0);
        let mut session = TimelineSession::default();
        session.set_zoom(2.0);
        session.set_scroll(5_000.0, &geometry);
        assert_eq!(session.view().scroll_offset(), 600.0);
        session.scroll_by(-100.0, &geometry);
        assert_eq!(session.view().scroll_offset(), 500.0);

        session.scrub(0.0, &geometry);
        assert_abs_diff_eq!(session.current_time(), 125.0, epsilon = 1e-9);
        assert_abs_diff_eq!(session.progress_percent(), 125.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_teardown_releases_frame() {
        let queue = FrameQueue::new();
        let mut session = TimelineSession::default();
        session.play(0.0, &queue);
        assert_eq!(queue.pending_count(), 1);

        session.teardown();
        assert_eq!(queue.pending_count(), 0);
        assert!(!session.is_playing());
    }

    #[test]
    fn test_drop_payload() {
        let mut session = TimelineSession::default();
        session.add_layer();
        assert!(!session.drop_payload(0, "{broken"));
        assert!(session.drop_payload(0, &video().to_drop_payload()));
        assert_eq!(clip_span(&session, 0), (0.0, 30.0));
    }
}
