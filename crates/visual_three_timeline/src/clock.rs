// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clock.
//!
//! The clock is a two-state machine (paused / playing) that advances the
//! playhead from host animation frames. While playing it holds exactly one
//! [`FrameRequest`]; the request cancels itself when dropped, so pausing,
//! tearing down or dropping the clock always releases the pending frame
//! callback.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// What the clock does when the playhead reaches the end of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndBehavior {
    /// Keep playing with the playhead frozen at the end
    #[default]
    Hold,
    /// Pause automatically and release the frame loop
    Pause,
}

/// Playhead position and transport state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayheadState {
    /// Current time in seconds, always within `[0, total_duration]`
    pub current_time: f64,
    /// Whether the clock is advancing
    pub is_playing: bool,
}

impl PlayheadState {
    /// Playhead moved forward by `delta_seconds`, stopping at the end
    ///
    /// Negative deltas are treated as zero so time never runs backwards
    /// while playing.
    pub fn advanced(self, delta_seconds: f64, total_duration: f64) -> Self {
        let delta = if delta_seconds.is_finite() { delta_seconds.max(0.0) } else { 0.0 };
        Self {
            current_time: clamp_time(self.current_time + delta, total_duration),
            ..self
        }
    }

    /// Playhead placed at `time`, clamped to the timeline
    pub fn seeked(self, time: f64, total_duration: f64) -> Self {
        if time.is_nan() {
            return self;
        }
        Self {
            current_time: clamp_time(time, total_duration),
            ..self
        }
    }

    /// Playhead moved by `delta` seconds in either direction
    pub fn skipped(self, delta: f64, total_duration: f64) -> Self {
        self.seeked(self.current_time + delta, total_duration)
    }

    /// Whether the playhead sits at the end of the timeline
    pub fn at_end(&self, total_duration: f64) -> bool {
        self.current_time >= total_duration.max(0.0)
    }
}

fn clamp_time(time: f64, total_duration: f64) -> f64 {
    time.min(total_duration.max(0.0)).max(0.0)
}

/// Identifier of a requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Handle to a pending frame callback; dropping it cancels the callback
pub struct FrameRequest {
    id: FrameId,
    cancel: Option<Box<dyn FnOnce(FrameId)>>,
}

impl FrameRequest {
    /// Create a request that runs `cancel` when dropped
    pub fn new(id: FrameId, cancel: impl FnOnce(FrameId) + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Create a request with nothing to release
    pub fn detached(id: FrameId) -> Self {
        Self { id, cancel: None }
    }

    /// ID of the requested frame
    pub fn id(&self) -> FrameId {
        self.id
    }
}

impl Drop for FrameRequest {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel(self.id);
        }
    }
}

impl std::fmt::Debug for FrameRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRequest").field("id", &self.id).finish()
    }
}

/// Source of animation frames (the host's display refresh)
pub trait FrameScheduler {
    /// Ask for one callback on the next frame
    fn request_frame(&self) -> FrameRequest;
}

#[derive(Debug, Default)]
struct FrameQueueInner {
    next_id: u64,
    pending: Vec<FrameId>,
}

/// In-process frame scheduler
///
/// The host calls [`FrameQueue::drain`] once per display refresh and
/// delivers each returned ID to its owner.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    inner: Rc<RefCell<FrameQueueInner>>,
}

impl FrameQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames requested and not yet delivered or cancelled
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Take every due frame
    pub fn drain(&self) -> Vec<FrameId> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self) -> FrameRequest {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = FrameId(inner.next_id);
            inner.next_id += 1;
            inner.pending.push(id);
            id
        };

        let queue: Weak<RefCell<FrameQueueInner>> = Rc::downgrade(&self.inner);
        FrameRequest::new(id, move |id| {
            if let Some(inner) = queue.upgrade() {
                inner.borrow_mut().pending.retain(|pending| *pending != id);
            }
        })
    }
}

/// Armed frame loop: the pending request and the last frame timestamp
#[derive(Debug)]
struct FrameLoop {
    request: FrameRequest,
    last_timestamp_ms: f64,
}

/// Playback clock driving the playhead
#[derive(Debug)]
pub struct PlaybackClock {
    state: PlayheadState,
    frame_loop: Option<FrameLoop>,
    end_behavior: EndBehavior,
    skip_step: f64,
}

impl PlaybackClock {
    /// Create a paused clock at time zero
    pub fn new(end_behavior: EndBehavior, skip_step: f64) -> Self {
        Self {
            state: PlayheadState::default(),
            frame_loop: None,
            end_behavior,
            skip_step,
        }
    }

    /// Current playhead snapshot
    pub fn state(&self) -> PlayheadState {
        self.state
    }

    /// Current time in seconds
    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    /// Whether the clock is playing
    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Whether a frame callback is pending
    pub fn is_armed(&self) -> bool {
        self.frame_loop.is_some()
    }

    /// End-of-timeline behaviour
    pub fn end_behavior(&self) -> EndBehavior {
        self.end_behavior
    }

    /// Change the end-of-timeline behaviour
    pub fn set_end_behavior(&mut self, end_behavior: EndBehavior) {
        self.end_behavior = end_behavior;
    }

    /// Start playing; `now_ms` is the wall clock the first frame is measured from
    pub fn play(&mut self, now_ms: f64, scheduler: &dyn FrameScheduler) {
        if self.state.is_playing {
            return;
        }
        tracing::info!(time = self.state.current_time, "Playback started");
        self.state.is_playing = true;
        self.frame_loop = Some(FrameLoop {
            request: scheduler.request_frame(),
            last_timestamp_ms: now_ms,
        });
    }

    /// Stop playing; the playhead keeps its position
    pub fn pause(&mut self) {
        if !self.state.is_playing {
            return;
        }
        tracing::info!(time = self.state.current_time, "Playback paused");
        self.state.is_playing = false;
        self.frame_loop = None;
    }

    /// Toggle between playing and paused
    pub fn toggle(&mut self, now_ms: f64, scheduler: &dyn FrameScheduler) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play(now_ms, scheduler);
        }
    }

    /// Deliver an animation frame
    ///
    /// Returns whether the playhead moved. Frames other than the pending
    /// request are stale and ignored.
    pub fn on_frame(
        &mut self,
        frame: FrameId,
        timestamp_ms: f64,
        total_duration: f64,
        scheduler: &dyn FrameScheduler,
    ) -> bool {
        let Some(frame_loop) = self.frame_loop.as_mut() else {
            tracing::trace!(?frame, "Ignoring frame: clock is not armed");
            return false;
        };
        if frame_loop.request.id() != frame {
            tracing::trace!(?frame, "Ignoring stale frame");
            return false;
        }

        let delta_seconds = (timestamp_ms - frame_loop.last_timestamp_ms) / 1000.0;
        frame_loop.last_timestamp_ms = timestamp_ms;

        let previous = self.state;
        self.state = self.state.advanced(delta_seconds, total_duration);
        tracing::trace!(time = self.state.current_time, delta_seconds, "Clock tick");

        if self.state.at_end(total_duration) && self.end_behavior == EndBehavior::Pause {
            tracing::info!("Reached end of timeline");
            self.pause();
        } else if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.request = scheduler.request_frame();
        }

        self.state != previous
    }

    /// Move the playhead to `time`
    pub fn seek(&mut self, time: f64, total_duration: f64) {
        self.state = self.state.seeked(time, total_duration);
    }

    /// Move the playhead back by one skip step
    pub fn skip_back(&mut self, total_duration: f64) {
        self.state = self.state.skipped(-self.skip_step, total_duration);
    }

    /// Move the playhead forward by one skip step
    pub fn skip_forward(&mut self, total_duration: f64) {
        self.state = self.state.skipped(self.skip_step, total_duration);
    }

    /// Move the playhead to the start
    pub fn seek_start(&mut self, total_duration: f64) {
        self.seek(0.0, total_duration);
    }

    /// Move the playhead to the end
    pub fn seek_end(&mut self, total_duration: f64) {
        self.seek(total_duration, total_duration);
    }

    /// Re-apply the bound after the timeline length changed
    pub fn clamp_to(&mut self, total_duration: f64) {
        self.state = self.state.seeked(self.state.current_time, total_duration);
    }

    /// Release the frame loop; call when the owning component goes away
    pub fn teardown(&mut self) {
        if self.frame_loop.take().is_some() {
            tracing::debug!("Frame loop released on teardown");
        }
        self.state.is_playing = false;
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(EndBehavior::default(), 5.0)
    }
}
