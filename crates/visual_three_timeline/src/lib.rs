// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-track media timeline and playback engine for Visual Three.
//!
//! This crate provides the editing core behind the timeline panel:
//! - Layer stack with one clip per layer (immutable snapshots)
//! - Pixel/time mapping under zoom and scroll
//! - Drag-to-move and drag-to-trim gestures
//! - Frame-driven playback clock
//! - Active media resolution with per-clip canvas transforms
//!
//! ## Architecture
//!
//! The engine is built on:
//! - [`ClipStore`] snapshots replaced wholesale on every edit
//! - [`TimelineSession`] as the single owner of store, clock and view
//! - [`FrameScheduler`] as the seam to the host's display refresh
//! - [`TimelinePanel`] rendering the track view with egui

pub mod active;
pub mod asset;
pub mod clock;
pub mod config;
pub mod editor;
pub mod layer;
pub mod mapper;
pub mod session;
pub mod store;
pub mod timecode;
pub mod ui;
pub mod view;

pub use active::{
    ActiveMedia, ActiveMediaResolver, ActiveTransform, Extent, HiddenLayerPolicy, ResolveDelta,
};
pub use asset::{AssetId, AssetRef, MediaKind, PayloadError};
pub use clock::{
    EndBehavior, FrameId, FrameQueue, FrameRequest, FrameScheduler, PlaybackClock, PlayheadState,
};
pub use config::{ConfigError, TimelineConfig, CONFIG_FILE_NAME};
pub use editor::{ClipEditor, DragSession, DragTarget};
pub use layer::{Clip, ClipId, Layer, LayerId};
pub use mapper::TrackGeometry;
pub use session::TimelineSession;
pub use store::{ClipLimits, ClipStore, TrimEdge};
pub use timecode::{format_timecode, format_timecode_precise, parse_timecode, TimecodeError};
pub use ui::TimelinePanel;
pub use view::ViewState;
