// SPDX-License-Identifier: MIT OR Apache-2.0
//! Zoom and horizontal scroll of the track view.

use crate::config::TimelineConfig;
use crate::mapper::{self, TrackGeometry};

/// Zoom step applied by the zoom in / zoom out buttons
const ZOOM_STEP: f64 = 1.25;

/// View parameters that affect the pixel/time mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f64,
    scroll_offset: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl ViewState {
    /// Create a view that fits the timeline to the track width
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            zoom: 1.0_f64.max(min_zoom).min(max_zoom),
            scroll_offset: 0.0,
            min_zoom,
            max_zoom,
        }
    }

    /// Create a view using the configured zoom range
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self::new(config.min_zoom, config.max_zoom)
    }

    /// Zoom factor (1.0 = fit width)
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Horizontal scroll in pixels
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Allowed zoom range
    pub fn zoom_range(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// View with a new zoom factor, clamped to the allowed range
    pub fn with_zoom(self, zoom: f64) -> Self {
        if zoom.is_nan() {
            return self;
        }
        Self {
            zoom: zoom.max(self.min_zoom).min(self.max_zoom),
            ..self
        }
    }

    /// View zoomed in by one step
    pub fn zoomed_in(self) -> Self {
        self.with_zoom(self.zoom * ZOOM_STEP)
    }

    /// View zoomed out by one step
    pub fn zoomed_out(self) -> Self {
        self.with_zoom(self.zoom / ZOOM_STEP)
    }

    /// View with a new scroll offset; negative offsets clamp to zero
    pub fn with_scroll(self, scroll_offset: f64) -> Self {
        if scroll_offset.is_nan() {
            return self;
        }
        Self {
            scroll_offset: scroll_offset.max(0.0),
            ..self
        }
    }

    /// View scrolled by `delta` pixels
    pub fn scrolled_by(self, delta: f64) -> Self {
        self.with_scroll(self.scroll_offset + delta)
    }

    /// Largest useful scroll offset for a track of the given geometry
    pub fn max_scroll(&self, geometry: &TrackGeometry) -> f64 {
        (geometry.content_width(self.zoom) - geometry.width).max(0.0)
    }

    /// View with the scroll offset limited to the scrollable overflow
    pub fn clamped_to(self, geometry: &TrackGeometry) -> Self {
        let max_scroll = self.max_scroll(geometry);
        Self {
            scroll_offset: self.scroll_offset.min(max_scroll),
            ..self
        }
    }

    /// Map a pointer x coordinate to seconds under this view
    pub fn pixel_to_time(&self, pixel_x: f64, geometry: &TrackGeometry, total_duration: f64) -> f64 {
        mapper::pixel_to_time(
            pixel_x,
            geometry.left,
            geometry.width,
            self.zoom,
            self.scroll_offset,
            total_duration,
        )
    }

    /// Map seconds to a pointer x coordinate under this view
    pub fn time_to_pixel(&self, time: f64, geometry: &TrackGeometry, total_duration: f64) -> f64 {
        mapper::time_to_pixel(
            time,
            geometry.left,
            geometry.width,
            self.zoom,
            self.scroll_offset,
            total_duration,
        )
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zoom_clamped() {
        let view = ViewState::default();
        assert_eq!(view.zoom(), 1.0);
        assert_eq!(view.with_zoom(5.0).zoom(), 2.0);
        assert_eq!(view.with_zoom(0.01).zoom(), 0.1);
        assert_eq!(view.with_zoom(f64::NAN).zoom(), 1.0);
        assert_abs_diff_eq!(view.zoomed_in().zoom(), 1.25);
        assert_abs_diff_eq!(view.zoomed_out().zoom(), 0.8);
    }

    #[test]
    fn test_scroll_clamped() {
        let view = ViewState::default();
        assert_eq!(view.with_scroll(-20.0).scroll_offset(), 0.0);
        assert_eq!(view.scrolled_by(30.0).scrolled_by(-10.0).scroll_offset(), 20.0);

        let geometry = TrackGeometry::new(180.0, 600.0);
        // Fit width: nothing to scroll
        assert_eq!(view.with_scroll(100.0).clamped_to(&geometry).scroll_offset(), 0.0);
        // 2x zoom: 600px of overflow
        let zoomed = view.with_zoom(2.0).with_scroll(1000.0).clamped_to(&geometry);
        assert_eq!(zoomed.scroll_offset(), 600.0);
    }

    #[test]
    fn test_mapping_follows_view() {
        let geometry = TrackGeometry::new(0.0, 600.0);
        let view = ViewState::default().with_zoom(2.0).with_scroll(600.0);
        assert_abs_diff_eq!(view.pixel_to_time(0.0, &geometry, 300.0), 150.0);
        assert_abs_diff_eq!(view.time_to_pixel(150.0, &geometry, 300.0), 0.0);
    }
}
