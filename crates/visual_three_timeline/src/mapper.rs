// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion between pointer pixels and timeline seconds.
//!
//! The track area is `width` pixels wide on screen. At zoom `z` the whole
//! timeline spans `width * z` pixels, of which the window shows the slice
//! starting at `scroll_offset`. All functions guard against a zero duration
//! or a zero-width track and return time zero instead of dividing by zero.

/// Screen placement of the track area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGeometry {
    /// X coordinate of the left edge of the track area
    pub left: f64,
    /// Visible width of the track area
    pub width: f64,
}

impl TrackGeometry {
    /// Create a track geometry
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Total width of the timeline content at the given zoom
    pub fn content_width(&self, zoom: f64) -> f64 {
        (self.width * zoom).max(0.0)
    }
}

fn is_positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

/// Map a pointer x coordinate to seconds
pub fn pixel_to_time(
    pixel_x: f64,
    track_left: f64,
    track_width: f64,
    zoom: f64,
    scroll_offset: f64,
    total_duration: f64,
) -> f64 {
    let content_width = track_width * zoom;
    if !is_positive(content_width) || !is_positive(total_duration) {
        return 0.0;
    }
    let relative = (pixel_x - track_left + scroll_offset)
        .max(0.0)
        .min(content_width);
    (relative / content_width) * total_duration
}

/// Map seconds to a pointer x coordinate; inverse of [`pixel_to_time`]
pub fn time_to_pixel(
    time: f64,
    track_left: f64,
    track_width: f64,
    zoom: f64,
    scroll_offset: f64,
    total_duration: f64,
) -> f64 {
    if !is_positive(total_duration) {
        return track_left - scroll_offset;
    }
    track_left + (time / total_duration) * track_width * zoom - scroll_offset
}

/// Position of `time` as a percentage of the timeline, clamped to `[0, 100]`
pub fn time_to_percent(time: f64, total_duration: f64) -> f64 {
    if !is_positive(total_duration) {
        return 0.0;
    }
    ((time / total_duration) * 100.0).clamp(0.0, 100.0)
}

/// Width of a span of `duration` seconds as a percentage of the timeline
pub fn duration_to_percent(duration: f64, total_duration: f64) -> f64 {
    time_to_percent(duration, total_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pixel_to_time_fit_width() {
        // 180px name column, 600px track, 300s timeline
        assert_abs_diff_eq!(pixel_to_time(180.0, 180.0, 600.0, 1.0, 0.0, 300.0), 0.0);
        assert_abs_diff_eq!(pixel_to_time(480.0, 180.0, 600.0, 1.0, 0.0, 300.0), 150.0);
        assert_abs_diff_eq!(pixel_to_time(780.0, 180.0, 600.0, 1.0, 0.0, 300.0), 300.0);
    }

    #[test]
    fn test_pixel_to_time_clamps() {
        assert_abs_diff_eq!(pixel_to_time(0.0, 180.0, 600.0, 1.0, 0.0, 300.0), 0.0);
        assert_abs_diff_eq!(pixel_to_time(5000.0, 180.0, 600.0, 1.0, 0.0, 300.0), 300.0);
        assert_abs_diff_eq!(pixel_to_time(f64::NAN, 180.0, 600.0, 1.0, 0.0, 300.0), 0.0);
    }

    #[test]
    fn test_pixel_to_time_zoom_and_scroll() {
        // At 2x zoom the content is 1200px wide; scrolled by 600px the left
        // edge of the track shows the middle of the timeline.
        assert_abs_diff_eq!(pixel_to_time(0.0, 0.0, 600.0, 2.0, 600.0, 300.0), 150.0);
        assert_abs_diff_eq!(pixel_to_time(300.0, 0.0, 600.0, 2.0, 600.0, 300.0), 225.0);
    }

    #[test]
    fn test_zero_guards() {
        assert_eq!(pixel_to_time(100.0, 0.0, 0.0, 1.0, 0.0, 300.0), 0.0);
        assert_eq!(pixel_to_time(100.0, 0.0, 600.0, 0.0, 0.0, 300.0), 0.0);
        assert_eq!(pixel_to_time(100.0, 0.0, 600.0, 1.0, 0.0, 0.0), 0.0);
        assert_eq!(time_to_percent(10.0, 0.0), 0.0);
        assert_eq!(time_to_pixel(10.0, 50.0, 600.0, 1.0, 20.0, 0.0), 30.0);
    }

    #[test]
    fn test_round_trip_at_any_view() {
        let total = 300.0;
        for &zoom in &[0.1, 0.5, 1.0, 1.37, 2.0] {
            for &scroll in &[0.0, 12.5, 250.0, 1000.0] {
                for step in 0..=60 {
                    let t = total * f64::from(step) / 60.0;
                    let x = time_to_pixel(t, 180.0, 640.0, zoom, scroll, total);
                    let back = pixel_to_time(x, 180.0, 640.0, zoom, scroll, total);
                    assert_abs_diff_eq!(back, t, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_percentages() {
        assert_abs_diff_eq!(time_to_percent(75.0, 300.0), 25.0);
        assert_abs_diff_eq!(time_to_percent(-5.0, 300.0), 0.0);
        assert_abs_diff_eq!(time_to_percent(400.0, 300.0), 100.0);
        assert_abs_diff_eq!(duration_to_percent(30.0, 300.0), 10.0);
    }
}
