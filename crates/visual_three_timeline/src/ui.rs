// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track view rendering.
//!
//! Features:
//! - Toolbar with timeline length field, zoom controls and Add Layer
//! - Time ruler with playhead scrubbing and a progress bar
//! - Layer headers with expand/lock/hide/delete buttons
//! - Vertical scrolling once the layers outgrow the panel
//! - Clip bodies and trim handles driven by pointer drags
//! - Drop target for media dragged from the library

use crate::asset::AssetRef;
use crate::editor::DragTarget;
use crate::layer::{Clip, Layer};
use crate::mapper::TrackGeometry;
use crate::session::TimelineSession;
use crate::timecode::{format_timecode, format_timecode_precise};
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

const RULER_HEIGHT: f32 = 24.0;
const PROGRESS_HEIGHT: f32 = 3.0;
const HANDLE_WIDTH: f32 = 6.0;
const PLAYHEAD_WIDTH: f32 = 2.0;
const BUTTON_SIZE: f32 = 20.0;
const SCROLLBAR_SIZE: f32 = 16.0;
const MIN_TICK_SPACING: f64 = 60.0;
const TICK_INTERVALS: [f64; 10] = [1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0];

const PLAYHEAD_COLOR: Color32 = Color32::from_rgb(239, 68, 68);

fn color32(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Edits requested while drawing, applied once the frame's layout is done
#[derive(Debug)]
enum RowAction {
    ToggleExpanded(usize),
    ToggleLock(usize),
    ToggleHidden(usize),
    Remove(usize),
    Drop(usize, String),
    BeginDrag(usize, DragTarget, f64),
    DragTo(f64),
    EndDrag,
}

/// Track view panel state
#[derive(Debug, Clone, Default)]
pub struct TimelinePanel {
    /// Contents of the length field
    length_text: String,
    /// Whether the length field had focus last frame
    length_editing: bool,
    /// Parse error of the last committed length text
    length_error: Option<String>,
    /// Vertical scroll offset of the layer rows in points
    vertical_scroll: f32,
}

impl TimelinePanel {
    /// Create a new panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the panel and apply the user's edits to `session`
    pub fn ui(&mut self, ui: &mut egui::Ui, session: &mut TimelineSession) {
        self.render_toolbar(ui, session);
        ui.separator();

        let name_width = session.config().layer_name_width;
        let area = ui.available_rect_before_wrap();
        let ruler_rect = Rect::from_min_size(area.min, Vec2::new(area.width(), RULER_HEIGHT));

        // Rows sit between the ruler and the horizontal scrollbar
        let rows_top = ruler_rect.max.y + PROGRESS_HEIGHT;
        let rows_bottom_limit = (area.max.y - SCROLLBAR_SIZE - 6.0).max(rows_top);
        let max_vertical = max_vertical_scroll(rows_height(session), rows_bottom_limit - rows_top);
        self.vertical_scroll = self.vertical_scroll.min(max_vertical).max(0.0);
        let rows_right = if max_vertical > 0.0 {
            area.max.x - SCROLLBAR_SIZE
        } else {
            area.max.x
        };
        let rows_rect = Rect::from_min_max(
            Pos2::new(area.min.x, rows_top),
            Pos2::new(rows_right, rows_bottom_limit),
        );

        let geometry = TrackGeometry::new(
            f64::from(area.min.x + name_width),
            f64::from((rows_right - area.min.x - name_width).max(1.0)),
        );
        // A shrinking panel can leave the scroll past the new overflow
        session.set_scroll(session.view().scroll_offset(), &geometry);

        self.render_ruler(ui, ruler_rect, &geometry, session);

        let mut actions = Vec::new();
        let rows_bottom = self.render_rows(ui, rows_rect, &geometry, session, &mut actions);

        self.render_playhead(ui, area, rows_top, rows_bottom, &geometry, session);
        self.render_scrollbar(ui, area, rows_bottom, &geometry, session);
        self.render_vertical_scrollbar(ui, rows_rect, max_vertical);
        self.handle_wheel(ui, area, &geometry, max_vertical, session);

        for action in actions {
            apply(action, session, &geometry);
        }
    }

    /// Render toolbar with length, zoom and layer controls
    fn render_toolbar(&mut self, ui: &mut egui::Ui, session: &mut TimelineSession) {
        if !self.length_editing {
            self.length_text = format_timecode(session.total_duration());
        }

        ui.horizontal(|ui| {
            ui.label("Length:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.length_text)
                    .desired_width(70.0)
                    .hint_text("MM:SS"),
            );
            self.length_editing = response.has_focus();
            if response.lost_focus() {
                match session.set_total_duration_text(&self.length_text) {
                    Ok(_) => self.length_error = None,
                    Err(err) => {
                        tracing::debug!(%err, text = %self.length_text, "Rejected timeline length");
                        self.length_error = Some(err.to_string());
                    }
                }
            }
            if let Some(err) = &self.length_error {
                ui.colored_label(Color32::from_rgb(248, 113, 113), err);
            }

            ui.separator();

            ui.label("Zoom:");
            if ui.button("-").clicked() {
                session.zoom_out();
            }
            let (min_zoom, max_zoom) = session.view().zoom_range();
            let mut zoom = session.view().zoom();
            let slider = egui::Slider::new(&mut zoom, min_zoom..=max_zoom)
                .fixed_decimals(1)
                .suffix("x");
            if ui.add(slider).changed() {
                session.set_zoom(zoom);
            }
            if ui.button("+").clicked() {
                session.zoom_in();
            }

            ui.separator();

            if ui.button("Add Layer").clicked() {
                session.add_layer();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.monospace(format!(
                    "{} / {}",
                    format_timecode_precise(session.current_time()),
                    format_timecode(session.total_duration())
                ));
                ui.label(format!("{} layers", session.store().layer_count()));
            });
        });
    }

    /// Render the time ruler and handle playhead scrubbing on it
    fn render_ruler(
        &mut self,
        ui: &mut egui::Ui,
        rect: Rect,
        geometry: &TrackGeometry,
        session: &mut TimelineSession,
    ) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(40));

        let view = session.view();
        let total = session.total_duration();
        let track_left = geometry.left as f32;
        if total > 0.0 {
            let pixels_per_second = geometry.content_width(view.zoom()) / total;
            let interval = TICK_INTERVALS
                .iter()
                .copied()
                .find(|interval| interval * pixels_per_second >= MIN_TICK_SPACING)
                .unwrap_or_else(|| (MIN_TICK_SPACING / pixels_per_second).ceil());

            let visible_start = view.pixel_to_time(geometry.left, geometry, total);
            let visible_end = view.pixel_to_time(f64::from(rect.max.x), geometry, total);
            let mut time = (visible_start / interval).floor() * interval;
            while time <= visible_end {
                let x = view.time_to_pixel(time, geometry, total) as f32;
                if x >= track_left && x <= rect.max.x {
                    painter.line_segment(
                        [Pos2::new(x, rect.max.y - 8.0), Pos2::new(x, rect.max.y)],
                        Stroke::new(1.0, Color32::from_gray(140)),
                    );
                    painter.text(
                        Pos2::new(x + 2.0, rect.min.y + 3.0),
                        egui::Align2::LEFT_TOP,
                        format_timecode(time),
                        egui::FontId::monospace(10.0),
                        Color32::from_gray(180),
                    );
                }
                time += interval;
            }
        }

        // Progress bar under the ruler
        let bar_rect = Rect::from_min_size(
            Pos2::new(rect.min.x, rect.max.y),
            Vec2::new(rect.width(), PROGRESS_HEIGHT),
        );
        let filled = bar_rect.width() * (session.progress_percent() / 100.0) as f32;
        let bar_painter = ui.painter_at(bar_rect);
        bar_painter.rect_filled(bar_rect, 0.0, Color32::from_gray(25));
        bar_painter.rect_filled(
            Rect::from_min_size(bar_rect.min, Vec2::new(filled, PROGRESS_HEIGHT)),
            0.0,
            PLAYHEAD_COLOR,
        );

        let track_rect = Rect::from_min_max(Pos2::new(track_left, rect.min.y), rect.max);
        let response = ui.interact(track_rect, ui.id().with("timeline_ruler"), Sense::click_and_drag());
        if response.clicked() || response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                session.scrub(f64::from(pos.x), geometry);
            }
        }
    }

    /// Render the layer rows visible in `rows_rect`; returns the bottom edge of the last one
    fn render_rows(
        &mut self,
        ui: &mut egui::Ui,
        rows_rect: Rect,
        geometry: &TrackGeometry,
        session: &TimelineSession,
        actions: &mut Vec<RowAction>,
    ) -> f32 {
        let store = session.store().clone();

        // Rows scrolled under the ruler are clipped for both painting and hit tests
        let mut rows_ui = ui.new_child(egui::UiBuilder::new().max_rect(rows_rect));
        rows_ui.set_clip_rect(rows_rect.intersect(ui.clip_rect()));

        let mut y = rows_rect.min.y - self.vertical_scroll;
        for (index, layer) in store.layers().enumerate() {
            let height = session.config().row_height(layer.expanded);
            let row_rect = Rect::from_min_size(Pos2::new(rows_rect.min.x, y), Vec2::new(rows_rect.width(), height));
            y += height;
            if row_rect.max.y < rows_rect.min.y {
                continue;
            }
            if row_rect.min.y > rows_rect.max.y {
                break;
            }
            self.render_row(&mut rows_ui, row_rect, index, layer, geometry, session, actions);
        }

        if store.is_empty() {
            ui.painter().text(
                Pos2::new(rows_rect.center().x, rows_rect.min.y + 30.0),
                egui::Align2::CENTER_CENTER,
                "No layers. Click Add Layer to start.",
                egui::FontId::proportional(12.0),
                Color32::from_gray(120),
            );
        }
        y.min(rows_rect.max.y)
    }

    /// Render a single layer row
    #[allow(clippy::too_many_arguments)]
    fn render_row(
        &mut self,
        ui: &mut egui::Ui,
        rect: Rect,
        index: usize,
        layer: &Layer,
        geometry: &TrackGeometry,
        session: &TimelineSession,
        actions: &mut Vec<RowAction>,
    ) {
        let painter = ui.painter_at(rect);
        let name_width = session.config().layer_name_width;

        // Alternating background
        let bg_color = if index % 2 == 0 {
            Color32::from_gray(32)
        } else {
            Color32::from_gray(28)
        };
        painter.rect_filled(rect, 0.0, bg_color);

        // Header
        let header_rect = Rect::from_min_size(rect.min, Vec2::new(name_width, rect.height()));
        painter.rect_filled(header_rect, 0.0, Color32::from_gray(35));
        let text_color = if layer.hidden {
            Color32::from_gray(100)
        } else {
            Color32::from_gray(200)
        };
        painter.text(
            Pos2::new(header_rect.min.x + 8.0, header_rect.min.y + 14.0),
            egui::Align2::LEFT_CENTER,
            Layer::display_name(index),
            egui::FontId::proportional(12.0),
            text_color,
        );

        let buttons: [(&str, &str, RowAction); 4] = [
            (
                if layer.expanded { "⏶" } else { "⏷" },
                "Expand/collapse",
                RowAction::ToggleExpanded(index),
            ),
            (
                if layer.locked { "🔒" } else { "🔓" },
                "Lock",
                RowAction::ToggleLock(index),
            ),
            (
                if layer.hidden { "🚫" } else { "👁" },
                "Hide",
                RowAction::ToggleHidden(index),
            ),
            ("🗑", "Delete layer", RowAction::Remove(index)),
        ];
        let mut x = header_rect.max.x - 4.0 - BUTTON_SIZE * buttons.len() as f32;
        for (label, hover, action) in buttons {
            let button_rect = Rect::from_min_size(
                Pos2::new(x, header_rect.min.y + 4.0),
                Vec2::splat(BUTTON_SIZE),
            );
            let response = ui.put(button_rect, egui::Button::new(label).small().frame(false));
            if response.on_hover_text(hover).clicked() {
                actions.push(action);
            }
            x += BUTTON_SIZE;
        }

        // Track area
        let track_rect = Rect::from_min_max(
            Pos2::new(geometry.left as f32, rect.min.y),
            Pos2::new(rect.max.x, rect.max.y - 1.0),
        );
        let drop_zone = ui.interact(track_rect, ui.id().with(("layer_drop", layer.id)), Sense::hover());
        if drop_zone.dnd_hover_payload::<String>().is_some() && !layer.locked {
            painter.rect_filled(track_rect, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 30));
        }
        if let Some(payload) = drop_zone.dnd_release_payload::<String>() {
            actions.push(RowAction::Drop(index, String::clone(&payload)));
        }

        match &layer.clip {
            None => {
                painter.text(
                    track_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Drag media here",
                    egui::FontId::proportional(11.0),
                    Color32::from_gray(90),
                );
            }
            Some(clip) => {
                self.render_clip(ui, &painter, track_rect, index, layer, clip, geometry, session, actions);
            }
        }

        if layer.locked {
            painter.rect_filled(track_rect, 0.0, Color32::from_rgba_unmultiplied(0, 0, 0, 60));
        }

        // Separator line
        painter.line_segment(
            [Pos2::new(rect.min.x, rect.max.y), Pos2::new(rect.max.x, rect.max.y)],
            Stroke::new(1.0, Color32::from_gray(45)),
        );
    }

    /// Render a clip with its trim handles and route drags on it
    #[allow(clippy::too_many_arguments)]
    fn render_clip(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        track_rect: Rect,
        index: usize,
        layer: &Layer,
        clip: &Clip,
        geometry: &TrackGeometry,
        session: &TimelineSession,
        actions: &mut Vec<RowAction>,
    ) {
        let view = session.view();
        let total = session.total_duration();
        let left = view.time_to_pixel(clip.start, geometry, total) as f32;
        let right = view.time_to_pixel(clip.end(), geometry, total) as f32;
        let clip_rect = Rect::from_min_max(
            Pos2::new(left, track_rect.min.y + 4.0),
            Pos2::new(right.max(left + 1.0), track_rect.max.y - 4.0),
        );
        let visible = clip_rect.intersect(track_rect);
        if !visible.is_positive() {
            return;
        }

        let base = color32(clip.kind().color());
        let fill = if layer.hidden { base.gamma_multiply(0.35) } else { base.gamma_multiply(0.8) };
        painter.rect_filled(clip_rect, 3.0, fill);
        painter.rect_stroke(clip_rect, 3.0, Stroke::new(1.0, base));

        painter.text(
            Pos2::new(visible.min.x + HANDLE_WIDTH + 4.0, clip_rect.min.y + 10.0),
            egui::Align2::LEFT_CENTER,
            &clip.media.display_name,
            egui::FontId::proportional(11.0),
            Color32::WHITE,
        );
        if layer.expanded {
            painter.text(
                Pos2::new(visible.min.x + HANDLE_WIDTH + 4.0, clip_rect.min.y + 28.0),
                egui::Align2::LEFT_CENTER,
                clip_details(clip),
                egui::FontId::proportional(10.0),
                Color32::from_gray(220),
            );
        }

        if layer.locked {
            return;
        }

        let handle = |x: f32| {
            Rect::from_min_max(
                Pos2::new(x, clip_rect.min.y),
                Pos2::new(x + HANDLE_WIDTH, clip_rect.max.y),
            )
        };
        let start_handle = handle(clip_rect.min.x);
        let end_handle = handle(clip_rect.max.x - HANDLE_WIDTH);
        painter.rect_filled(start_handle, 0.0, Color32::from_white_alpha(60));
        painter.rect_filled(end_handle, 0.0, Color32::from_white_alpha(60));

        // Handles are registered after the body so they win the hit test
        let targets = [
            (clip_rect, DragTarget::Body, egui::CursorIcon::Grab),
            (start_handle, DragTarget::StartHandle, egui::CursorIcon::ResizeHorizontal),
            (end_handle, DragTarget::EndHandle, egui::CursorIcon::ResizeHorizontal),
        ];
        for (rect, target, cursor) in targets {
            let response = ui
                .interact(
                    rect.intersect(track_rect),
                    ui.id().with(("clip", layer.id, target as u8)),
                    Sense::drag(),
                )
                .on_hover_cursor(cursor);
            let pointer_x = response.interact_pointer_pos().map(|pos| f64::from(pos.x));
            if response.drag_started() {
                if let Some(x) = pointer_x {
                    actions.push(RowAction::BeginDrag(index, target, x));
                }
            } else if response.dragged() {
                if let Some(x) = pointer_x {
                    actions.push(RowAction::DragTo(x));
                }
            }
            if response.drag_stopped() {
                actions.push(RowAction::EndDrag);
            }
        }
    }

    /// Render the playhead line across the rows
    fn render_playhead(
        &self,
        ui: &egui::Ui,
        area: Rect,
        top: f32,
        bottom: f32,
        geometry: &TrackGeometry,
        session: &TimelineSession,
    ) {
        let x = session
            .view()
            .time_to_pixel(session.current_time(), geometry, session.total_duration()) as f32;
        if x < geometry.left as f32 || x > area.max.x {
            return;
        }
        let painter = ui.painter_at(area);
        painter.line_segment(
            [Pos2::new(x, top - PROGRESS_HEIGHT - RULER_HEIGHT), Pos2::new(x, bottom)],
            Stroke::new(PLAYHEAD_WIDTH, PLAYHEAD_COLOR),
        );
    }

    /// Render the horizontal scrollbar when zoomed past the track width
    fn render_scrollbar(
        &self,
        ui: &mut egui::Ui,
        area: Rect,
        rows_bottom: f32,
        geometry: &TrackGeometry,
        session: &mut TimelineSession,
    ) {
        let max_scroll = session.view().max_scroll(geometry);
        if max_scroll <= 0.0 {
            return;
        }
        let bar_rect = Rect::from_min_size(
            Pos2::new(geometry.left as f32, (rows_bottom + 4.0).min(area.max.y - 18.0)),
            Vec2::new(geometry.width as f32, 16.0),
        );
        let mut scroll = session.view().scroll_offset();
        let slider = egui::Slider::new(&mut scroll, 0.0..=max_scroll).show_value(false);
        if ui.put(bar_rect, slider).changed() {
            session.set_scroll(scroll, geometry);
        }
    }

    /// Render the vertical scrollbar when the layers outgrow the panel
    fn render_vertical_scrollbar(&mut self, ui: &mut egui::Ui, rows_rect: Rect, max_vertical: f32) {
        if max_vertical <= 0.0 {
            return;
        }
        let bar_rect = Rect::from_min_size(
            Pos2::new(rows_rect.max.x, rows_rect.min.y),
            Vec2::new(SCROLLBAR_SIZE, rows_rect.height()),
        );
        // Reversed range puts offset zero at the top
        let slider = egui::Slider::new(&mut self.vertical_scroll, max_vertical..=0.0)
            .vertical()
            .show_value(false);
        ui.put(bar_rect, slider);
    }

    /// Wheel scrolls the rows, Ctrl+wheel zooms, Shift+wheel scrolls horizontally
    fn handle_wheel(
        &mut self,
        ui: &egui::Ui,
        area: Rect,
        geometry: &TrackGeometry,
        max_vertical: f32,
        session: &mut TimelineSession,
    ) {
        if !ui.rect_contains_pointer(area) {
            return;
        }
        let (scroll, ctrl, shift) =
            ui.input(|input| (input.smooth_scroll_delta, input.modifiers.ctrl, input.modifiers.shift));
        if ctrl && scroll.y != 0.0 {
            let zoom = session.view().zoom() * (1.0 + f64::from(scroll.y) * 0.01);
            session.set_zoom(zoom);
        } else if shift && scroll.y != 0.0 {
            session.scroll_by(-f64::from(scroll.y), geometry);
        } else {
            if scroll.x != 0.0 {
                session.scroll_by(-f64::from(scroll.x), geometry);
            }
            if scroll.y != 0.0 {
                self.vertical_scroll = (self.vertical_scroll - scroll.y).min(max_vertical).max(0.0);
            }
        }
    }
}

/// Total height of all layer rows
fn rows_height(session: &TimelineSession) -> f32 {
    session
        .store()
        .layers()
        .map(|layer| session.config().row_height(layer.expanded))
        .sum()
}

/// Largest vertical offset that still fills `viewport` with rows
fn max_vertical_scroll(content: f32, viewport: f32) -> f32 {
    (content - viewport).max(0.0)
}

/// Duration and, for video, frame size of a clip
fn clip_details(clip: &Clip) -> String {
    let duration = format_timecode(clip.duration);
    match clip.media.dimensions_label() {
        Some(size) => format!("{duration}  {size}"),
        None => duration,
    }
}

fn apply(action: RowAction, session: &mut TimelineSession, geometry: &TrackGeometry) {
    match action {
        RowAction::ToggleExpanded(index) => {
            session.toggle_expanded(index);
        }
        RowAction::ToggleLock(index) => {
            session.toggle_lock(index);
        }
        RowAction::ToggleHidden(index) => {
            session.toggle_hidden(index);
        }
        RowAction::Remove(index) => {
            session.remove_layer(index);
        }
        RowAction::Drop(index, payload) => {
            if session.drop_payload(index, &payload) {
                if let Ok(asset) = AssetRef::from_drop_payload(&payload) {
                    tracing::info!(index, asset = %asset.display_name, "Media dropped on layer");
                }
            }
        }
        RowAction::BeginDrag(index, target, pointer_x) => {
            session.begin_drag(index, target, pointer_x, geometry);
        }
        RowAction::DragTo(pointer_x) => {
            session.drag_to(pointer_x, geometry);
        }
        RowAction::EndDrag => session.end_drag(),
    }
}
