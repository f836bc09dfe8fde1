// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player panel - transport controls and the preview canvas.
//!
//! The canvas draws each active clip as a labelled box at its transform.
//! Boxes can be dragged and resized; edits are reported back to the
//! session so they persist while the clip stays active.

use egui::{Color32, Rect, Sense, Stroke, Vec2};
use visual_three_timeline::{
    format_timecode, format_timecode_precise, ActiveMedia, ActiveTransform, ClipId, Extent,
    FrameQueue, TimelineSession,
};

const CANVAS_ASPECT: f32 = 16.0 / 9.0;
const RESIZE_HANDLE: f32 = 10.0;
const MIN_MEDIA_SIZE: f32 = 100.0;

/// Largest rectangle of the given aspect ratio centered in `available`
fn fit_canvas(available: Rect, aspect: f32) -> Rect {
    let width = available.width().min(available.height() * aspect).max(0.0);
    let size = Vec2::new(width, width / aspect);
    Rect::from_center_size(available.center(), size)
}

/// Position after dragging by `delta`, kept inside the canvas
fn moved(transform: ActiveTransform, canvas: Vec2, delta: Vec2) -> (f32, f32) {
    let max_x = (canvas.x - transform.width.resolve(canvas.x)).max(0.0);
    let max_y = (canvas.y - transform.height.resolve(canvas.y)).max(0.0);
    (
        (transform.x + delta.x).min(max_x).max(0.0),
        (transform.y + delta.y).min(max_y).max(0.0),
    )
}

/// Pixel size after dragging the resize handle by `delta`
///
/// The box stays inside the canvas and no smaller than the minimum size;
/// the minimum wins on a canvas too small for both.
fn resized(transform: ActiveTransform, canvas: Vec2, delta: Vec2) -> (Extent, Extent) {
    let width = transform.width.resolve(canvas.x) + delta.x;
    let height = transform.height.resolve(canvas.y) + delta.y;
    (
        Extent::Pixels(width.min(canvas.x - transform.x).max(MIN_MEDIA_SIZE)),
        Extent::Pixels(height.min(canvas.y - transform.y).max(MIN_MEDIA_SIZE)),
    )
}

/// Player panel
pub struct PlayerPanel {
    /// Clip last clicked on the canvas
    selected: Option<ClipId>,
}

impl PlayerPanel {
    /// Create a new player panel
    pub fn new() -> Self {
        Self { selected: None }
    }

    /// Render the panel
    pub fn ui(&mut self, ui: &mut egui::Ui, session: &mut TimelineSession, frames: &FrameQueue, now_ms: f64) {
        self.render_transport(ui, session, frames, now_ms);
        ui.separator();

        let available = ui.available_rect_before_wrap();
        let canvas = fit_canvas(available, CANVAS_ASPECT);
        ui.allocate_rect(available, Sense::hover());
        self.render_canvas(ui, canvas, session);
    }

    fn render_transport(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut TimelineSession,
        frames: &FrameQueue,
        now_ms: f64,
    ) {
        ui.horizontal(|ui| {
            if ui.button("\u{23ee}").on_hover_text("Skip back").clicked() {
                session.skip_back();
            }
            let play_icon = if session.is_playing() { "\u{23f8}" } else { "\u{25b6}" };
            if ui.button(play_icon).on_hover_text("Play/Pause (Space)").clicked() {
                session.toggle_playback(now_ms, frames);
            }
            if ui.button("\u{23ed}").on_hover_text("Skip forward").clicked() {
                session.skip_forward();
            }

            ui.separator();
            ui.monospace(format!(
                "{} / {}",
                format_timecode_precise(session.current_time()),
                format_timecode(session.total_duration())
            ));

            if let Some(transform) = self.selected.and_then(|id| session.transform(id)) {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!("x {:.0}  y {:.0}", transform.x, transform.y));
                });
            }
        });
    }

    fn render_canvas(&mut self, ui: &mut egui::Ui, canvas: Rect, session: &mut TimelineSession) {
        let painter = ui.painter_at(canvas);
        painter.rect_filled(canvas, 0.0, Color32::BLACK);

        let active = session.active_media();
        if active.is_empty() {
            painter.text(
                canvas.center(),
                egui::Align2::CENTER_CENTER,
                "No active media at the playhead",
                egui::FontId::proportional(12.0),
                Color32::from_gray(90),
            );
            return;
        }

        // Drawn in layer order so later layers stack on top
        for media in &active {
            self.render_media(ui, &painter, canvas, media, session);
        }
    }

    fn render_media(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        canvas: Rect,
        media: &ActiveMedia,
        session: &mut TimelineSession,
    ) {
        let [x, y, w, h] = media.transform.resolve([canvas.width(), canvas.height()]);
        let rect = Rect::from_min_size(canvas.min + Vec2::new(x, y), Vec2::new(w, h));
        let [r, g, b] = media.clip.kind().color();
        let color = Color32::from_rgb(r, g, b);
        let selected = self.selected == Some(media.clip.id);

        painter.rect_filled(rect, 2.0, color.gamma_multiply(0.4));
        painter.rect_stroke(rect, 2.0, Stroke::new(if selected { 2.0 } else { 1.0 }, color));
        painter.text(
            rect.left_top() + Vec2::new(4.0, 4.0),
            egui::Align2::LEFT_TOP,
            &media.clip.media.display_name,
            egui::FontId::proportional(11.0),
            Color32::WHITE,
        );

        let body = ui
            .interact(rect, ui.id().with(("active_media", media.clip.id)), Sense::click_and_drag())
            .on_hover_cursor(egui::CursorIcon::Move);
        if body.clicked() || body.drag_started() {
            self.selected = Some(media.clip.id);
        }
        if body.dragged() {
            let (x, y) = moved(media.transform, canvas.size(), body.drag_delta());
            session.move_active(media.clip.id, x, y);
        }

        let handle_rect = Rect::from_min_max(
            rect.right_bottom() - Vec2::splat(RESIZE_HANDLE),
            rect.right_bottom(),
        );
        painter.rect_filled(handle_rect, 0.0, color);
        let handle = ui
            .interact(handle_rect, ui.id().with(("active_media_resize", media.clip.id)), Sense::drag())
            .on_hover_cursor(egui::CursorIcon::ResizeNwSe);
        if handle.dragged() {
            let (width, height) = resized(media.transform, canvas.size(), handle.drag_delta());
            session.resize_active(media.clip.id, width, height);
        }
    }
}

impl Default for PlayerPanel {
    fn default() -> Self {
        Self::new()
    }
}
