// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media library panel - imported assets as drag sources for the timeline.

use crate::library::MediaLibrary;
use egui::{Color32, Sense};
use std::path::PathBuf;
use visual_three_timeline::{AssetId, AssetRef};

const ROW_HEIGHT: f32 = 36.0;

/// Media library panel
pub struct MediaLibraryPanel {
    /// Path typed into the import field
    import_path: String,
    /// Error of the last import attempt
    import_error: Option<String>,
}

impl MediaLibraryPanel {
    /// Create a new media library panel
    pub fn new() -> Self {
        Self {
            import_path: String::new(),
            import_error: None,
        }
    }

    /// Render the panel
    pub fn ui(&mut self, ui: &mut egui::Ui, library: &mut MediaLibrary) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.import_path)
                    .hint_text("Path to image, video or audio file")
                    .desired_width(ui.available_width() - 70.0),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Import").clicked() || submitted {
                self.import(library);
            }
        });
        if let Some(err) = &self.import_error {
            ui.colored_label(Color32::from_rgb(248, 113, 113), err);
        }
        ui.separator();

        if library.is_empty() {
            ui.weak("No media imported. Pass files on the command line or import them above.");
            return;
        }

        let mut removed: Option<AssetId> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for asset in library.assets() {
                if self.asset_row(ui, asset) {
                    removed = Some(asset.id.clone());
                }
            }
        });

        if let Some(id) = removed {
            tracing::info!(asset = %id, "Removed asset from library");
            library.remove(&id);
        }
    }

    fn import(&mut self, library: &mut MediaLibrary) {
        let path = PathBuf::from(self.import_path.trim());
        match library.import(&path) {
            Ok(_) => {
                self.import_path.clear();
                self.import_error = None;
            }
            Err(e) => {
                tracing::warn!("Import of {} failed: {e}", path.display());
                self.import_error = Some(e.to_string());
            }
        }
    }

    /// Render one asset as a drag source; returns true if its remove button was clicked
    fn asset_row(&self, ui: &mut egui::Ui, asset: &AssetRef) -> bool {
        let kind_color = {
            let [r, g, b] = asset.kind.color();
            Color32::from_rgb(r, g, b)
        };

        let mut remove = false;
        let row = ui.horizontal(|ui| {
            ui.set_min_height(ROW_HEIGHT);
            ui.colored_label(kind_color, asset.kind.name());
            ui.vertical(|ui| {
                ui.label(&asset.display_name);
                ui.weak(format!("{:.2} MB", asset.size_megabytes()));
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("\u{2716}").on_hover_text("Remove from library").clicked() {
                    remove = true;
                }
            });
        });

        let response = ui
            .interact(row.response.rect, ui.id().with(("asset", &asset.id)), Sense::drag())
            .on_hover_cursor(egui::CursorIcon::Grab);
        if response.drag_started() {
            tracing::debug!(asset = %asset.id, "Dragging asset");
            response.dnd_set_drag_payload(asset.to_drop_payload());
        }
        if response.dragged() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }

        ui.separator();
        remove
    }
}

impl Default for MediaLibraryPanel {
    fn default() -> Self {
        Self::new()
    }
}
