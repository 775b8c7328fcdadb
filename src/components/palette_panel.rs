// ============================================================================
// PALETTE PANEL — swatch strip, eraser, add-color picker, palette editor
// ============================================================================

use eframe::egui;
use egui::{Color32, Sense, Stroke, Vec2};

use crate::dmc;

const SWATCH_SIZE: f32 = 22.0;

/// What the panel changed this frame.
#[derive(Default)]
pub struct PaletteResponse {
    /// Palette entries were added or edited; charts must re-render.
    pub palette_changed: bool,
    /// Selected color (or eraser) changed.
    pub selection_changed: bool,
}

pub struct PalettePanel {
    /// Color staged in the add-color picker.
    new_color: [u8; 3],
    /// Palette editor modal state.
    editor_open: bool,
    editing_index: usize,
}

impl Default for PalettePanel {
    fn default() -> Self {
        Self {
            new_color: [255, 255, 255],
            editor_open: false,
            editing_index: 0,
        }
    }
}

impl PalettePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swatch color for display; unparsable entries show as gray.
    fn swatch_color(hex: &str) -> Color32 {
        dmc::parse_hex(hex)
            .map(|[r, g, b]| Color32::from_rgb(r, g, b))
            .unwrap_or(Color32::GRAY)
    }

    fn draw_swatch(ui: &mut egui::Ui, color: Color32, selected: bool) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::click());
        let painter = ui.painter();
        painter.rect_filled(rect, 3.0, color);
        if selected {
            painter.rect_stroke(rect, 3.0, Stroke::new(2.0, ui.visuals().selection.bg_fill));
        } else {
            painter.rect_stroke(rect, 3.0, Stroke::new(1.0, Color32::from_gray(110)));
        }
        response
    }

    /// Side-panel body. `selected` is the active palette index, `None`
    /// while the eraser is active.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        palette: &mut Vec<String>,
        selected: &mut Option<usize>,
    ) -> PaletteResponse {
        let mut out = PaletteResponse::default();

        ui.heading("Palette");
        ui.add_space(4.0);

        ui.horizontal_wrapped(|ui| {
            for (index, hex) in palette.iter().enumerate() {
                let response =
                    Self::draw_swatch(ui, Self::swatch_color(hex), *selected == Some(index))
                        .on_hover_text(hex.clone());
                if response.clicked() && *selected != Some(index) {
                    *selected = Some(index);
                    out.selection_changed = true;
                }
            }
        });

        ui.add_space(4.0);
        let eraser = ui.selectable_label(selected.is_none(), "⌫ Eraser");
        if eraser.clicked() && selected.is_some() {
            *selected = None;
            out.selection_changed = true;
        }

        ui.separator();
        ui.label("Add color");
        ui.horizontal(|ui| {
            ui.color_edit_button_srgb(&mut self.new_color);
            if ui.button("Add").clicked() {
                let hex = dmc::to_hex(self.new_color);
                // Skip exact duplicates, matching the original picker.
                if !palette.contains(&hex) {
                    palette.push(hex);
                    *selected = Some(palette.len() - 1);
                    out.palette_changed = true;
                    out.selection_changed = true;
                }
            }
        });
        if let Some(m) = dmc::closest_dmc(&dmc::to_hex(self.new_color)) {
            ui.weak(format!("Closest DMC: {} {}", m.color.id, m.color.name));
        }

        ui.add_space(4.0);
        if ui.button("Edit palette…").clicked() {
            self.editing_index = selected.unwrap_or(0).min(palette.len().saturating_sub(1));
            self.editor_open = true;
        }

        out
    }

    /// Palette editor modal: pick an entry, recolor it in place. Returns
    /// true when an entry changed.
    pub fn show_editor(&mut self, ctx: &egui::Context, palette: &mut [String]) -> bool {
        if !self.editor_open || palette.is_empty() {
            self.editor_open &= !palette.is_empty();
            return false;
        }
        let mut changed = false;
        let mut open = self.editor_open;

        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)) {
            open = false;
        }

        egui::Window::new("Edit Palette")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for (index, hex) in palette.iter().enumerate() {
                        let response = Self::draw_swatch(
                            ui,
                            Self::swatch_color(hex),
                            index == self.editing_index,
                        );
                        if response.clicked() {
                            self.editing_index = index;
                        }
                    }
                });
                ui.separator();

                self.editing_index = self.editing_index.min(palette.len() - 1);
                let mut rgb = dmc::parse_hex(&palette[self.editing_index]).unwrap_or([255, 255, 255]);
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    palette[self.editing_index] = dmc::to_hex(rgb);
                    changed = true;
                }
                if let Some(m) = dmc::closest_dmc(&palette[self.editing_index]) {
                    ui.weak(format!("Closest DMC: {} {}", m.color.id, m.color.name));
                }
            });

        self.editor_open = open;
        changed
    }
}
