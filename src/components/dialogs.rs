// ============================================================================
// DIALOGS — size (resize / crop) and print
// ============================================================================

use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};

use crate::io::FileHandler;
use crate::ops::print::{self, PageOrientation, PageSize, SheetSpec};
use crate::ops::text::LabelFont;
use crate::pattern::PatternGrid;

// ============================================================================
// SIZE DIALOG
// ============================================================================

/// Resize/crop dialog. Both operations build a new grid; invalid input
/// leaves the current grid untouched.
pub struct SizeDialog {
    pub open: bool,
    width_str: String,
    height_str: String,
}

impl Default for SizeDialog {
    fn default() -> Self {
        Self {
            open: false,
            width_str: String::new(),
            height_str: String::new(),
        }
    }
}

impl SizeDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog seeded with the current dimensions.
    pub fn open_for(&mut self, grid: &PatternGrid) {
        self.width_str = grid.cols().to_string();
        self.height_str = grid.rows().to_string();
        self.open = true;
    }

    /// Returns the replacement grid when the user resized or cropped.
    pub fn show(&mut self, ctx: &egui::Context, grid: &PatternGrid) -> Option<PatternGrid> {
        if !self.open {
            return None;
        }
        let mut result = None;
        let mut open = self.open;

        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)) {
            open = false;
        }

        egui::Window::new("Size")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Width");
                    ui.add(egui::TextEdit::singleline(&mut self.width_str).desired_width(48.0));
                    ui.label("Height");
                    ui.add(egui::TextEdit::singleline(&mut self.height_str).desired_width(48.0));
                    if ui.button("Resize").clicked() {
                        result = self.try_resize(grid);
                    }
                });
                ui.add_space(4.0);
                if ui
                    .button("Crop")
                    .on_hover_text("Cut down to the painted area")
                    .clicked()
                {
                    result = grid.cropped();
                    if result.is_none() {
                        crate::log_warn!("Crop ignored: nothing painted or degenerate area");
                    }
                }
            });

        if let Some(new_grid) = &result {
            self.width_str = new_grid.cols().to_string();
            self.height_str = new_grid.rows().to_string();
        }
        self.open = open;
        result
    }

    /// Parse and validate the requested dimensions; anything non-numeric
    /// or below 1 is ignored.
    fn try_resize(&self, grid: &PatternGrid) -> Option<PatternGrid> {
        let width: usize = match self.width_str.trim().parse() {
            Ok(w) => w,
            Err(_) => {
                crate::log_warn!("Resize ignored: bad width '{}'", self.width_str);
                return None;
            }
        };
        let height: usize = match self.height_str.trim().parse() {
            Ok(h) => h,
            Err(_) => {
                crate::log_warn!("Resize ignored: bad height '{}'", self.height_str);
                return None;
            }
        };
        let resized = grid.resized(height, width);
        if resized.is_none() {
            crate::log_warn!("Resize ignored: zero dimension {}x{}", width, height);
        }
        resized
    }
}

// ============================================================================
// PRINT DIALOG
// ============================================================================

enum SheetJob {
    Print,
    Export(std::path::PathBuf),
}

/// Print dialog with a live preview. Sheet generation is deferred one
/// frame so the "Generating…" state paints before the synchronous
/// compose runs; the buttons stay disabled meanwhile.
pub struct PrintDialog {
    pub open: bool,
    page: PageSize,
    orientation: PageOrientation,
    generating: bool,
    pending: Option<SheetJob>,
    preview: Option<TextureHandle>,
    preview_stale: bool,
    status: Option<String>,
}

impl Default for PrintDialog {
    fn default() -> Self {
        Self {
            open: false,
            page: PageSize::A4,
            orientation: PageOrientation::Portrait,
            generating: false,
            pending: None,
            preview: None,
            preview_stale: true,
            status: None,
        }
    }
}

impl PrintDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
        self.preview_stale = true;
        self.status = None;
    }

    /// The document changed; the preview must be recomposed.
    pub fn mark_stale(&mut self) {
        self.preview_stale = true;
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        name: &str,
        palette: &[String],
        grid: &PatternGrid,
        font: Option<&LabelFont>,
        files: &mut FileHandler,
    ) {
        if !self.open {
            // Closing the dialog abandons any queued job.
            self.pending = None;
            self.generating = false;
            return;
        }

        // A job queued last frame runs now, after "Generating…" had a
        // frame to show.
        if let Some(job) = self.pending.take() {
            let spec = SheetSpec::new(self.page, self.orientation);
            let sheet = print::compose_sheet(name, palette, grid, &spec, font);
            let result = match &job {
                SheetJob::Print => print::print_sheet(&sheet),
                SheetJob::Export(path) => print::export_sheet(&sheet, path),
            };
            self.status = Some(match result {
                Ok(()) => match job {
                    SheetJob::Print => "Sheet sent to the system viewer.".to_string(),
                    SheetJob::Export(path) => format!("Saved {}", path.display()),
                },
                Err(e) => {
                    crate::log_err!("Print sheet failed: {}", e);
                    e
                }
            });
            self.generating = false;
        }

        if self.preview_stale {
            let spec = SheetSpec::new(self.page, self.orientation).with_dpi(40);
            let sheet = print::compose_sheet(name, palette, grid, &spec, font);
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [sheet.width() as usize, sheet.height() as usize],
                sheet.as_raw(),
            );
            self.preview = Some(ctx.load_texture("print_preview", image, TextureOptions::default()));
            self.preview_stale = false;
        }

        let mut open = self.open;
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)) {
            open = false;
        }

        egui::Window::new("Print…")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal_top(|ui| {
                    // ---- preview ----
                    let box_size = Vec2::new(300.0, 330.0);
                    let (rect, _) = ui.allocate_exact_size(box_size, Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, Color32::from_gray(90));
                    if let Some(preview) = &self.preview {
                        let tex_size = preview.size_vec2();
                        let scale =
                            (box_size.x / tex_size.x).min(box_size.y / tex_size.y).min(1.0);
                        let size = tex_size * scale;
                        let page_rect = Rect::from_center_size(rect.center(), size);
                        ui.painter().rect_filled(page_rect, 0.0, Color32::WHITE);
                        ui.painter().image(
                            preview.id(),
                            page_rect,
                            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                            Color32::WHITE,
                        );
                    }

                    // ---- options ----
                    ui.vertical(|ui| {
                        ui.set_min_width(170.0);
                        egui::ComboBox::from_label("Page")
                            .selected_text(self.page.label())
                            .show_ui(ui, |ui| {
                                for &page in PageSize::all() {
                                    if ui
                                        .selectable_value(&mut self.page, page, page.label())
                                        .changed()
                                    {
                                        self.preview_stale = true;
                                    }
                                }
                            });
                        egui::ComboBox::from_label("Orientation")
                            .selected_text(self.orientation.label())
                            .show_ui(ui, |ui| {
                                for &orientation in PageOrientation::all() {
                                    if ui
                                        .selectable_value(
                                            &mut self.orientation,
                                            orientation,
                                            orientation.label(),
                                        )
                                        .changed()
                                    {
                                        self.preview_stale = true;
                                    }
                                }
                            });

                        ui.add_space(8.0);
                        ui.add_enabled_ui(!self.generating, |ui| {
                            if ui.button("Print").clicked() {
                                self.generating = true;
                                self.pending = Some(SheetJob::Print);
                                ctx.request_repaint();
                            }
                            if ui.button("Export sheet…").clicked() {
                                if let Some(path) = files.pick_png_path(&format!("{}-sheet", name)) {
                                    self.generating = true;
                                    self.pending = Some(SheetJob::Export(path));
                                    ctx.request_repaint();
                                }
                            }
                        });

                        if self.generating {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label("Generating…");
                            });
                        } else if let Some(status) = &self.status {
                            ui.weak(status);
                        }
                    });
                });
            });

        self.open = open;
    }
}
