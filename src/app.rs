// ============================================================================
// APPLICATION SHELL — menu bar, panels, persistence wiring
// ============================================================================

use std::time::Duration;

use eframe::egui;

use crate::components::brush_panel::BrushPanel;
use crate::components::dialogs::{PrintDialog, SizeDialog};
use crate::components::palette_panel::PalettePanel;
use crate::editor::{EditorView, BASE_CELL_PX, ZOOM_MAX, ZOOM_MIN};
use crate::io::{self, FileHandler};
use crate::ops::clipboard;
use crate::ops::text::LabelFont;
use crate::pattern::{Brush, Cell, FillType, PatternGrid, BRUSH_SIZE_MAX, BRUSH_SIZE_MIN};
use crate::project::Document;
use crate::raster::{self, ChartStyle};
use crate::store::{keys, SettingsStore};

pub struct StitchApp {
    doc: Document,
    brush: Brush,
    /// Active palette index; `None` while the eraser is selected.
    selected_color: Option<usize>,
    zoom: f32,

    editor: EditorView,
    palette_panel: PalettePanel,
    brush_panel: BrushPanel,
    size_dialog: SizeDialog,
    print_dialog: PrintDialog,

    files: FileHandler,
    store: SettingsStore,
    /// Loaded once; `None` on systems without a usable font (the print
    /// sheet then renders without labels).
    label_font: Option<LabelFont>,

    /// One-line status/diagnostic shown in the bottom bar.
    status: Option<String>,
    last_title: String,
}

impl StitchApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let store = SettingsStore::open_default();

        // Restore each persisted key independently, falling back to the
        // built-in default wherever a value is missing or corrupt.
        let mut doc = Document::new_untitled();
        if let Some(palette) = store.get::<Vec<String>>(keys::PALETTE) {
            if !palette.is_empty() {
                doc.palette = palette;
            }
        }
        if let Some(rows) = store.get::<Vec<Vec<Cell>>>(keys::GRID) {
            match PatternGrid::from_rows(rows) {
                Ok(grid) => doc.grid = grid,
                Err(e) => crate::log_warn!("Ignoring saved grid: {}", e),
            }
        }

        let brush = Brush {
            size: store
                .get::<f32>(keys::BRUSH_SIZE)
                .unwrap_or(1.0)
                .clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX),
            fill: store.get::<FillType>(keys::FILL_TYPE).unwrap_or(FillType::Full),
        };
        let selected_color = store
            .get::<Option<usize>>(keys::SELECTED_COLOR)
            .unwrap_or(Some(0))
            .filter(|&i| i < doc.palette.len());
        let zoom = store
            .get::<f32>(keys::ZOOM)
            .unwrap_or(1.0)
            .clamp(ZOOM_MIN, ZOOM_MAX);

        let label_font = LabelFont::system();
        if label_font.is_none() {
            crate::log_warn!("No system font found; print sheets will have no labels");
        }

        crate::log_info!(
            "Started with a {}x{} grid, {} palette colors",
            doc.grid.rows(),
            doc.grid.cols(),
            doc.palette.len()
        );

        Self {
            doc,
            brush,
            selected_color,
            zoom,
            editor: EditorView::new(),
            palette_panel: PalettePanel::new(),
            brush_panel: BrushPanel::new(),
            size_dialog: SizeDialog::new(),
            print_dialog: PrintDialog::new(),
            files: FileHandler::new(),
            store,
            label_font,
            status: None,
            last_title: String::new(),
        }
    }

    // ---- persistence helpers ------------------------------------------------

    fn persist_grid(&mut self) {
        self.store.set(keys::GRID, &self.doc.grid.to_rows());
    }

    fn persist_palette(&mut self) {
        self.store.set(keys::PALETTE, &self.doc.palette);
    }

    fn persist_brush(&mut self) {
        self.store.set(keys::BRUSH_SIZE, &self.brush.size);
        self.store.set(keys::FILL_TYPE, &self.brush.fill);
    }

    fn persist_selected(&mut self) {
        self.store.set(keys::SELECTED_COLOR, &self.selected_color);
    }

    fn persist_zoom(&mut self) {
        self.store.set(keys::ZOOM, &self.zoom);
    }

    /// The grid (or palette) changed: refresh views and stage the write.
    fn document_changed(&mut self) {
        self.doc.mark_dirty();
        self.editor.mark_dirty();
        self.print_dialog.mark_stale();
        self.persist_grid();
    }

    // ---- file operations ----------------------------------------------------

    fn new_document(&mut self) {
        self.doc = Document::new_untitled();
        self.files.current_path = None;
        self.selected_color = Some(0);
        self.editor.reset_view();
        self.print_dialog.mark_stale();
        self.persist_grid();
        self.persist_palette();
        self.persist_selected();
        self.status = None;
    }

    fn open_document(&mut self) {
        let Some(path) = self.files.pick_open_path() else {
            return;
        };
        match io::load_document(&path) {
            Ok((palette, grid)) => {
                self.doc = Document::from_file(path.clone(), palette, grid);
                self.files.current_path = Some(path);
                self.selected_color = Some(0).filter(|_| !self.doc.palette.is_empty());
                self.editor.reset_view();
                self.print_dialog.mark_stale();
                self.persist_grid();
                self.persist_palette();
                self.persist_selected();
                self.status = Some(format!("Opened {}", self.doc.name));
            }
            Err(e) => {
                // Malformed documents never replace the open one.
                crate::log_err!("Failed to open {}: {}", path.display(), e);
                self.status = Some(format!("Could not open file: {}", e));
            }
        }
    }

    fn save_document(&mut self, force_dialog: bool) {
        let known = self.doc.path.clone().filter(|_| !force_dialog);
        let path = match known.or_else(|| self.files.pick_save_path(&self.doc.name)) {
            Some(p) => p,
            None => return,
        };

        match io::save_document(&path, &self.doc.palette, &self.doc.grid) {
            Ok(()) => {
                self.doc.path = Some(path.clone());
                self.files.current_path = Some(path);
                self.doc.update_name_from_path();
                self.doc.mark_clean();
                self.status = Some(format!("Saved {}", self.doc.name));
            }
            Err(e) => {
                crate::log_err!("Save failed: {}", e);
                self.status = Some(format!("Save failed: {}", e));
            }
        }
    }

    /// Rasterize the chart at export resolution (opaque background).
    fn export_raster(&self) -> image::RgbaImage {
        raster::render_chart(
            &self.doc.grid,
            &self.doc.palette,
            BASE_CELL_PX * 2,
            &ChartStyle::print(),
        )
    }

    fn export_chart_png(&mut self) {
        let Some(path) = self.files.pick_png_path(&self.doc.name) else {
            return;
        };
        let chart = self.export_raster();
        self.status = Some(match chart.save(&path) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(e) => {
                crate::log_err!("Chart export failed: {}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    fn copy_chart_image(&mut self) {
        let chart = self.export_raster();
        self.status = Some(match clipboard::copy_image(&chart) {
            Ok(()) => "Chart image copied.".to_string(),
            Err(e) => {
                crate::log_warn!("{}", e);
                e
            }
        });
    }

    /// Wipe all persisted state and return to the built-in defaults.
    fn reset_to_defaults(&mut self) {
        self.store.clear_all();
        self.doc = Document::new_untitled();
        self.files.current_path = None;
        self.brush = Brush::default();
        self.selected_color = Some(0);
        self.zoom = 1.0;
        self.editor.reset_view();
        self.print_dialog.mark_stale();
        self.status = Some("Saved state cleared.".to_string());
        crate::log_info!("Reset to defaults");
    }

    // ---- UI sections --------------------------------------------------------

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New").clicked() {
                    self.new_document();
                    ui.close_menu();
                }
                if ui.button("Open…").clicked() {
                    self.open_document();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Save").clicked() {
                    self.save_document(false);
                    ui.close_menu();
                }
                if ui.button("Save As…").clicked() {
                    self.save_document(true);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Export chart as PNG…").clicked() {
                    self.export_chart_png();
                    ui.close_menu();
                }
                if ui.button("Copy chart image").clicked() {
                    self.copy_chart_image();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Print…").clicked() {
                    self.print_dialog.open();
                    ui.close_menu();
                }
            });
            ui.menu_button("Edit", |ui| {
                if ui.button("Size…").clicked() {
                    self.size_dialog.open_for(&self.doc.grid);
                    ui.close_menu();
                }
            });
            ui.menu_button("View", |ui| {
                if ui.button("Reset view").clicked() {
                    self.editor.reset_view();
                    ui.close_menu();
                }
            });
            ui.menu_button("Options", |ui| {
                if ui.button("Clear saved state").clicked() {
                    self.reset_to_defaults();
                    ui.close_menu();
                }
            });
        });

        // Plain keyboard shortcuts for the frequent file operations.
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::CTRL, egui::Key::S)) {
            self.save_document(false);
        }
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::CTRL, egui::Key::O)) {
            self.open_document();
        }
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::CTRL, egui::Key::N)) {
            self.new_document();
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        let palette_response =
            self.palette_panel
                .show(ui, &mut self.doc.palette, &mut self.selected_color);
        if palette_response.palette_changed {
            self.editor.mark_dirty();
            self.print_dialog.mark_stale();
            self.doc.mark_dirty();
            self.persist_palette();
        }
        if palette_response.selection_changed {
            self.persist_selected();
        }

        ui.separator();
        if self.brush_panel.show(ui, &mut self.brush) {
            self.persist_brush();
        }

        ui.separator();
        let zoom = ui.add(
            egui::Slider::new(&mut self.zoom, ZOOM_MIN..=ZOOM_MAX)
                .step_by(0.1)
                .text("Zoom"),
        );
        if zoom.changed() {
            self.persist_zoom();
        }
    }

    fn status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!(
                "{} × {}",
                self.doc.grid.cols(),
                self.doc.grid.rows()
            ));
            ui.separator();
            match self.selected_color {
                Some(i) => {
                    let hex = self
                        .doc
                        .palette
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| "?".to_string());
                    ui.label(format!("Color {} ({})", i, hex));
                }
                None => {
                    ui.label("Eraser");
                }
            }
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status.clone());
            }
        });
    }

    fn sync_window_title(&mut self, ctx: &egui::Context) {
        let title = format!("{} - StitchFE", self.doc.display_title());
        if title != self.last_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.last_title = title;
        }
    }
}

impl eframe::App for StitchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_window_title(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::SidePanel::left("tool_panel")
            .resizable(false)
            .default_width(210.0)
            .show(ctx, |ui| {
                self.side_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let response = self.editor.show(
                ui,
                &mut self.doc.grid,
                &self.doc.palette,
                &self.brush,
                self.selected_color,
                &mut self.zoom,
            );
            if response.painted {
                self.document_changed();
            }
            if response.zoom_changed {
                self.persist_zoom();
            }
        });

        // ---- modals ----
        if let Some(new_grid) = self.size_dialog.show(ctx, &self.doc.grid) {
            self.doc.grid = new_grid;
            self.editor.reset_view();
            self.document_changed();
        }
        if self
            .palette_panel
            .show_editor(ctx, &mut self.doc.palette)
        {
            self.editor.mark_dirty();
            self.print_dialog.mark_stale();
            self.doc.mark_dirty();
            self.persist_palette();
        }
        self.print_dialog.show(
            ctx,
            &self.doc.name,
            &self.doc.palette,
            &self.doc.grid,
            self.label_font.as_ref(),
            &mut self.files,
        );

        // Debounced settings writes need frames to land on; keep ticking
        // while anything is staged even if the user goes idle.
        self.store.tick();
        if self.store.has_pending() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.store.flush_all();
        crate::log_info!("Session ended");
    }
}
