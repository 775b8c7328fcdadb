pub mod brush_panel;
pub mod dialogs;
pub mod palette_panel;
