//! StitchFE — a cross-stitch / pixel pattern editor.
//!
//! The core is a pure grid+palette model ([`pattern`]) with a shared
//! rasterizer ([`raster`]); everything else is shell: egui panels and
//! dialogs, debounced settings persistence, document IO, print-sheet
//! composition, and a headless CLI exporter.

#![allow(dead_code)] // API surface kept for the CLI and future features
#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;

pub mod app;
pub mod cli;
pub mod components;
pub mod dmc;
pub mod editor;
pub mod io;
pub mod ops;
pub mod pattern;
pub mod project;
pub mod raster;
pub mod store;
