// ============================================================================
// StitchFE CLI — headless chart/sheet export via command-line arguments
// ============================================================================
//
// Usage examples:
//   stitchfe --input pattern.stitch --output chart.png
//   stitchfe -i pattern.stitch --sheet --page a3 --orientation landscape
//   stitchfe -i "patterns/*.stitch" --output-dir charts/
//
// No window is opened in CLI mode; every input renders synchronously on
// the current thread.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;

use crate::io;
use crate::ops::print::{self, PageOrientation, PageSize, SheetSpec};
use crate::ops::text::LabelFont;
use crate::raster::{self, ChartStyle};

/// StitchFE headless exporter.
///
/// Render .stitch pattern files to PNG charts or print sheets without
/// opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "stitchfe",
    about = "StitchFE headless chart exporter",
    long_about = "Render .stitch pattern documents to PNG without opening the GUI.\n\n\
                  Example:\n  \
                  stitchfe --input pattern.stitch --output chart.png\n  \
                  stitchfe -i \"patterns/*.stitch\" --sheet --output-dir sheets/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "patterns/*.stitch").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch export. Files keep their stem with a
    /// .png extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Pixels per cell for bare chart export.
    #[arg(long, default_value_t = 16, value_name = "PX")]
    pub cell_size: u32,

    /// Export the full print sheet (title + legend + chart) instead of
    /// the bare chart.
    #[arg(long)]
    pub sheet: bool,

    /// Page size for --sheet: a4 or a3.
    #[arg(long, default_value = "a4", value_name = "SIZE")]
    pub page: String,

    /// Page orientation for --sheet: portrait or landscape.
    #[arg(long, default_value = "portrait", value_name = "DIR")]
    pub orientation: String,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real
    /// process arguments. Used by `main()` to route before creating a
    /// window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Run all CLI processing. `0` = every file succeeded, `1` otherwise.
pub fn run(args: CliArgs) -> i32 {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return 1;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch export.",
            inputs.len()
        );
        return 1;
    }

    let page = match parse_page(&args.page) {
        Some(p) => p,
        None => {
            eprintln!("error: unknown page size '{}' (expected a4 or a3).", args.page);
            return 1;
        }
    };
    let orientation = match parse_orientation(&args.orientation) {
        Some(o) => o,
        None => {
            eprintln!(
                "error: unknown orientation '{}' (expected portrait or landscape).",
                args.orientation
            );
            return 1;
        }
    };

    // Sheet labels want a font; chart-only export does not need one.
    let font = if args.sheet { LabelFont::system() } else { None };
    if args.sheet && font.is_none() {
        eprintln!("warning: no system font found, sheet labels will be omitted.");
    }

    let mut failures = 0usize;
    for input in &inputs {
        let started = Instant::now();
        let result = export_one(input, &args, page, orientation, font.as_ref());
        match result {
            Ok(output) => {
                if args.verbose {
                    println!(
                        "{} -> {} ({} ms)",
                        input.display(),
                        output.display(),
                        started.elapsed().as_millis()
                    );
                }
            }
            Err(e) => {
                eprintln!("error: {}: {}", input.display(), e);
                failures += 1;
            }
        }
    }

    if failures == 0 {
        0
    } else {
        eprintln!("{} of {} files failed.", failures, inputs.len());
        1
    }
}

fn export_one(
    input: &Path,
    args: &CliArgs,
    page: PageSize,
    orientation: PageOrientation,
    font: Option<&LabelFont>,
) -> Result<PathBuf, String> {
    let (palette, grid) = io::load_document(input).map_err(|e| e.to_string())?;
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "pattern".to_string());

    let image = if args.sheet {
        let spec = SheetSpec::new(page, orientation);
        print::compose_sheet(&name, &palette, &grid, &spec, font)
    } else {
        raster::render_chart(&grid, &palette, args.cell_size.max(1), &ChartStyle::print())
    };

    let output = output_path_for(input, args);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    image.save(&output).map_err(|e| e.to_string())?;
    Ok(output)
}

/// Resolve glob patterns / literal paths to concrete files.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        if let Ok(paths) = glob::glob(pattern) {
            for path in paths.flatten() {
                if path.is_file() {
                    inputs.push(path);
                    matched = true;
                }
            }
        }
        // A literal path that the glob pass missed (e.g. special chars).
        if !matched {
            let literal = PathBuf::from(pattern);
            if literal.is_file() {
                inputs.push(literal);
            }
        }
    }
    inputs
}

/// Destination for one input: --output, --output-dir/<stem>.png, or a
/// sibling <stem>.png next to the input.
fn output_path_for(input: &Path, args: &CliArgs) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "pattern".to_string());
    let file = format!("{}.png", stem);
    match &args.output_dir {
        Some(dir) => dir.join(file),
        None => input.with_file_name(file),
    }
}

fn parse_page(s: &str) -> Option<PageSize> {
    match s.to_ascii_lowercase().as_str() {
        "a4" => Some(PageSize::A4),
        "a3" => Some(PageSize::A3),
        _ => None,
    }
}

fn parse_orientation(s: &str) -> Option<PageOrientation> {
    match s.to_ascii_lowercase().as_str() {
        "portrait" => Some(PageOrientation::Portrait),
        "landscape" => Some(PageOrientation::Landscape),
        _ => None,
    }
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["stitchfe", "--input", "in.stitch"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn page_and_orientation_parse_case_insensitively() {
        assert_eq!(parse_page("A4"), Some(PageSize::A4));
        assert_eq!(parse_page("a3"), Some(PageSize::A3));
        assert_eq!(parse_page("letter"), None);
        assert_eq!(parse_orientation("Landscape"), Some(PageOrientation::Landscape));
        assert_eq!(parse_orientation("sideways"), None);
    }

    #[test]
    fn output_path_prefers_explicit_output() {
        let a = args(&["--output", "out/chart.png"]);
        assert_eq!(
            output_path_for(Path::new("x/in.stitch"), &a),
            PathBuf::from("out/chart.png")
        );
    }

    #[test]
    fn output_path_falls_back_to_dir_then_sibling() {
        let a = args(&["--output-dir", "charts"]);
        assert_eq!(
            output_path_for(Path::new("x/in.stitch"), &a),
            PathBuf::from("charts/in.png")
        );

        let a = args(&[]);
        assert_eq!(
            output_path_for(Path::new("x/in.stitch"), &a),
            PathBuf::from("x/in.png")
        );
    }

    #[test]
    fn cli_export_renders_a_chart_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("demo.stitch");
        std::fs::write(
            &input,
            r##"{"gridData": [[0, null], [null, 0]], "palette": ["#ff0000"]}"##,
        )
        .unwrap();

        let output = dir.path().join("demo-chart.png");
        let a = CliArgs::parse_from([
            "stitchfe",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--cell-size",
            "4",
        ]);
        assert_eq!(run(a), 0);
        let img = image::open(&output).unwrap().to_rgba8();
        assert_eq!((img.width(), img.height()), (8, 8));
    }
}
