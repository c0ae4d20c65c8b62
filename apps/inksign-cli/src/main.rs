//! inksign command-line tool
//!
//! Inspect page geometry, rasterize strokes into a signature image, and
//! stamp signatures onto PDF pages.

mod plan;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use inksign_core::{
    parse_size, InkCanvas, PixelPoint, PixelSize, SignatureImage, SignerConfig, SigningSession,
    SourceDocument,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::plan::{parse_strokes, PlaceArg, SignPlan};

#[derive(Parser, Debug)]
#[command(name = "inksign")]
#[command(version, about = "Place handwritten signatures on PDF pages")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show page count and page sizes
    Info {
        pdf: PathBuf,

        /// Pixels per point used for the pixel sizes
        #[arg(long)]
        scale: Option<f64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rasterize strokes into a transparent PNG signature
    Draw {
        /// JSON stroke list: [[[x, y], ...], ...] in canvas pixels
        #[arg(long)]
        strokes: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Ink color as #RRGGBB
        #[arg(long)]
        color: Option<String>,

        /// Stroke width in canvas pixels
        #[arg(long)]
        width: Option<f32>,
    },

    /// Stamp signatures onto a PDF
    Sign {
        pdf: PathBuf,

        /// Signature PNG used with --place
        #[arg(long, requires = "place", conflicts_with = "plan")]
        signature: Option<PathBuf>,

        /// Placement as PAGE:X:Y in page pixels (repeatable)
        #[arg(long, requires = "signature")]
        place: Vec<PlaceArg>,

        /// JSON placement plan
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Pixels per point the coordinates were measured at
        #[arg(long)]
        scale: Option<f64>,

        /// Signature size in page pixels, e.g. 150x50
        #[arg(long)]
        size: Option<String>,

        /// Output path (defaults to the configured export file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => SignerConfig::from_file(path)?,
        None => SignerConfig::default(),
    };

    match cli.command {
        Command::Info { pdf, scale, json } => run_info(config, &pdf, scale, json),
        Command::Draw {
            strokes,
            output,
            color,
            width,
        } => run_draw(config, &strokes, &output, color, width),
        Command::Sign {
            pdf,
            signature,
            place,
            plan,
            scale,
            size,
            output,
        } => {
            let plan = match (plan, signature) {
                (Some(path), _) => SignPlan::from_file(&path)?,
                (None, Some(image)) => SignPlan::from_places(&place, &image),
                (None, None) => bail!("Either --plan or --signature with --place is required"),
            };
            run_sign(config, &pdf, plan, scale, size.as_deref(), output)
        }
    }
}

#[derive(Debug, Serialize)]
struct PageReport {
    page: u32,
    width: f64,
    height: f64,
    rotation: i32,
    pixel_width: f64,
    pixel_height: f64,
}

fn run_info(
    mut config: SignerConfig,
    path: &Path,
    scale: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(scale) = scale {
        config.viewport.scale = scale;
    }
    config.validate()?;

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let document = SourceDocument::load(bytes)?;
    let layout = document.layout(config.viewport.scale);

    let reports: Vec<PageReport> = document
        .pages()
        .iter()
        .filter_map(|page| {
            let viewport = layout.viewport(page.page_num)?;
            Some(PageReport {
                page: page.page_num,
                width: page.media_box.width,
                height: page.media_box.height,
                rotation: page.rotation,
                pixel_width: viewport.pixel_width(),
                pixel_height: viewport.pixel_height(),
            })
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("{}: {} page(s)", path.display(), document.page_count());
        for report in &reports {
            println!(
                "  page {:>3}  {:>7.1} x {:<7.1} pt  {:>7.1} x {:<7.1} px  rotate {}",
                report.page,
                report.width,
                report.height,
                report.pixel_width,
                report.pixel_height,
                report.rotation
            );
        }
    }
    Ok(())
}

fn run_draw(
    mut config: SignerConfig,
    strokes_path: &Path,
    output: &Path,
    color: Option<String>,
    width: Option<f32>,
) -> anyhow::Result<()> {
    if let Some(color) = color {
        config.ink.color = color;
    }
    if let Some(width) = width {
        config.ink.width = width;
    }
    config.validate()?;

    let json = fs::read_to_string(strokes_path)
        .with_context(|| format!("Failed to read {}", strokes_path.display()))?;
    let strokes = parse_strokes(&json)?;

    let mut canvas = InkCanvas::new(
        config.ink.canvas_width,
        config.ink.canvas_height,
        config.ink.pixel_ratio,
        config.ink_style(),
    );
    for stroke in &strokes {
        let Some(([x, y], rest)) = stroke.split_first() else {
            continue;
        };
        canvas.pointer_down(*x, *y);
        for [x, y] in rest {
            canvas.pointer_move(*x, *y);
        }
        canvas.pointer_up();
    }

    let image = canvas.render_png()?;
    fs::write(output, image.bytes())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        strokes = strokes.len(),
        segments = canvas.segment_count(),
        "Signature written"
    );
    println!("{}", output.display());
    Ok(())
}

fn run_sign(
    mut config: SignerConfig,
    pdf: &Path,
    plan: SignPlan,
    scale: Option<f64>,
    size: Option<&str>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(scale) = scale.or(plan.scale) {
        config.viewport.scale = scale;
    }
    if let Some(size) = size {
        let size = parse_size(size)?;
        config.placement.width = size.width;
        config.placement.height = size.height;
    }
    config.validate()?;

    let output = output.unwrap_or_else(|| PathBuf::from(&config.export.file_name));
    let default_size = config.placement_size();

    let bytes = fs::read(pdf).with_context(|| format!("Failed to read {}", pdf.display()))?;
    let name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    let mut session = SigningSession::new(config);
    session.load_document(&name, bytes)?;

    // one buffer per file so repeated images are embedded once
    let mut images: HashMap<PathBuf, SignatureImage> = HashMap::new();
    for entry in &plan.placements {
        let image = match images.get(&entry.image) {
            Some(image) => image.clone(),
            None => {
                let image = load_signature(&entry.image)?;
                images.insert(entry.image.clone(), image.clone());
                image
            }
        };

        if !session.go_to_page(entry.page) {
            bail!(
                "Page {} out of range (document has {} pages)",
                entry.page,
                session.page_count()
            );
        }
        session.confirm_signature_image(image);

        let size = PixelSize::new(
            entry.width.unwrap_or(default_size.width),
            entry.height.unwrap_or(default_size.height),
        );
        session.place_pending_sized(PixelPoint::new(entry.x, entry.y), size)?;
    }

    if !session.can_export() {
        bail!("Nothing to sign");
    }

    let signed = session.export()?;
    fs::write(&output, &signed)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{}: {} signature(s) -> {}",
        name,
        session.placements().len(),
        output.display()
    );
    Ok(())
}

fn load_signature(path: &Path) -> anyhow::Result<SignatureImage> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let image = SignatureImage::from_bytes(bytes);
    if !image.is_png() {
        bail!("{} is not a PNG image", path.display());
    }
    Ok(image)
}
