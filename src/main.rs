mod animation;
mod arc;
mod camera;
mod catalog;
mod config;
mod error;
mod geo;
mod help;
mod logging;
mod point_field;
mod scene;
mod settings;
mod terminal;
mod texture;

use anyhow::{anyhow, Context, Result};
use arc::{TUBE_RADIAL_SEGMENTS, TUBE_RADIUS, TUBE_SEGMENTS};
use catalog::Arc;
use clap::{Parser, Subcommand};
use config::{GlobeConfig, GlobeOverrides, PointsFormat};
use logging::LogTarget;
use point_field::PointField;
use rand::prelude::*;
use serde::Serialize;
use settings::Settings;
use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use texture::PointFieldRequest;

/// Animation time of the frame rendered by `globe --print`.
const SNAPSHOT_AT: f64 = 2.5;

#[derive(Parser)]
#[command(name = "globefield")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "Terminal globe: texture-sampled point fields and animated arcs between locations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the interactive globe
    Globe {
        /// Luminance texture (path, file:// or http(s):// URL)
        #[arg(short = 'T', long)]
        texture: Option<String>,

        /// Number of points to sample
        #[arg(short, long)]
        points: Option<usize>,

        /// Globe radius
        #[arg(short, long)]
        radius: Option<f64>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Animation speed (seconds per frame)
        #[arg(short, long, default_value = "0.03")]
        time: f32,

        /// Use the farther camera range of small screens
        #[arg(long)]
        compact: bool,

        /// Print one frame to stdout (no interactive display)
        #[arg(long)]
        print: bool,

        /// Frame width in print mode
        #[arg(long, default_value = "100")]
        width: u16,

        /// Frame height in print mode
        #[arg(long, default_value = "40")]
        height: u16,

        /// Hide location labels
        #[arg(long)]
        no_labels: bool,
    },

    /// Generate a point field and write it to stdout
    Points {
        /// Luminance texture (path, file:// or http(s):// URL)
        #[arg(short = 'T', long)]
        texture: Option<String>,

        /// Number of points to sample
        #[arg(short, long)]
        count: Option<usize>,

        /// Sphere radius
        #[arg(short, long)]
        radius: Option<f64>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: PointsFormat,

        /// Fail instead of sampling uniformly when the texture cannot be loaded
        #[arg(long)]
        strict: bool,
    },

    /// Build the arc set and write it to stdout as JSON
    Arcs {
        /// Globe radius
        #[arg(short, long)]
        radius: Option<f64>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Path segments per arc
        #[arg(long, default_value_t = arc::ARC_SEGMENTS)]
        segments: usize,

        /// Include tube mesh sizes
        #[arg(long)]
        mesh: bool,
    },

    /// List the locations arcs connect
    Catalog {
        /// Write JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct PointsOutput {
    count: usize,
    requested: usize,
    attempts: usize,
    radius: f64,
    points: Vec<[f64; 3]>,
}

#[derive(Serialize)]
struct ArcOutput<'a> {
    #[serde(flatten)]
    arc: &'a Arc,
    hex: &'static str,
    chord: f64,
    control: [f64; 3],
    path: Vec<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<MeshSize>,
}

#[derive(Serialize)]
struct MeshSize {
    vertices: usize,
    normals: usize,
    triangles: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Commands::Globe { print: false, .. });
    logging::init(if interactive { LogTarget::File } else { LogTarget::Stderr });

    let settings = Settings::load();

    match cli.command {
        Commands::Globe {
            texture,
            points,
            radius,
            seed,
            time,
            compact,
            print,
            width,
            height,
            no_labels,
        } => {
            let overrides = GlobeOverrides { texture, point_count: points, radius, seed };
            let mut config = GlobeConfig::resolve(overrides, &settings);
            config.time_step = time;
            config.labels = !no_labels;
            if compact {
                config.use_compact_zoom();
            }

            if print {
                let frame = scene::snapshot(&config, width.max(1), height.max(1), SNAPSHOT_AT);
                io::stdout().write_all(frame.as_bytes()).context("writing frame")?;
            } else {
                scene::run(&config).context("running globe")?;
            }
        }
        Commands::Points { texture, count, radius, seed, format, strict } => {
            let overrides = GlobeOverrides { texture, point_count: count, radius, seed };
            let config = GlobeConfig::resolve(overrides, &settings);
            let field = build_field(&config, strict)?;
            let mut out = io::stdout().lock();
            match format {
                PointsFormat::Json => write_points_json(&mut out, &field)?,
                PointsFormat::Csv => write_points_csv(&mut out, &field)?,
                PointsFormat::F32 => {
                    let bytes: Vec<u8> = field.to_f32_buffer().iter().flat_map(|v| v.to_le_bytes()).collect();
                    out.write_all(&bytes).context("writing points")?;
                }
            }
        }
        Commands::Arcs { radius, seed, segments, mesh } => {
            let overrides = GlobeOverrides { radius, seed, ..Default::default() };
            let config = GlobeConfig::resolve(overrides, &settings);
            let arcs = catalog::build_arcs(&config.locations, &mut StdRng::seed_from_u64(config.arc_seed()));

            let output: Vec<ArcOutput> = arcs
                .iter()
                .map(|arc| {
                    let curve = arc.curve(config.radius);
                    ArcOutput {
                        arc,
                        hex: arc.color.hex(),
                        chord: curve.chord(),
                        control: curve.control.to_array(),
                        path: curve.points(segments.max(1)).iter().map(|p| p.to_array()).collect(),
                        mesh: mesh.then(|| {
                            let tube = curve.tube(TUBE_SEGMENTS, TUBE_RADIUS, TUBE_RADIAL_SEGMENTS);
                            MeshSize {
                                vertices: tube.vertices.len(),
                                normals: tube.normals.len(),
                                triangles: tube.indices.len(),
                            }
                        }),
                    }
                })
                .collect();

            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &output).context("writing arcs")?;
            writeln!(out)?;
        }
        Commands::Catalog { json } => {
            let locations = catalog::merged_locations(&settings.locations);
            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &locations).context("writing catalog")?;
                writeln!(out)?;
            } else {
                for loc in &locations {
                    writeln!(
                        out,
                        "{}  {:<14} {:>9.4} {:>10.4}",
                        loc.region.code(),
                        loc.name,
                        loc.coordinate.latitude,
                        loc.coordinate.longitude
                    )?;
                }
            }
        }
    }

    Ok(())
}

fn build_field(config: &GlobeConfig, strict: bool) -> Result<PointField> {
    if let (true, Some(source)) = (strict, config.texture.as_deref()) {
        let map = texture::load_luminance(source).with_context(|| format!("loading texture {source}"))?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        return Ok(point_field::generate(config.point_count, config.radius, Some(&map), &mut rng));
    }

    let request = PointFieldRequest {
        texture: config.texture.clone(),
        count: config.point_count,
        radius: config.radius,
        seed: config.seed,
    };
    texture::build_point_field(&request, &AtomicBool::new(true)).ok_or_else(|| anyhow!("point field generation was cancelled"))
}

fn write_points_json(out: &mut impl Write, field: &PointField) -> Result<()> {
    let output = PointsOutput {
        count: field.len(),
        requested: field.requested(),
        attempts: field.attempts(),
        radius: field.radius(),
        points: field.points().iter().map(|p| p.to_array()).collect(),
    };
    serde_json::to_writer(&mut *out, &output).context("writing points")?;
    writeln!(out)?;
    Ok(())
}

fn write_points_csv(out: &mut impl Write, field: &PointField) -> Result<()> {
    writeln!(out, "x,y,z")?;
    for p in field.points() {
        writeln!(out, "{},{},{}", p.x, p.y, p.z)?;
    }
    Ok(())
}
