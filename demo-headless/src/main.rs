use anyhow::{Context, Result};
use burn_severity_core::export::{write_rasters, write_tables};
use burn_severity_core::imagery::write_manifest;
use burn_severity_core::{
    AnalysisConfig, BurnSeverityPipeline, FirePerimeter, ManifestCatalog, SceneCatalog,
    SeverityAnalysis, SeverityClass, SyntheticFire,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Burn severity mapping from Sentinel-2 dNBR
#[derive(Parser, Debug)]
#[command(name = "burn-severity", version)]
#[command(
    about = "Map wildfire burn severity with the differenced Normalized Burn Ratio",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse scenes listed in a manifest against a fire perimeter
    Run(RunArgs),
    /// Analyse a generated synthetic fire
    Demo(DemoArgs),
}

/// Overrides applied on top of the configuration file
#[derive(Args, Debug)]
struct AnalysisArgs {
    /// JSON analysis configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fire date (YYYY-MM-DD)
    #[arg(long)]
    fire_date: Option<NaiveDate>,

    /// Maximum provider cloudy pixel percentage per scene
    #[arg(long)]
    max_cloud: Option<f32>,

    /// Output directory
    #[arg(short, long, default_value = "burn_severity_output")]
    out: PathBuf,

    /// Also write NBR, dNBR and severity rasters
    #[arg(long)]
    export_rasters: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Scene manifest JSON
    #[arg(short, long)]
    manifest: PathBuf,

    /// Fire perimeter GeoJSON
    #[arg(short, long)]
    perimeter: PathBuf,

    #[command(flatten)]
    analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Grid size in pixels (square)
    #[arg(long, default_value_t = 128)]
    size: usize,

    /// Also write the synthetic scenes and perimeter so `run` can read them
    #[arg(long)]
    write_scenes: Option<PathBuf>,

    #[command(flatten)]
    analysis: AnalysisArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => {
            let config = load_config(&args.analysis)?;
            let catalog = ManifestCatalog::open(&args.manifest)
                .with_context(|| format!("opening manifest {}", args.manifest.display()))?;
            let perimeter = FirePerimeter::from_geojson_file(&args.perimeter)
                .with_context(|| format!("reading perimeter {}", args.perimeter.display()))?;
            analyse(config, &catalog, &perimeter, &args.analysis)
        }
        Command::Demo(args) => {
            let config = load_config(&args.analysis)?;
            let fire = SyntheticFire {
                seed: args.seed,
                size: args.size,
                ..SyntheticFire::default()
            };
            let scenario = fire.generate(&config).context("generating synthetic fire")?;
            info!(
                scenes = scenario.catalog.len(),
                size = args.size,
                seed = args.seed,
                "generated synthetic fire"
            );
            if let Some(dir) = &args.write_scenes {
                write_scenario(dir, &scenario.catalog, &scenario.perimeter)?;
            }
            analyse(config, &scenario.catalog, &scenario.perimeter, &args.analysis)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &AnalysisArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(date) = args.fire_date {
        config.fire_date = date;
    }
    if let Some(max) = args.max_cloud {
        config.max_cloudy_pixel_percentage = max;
    }
    config.validate().context("invalid analysis configuration")?;
    Ok(config)
}

fn analyse(
    config: AnalysisConfig,
    catalog: &dyn SceneCatalog,
    perimeter: &FirePerimeter,
    args: &AnalysisArgs,
) -> Result<()> {
    let pipeline = BurnSeverityPipeline::new(config)?;
    let analysis = pipeline
        .run(catalog, perimeter)
        .context("burn severity analysis failed")?;

    write_tables(&args.out, &analysis.report)
        .with_context(|| format!("writing tables to {}", args.out.display()))?;
    if args.export_rasters {
        write_rasters(&args.out, &analysis.products)
            .with_context(|| format!("writing rasters to {}", args.out.display()))?;
    }

    print_summary(&analysis);
    println!("\nOutputs written to {}", args.out.display());
    Ok(())
}

fn write_scenario(
    dir: &Path,
    catalog: &burn_severity_core::InMemoryCatalog,
    perimeter: &FirePerimeter,
) -> Result<()> {
    let scenes = catalog
        .list()?
        .iter()
        .map(|meta| catalog.load(&meta.id))
        .collect::<burn_severity_core::Result<Vec<_>>>()?;
    let manifest = write_manifest(dir, &scenes)
        .with_context(|| format!("writing scenes to {}", dir.display()))?;
    let perimeter_path = dir.join("perimeter.geojson");
    std::fs::write(&perimeter_path, perimeter.to_geojson_string())
        .with_context(|| format!("writing {}", perimeter_path.display()))?;
    println!(
        "Synthetic scenes written: {} and {}",
        manifest.display(),
        perimeter_path.display()
    );
    Ok(())
}

fn print_summary(analysis: &SeverityAnalysis) {
    let report = &analysis.report;
    println!("\n=== Burn Severity (dNBR) ===\n");
    println!("Fire date: {}", report.config.fire_date);
    println!(
        "Pre-fire  {}: {} scene(s), {} valid pixels",
        report.pre_fire.window,
        report.pre_fire.scene_ids.len(),
        report.pre_fire.valid_pixels
    );
    println!(
        "Post-fire {}: {} scene(s), {} valid pixels",
        report.post_fire.window,
        report.post_fire.scene_ids.len(),
        report.post_fire.valid_pixels
    );
    if let Some((min, max)) = report.dnbr_range {
        println!("dNBR range: {min:.3} to {max:.3}");
    }

    println!(
        "\n{:>5}  {:<26} {:>14} {:>12} {:>8}",
        "class", "label", "area (m²)", "area (km²)", "% fire"
    );
    for row in &report.areas.classes {
        println!(
            "{:>5}  {:<26} {:>14.1} {:>12.4} {:>7.2}%",
            row.severity_class,
            row.severity_label,
            *row.area_m2,
            *row.area_km2,
            *row.percent_of_fire
        );
    }
    println!("\nTotal fire area: {}", report.areas.total_area_km2);
    println!(
        "Burned at low severity or worse: {}",
        report.areas.area_at_least(SeverityClass::LowSeverity)
    );
}
