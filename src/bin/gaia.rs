use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gaia_rs::{Abgr, Client, PlotConfig, StyleTable};
use gaia_rs::{api, codec, message, quantize, style};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gaia",
    version,
    about = "Build, submit & save GAIA map visualizations"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an input file to the render service and save the artifact.
    Render(RenderArgs),
    /// Bin a column of magnitudes and write a style file for it.
    Style(StyleArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input file with one map element per line (lonlat, usfips, hasc, ...).
    #[arg(short, long)]
    input: PathBuf,
    /// Style file to attach (repeatable).
    #[arg(short = 's', long = "style")]
    styles: Vec<PathBuf>,
    /// Output base name; the extension comes from the response. Defaults to the input name.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Render service host.
    #[arg(long, default_value = api::DEFAULT_HOST)]
    host: String,
    /// Render service port.
    #[arg(long, default_value_t = api::DEFAULT_PORT)]
    port: u16,
    /// Plot configuration as JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Image format (gif or png).
    #[arg(long)]
    format: Option<String>,
    /// Bundle format for animated output (tar, mpg, mov, mp4).
    #[arg(long)]
    bundle_format: Option<String>,
    /// Title drawn on the visualization.
    #[arg(long)]
    title: Option<String>,
    /// Legend text.
    #[arg(long)]
    legend: Option<String>,
    /// Background color as alpha.blue.green.red.
    #[arg(long)]
    background_color: Option<Abgr>,
    #[arg(long)]
    stroke_width: Option<f64>,
    #[arg(long)]
    max_resolution: Option<f64>,
    #[arg(long)]
    font_size: Option<f64>,
    #[arg(long)]
    legend_font_size: Option<f64>,
    /// Print the XML message to stdout instead of calling the service.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// File of whitespace-separated magnitudes to bin.
    #[arg(short, long)]
    values: PathBuf,
    /// Number of bins to aim for (equal-count mode).
    #[arg(short, long, default_value_t = 6)]
    bins: usize,
    /// Use the fixed percentile palette instead of equal-count bins.
    #[arg(long, default_value_t = false)]
    percentile: bool,
    /// Ramp start color (equal-count mode).
    #[arg(long, default_value = "255.255.0.0")]
    start_color: Abgr,
    /// Ramp end color (equal-count mode).
    #[arg(long, default_value = "255.0.0.255")]
    end_color: Abgr,
    /// Point radius written on every bin.
    #[arg(long, default_value_t = 0.0)]
    radius: f64,
    /// Style id the table is registered under.
    #[arg(long, default_value_t = 1)]
    style_id: i32,
    /// Mark the style as legend-capable.
    #[arg(long, default_value_t = false)]
    legend: bool,
    /// Output style file path.
    #[arg(short, long)]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Style(args) => cmd_style(args),
    }
}

fn load_config(args: &RenderArgs) -> Result<PlotConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?
        }
        None => PlotConfig::default(),
    };
    if let Some(format) = &args.format {
        config.output_format = format.clone();
    }
    if let Some(bundle) = &args.bundle_format {
        config.bundle_format = Some(bundle.clone());
    }
    if let Some(title) = &args.title {
        config.title = Some(title.clone());
    }
    if let Some(legend) = &args.legend {
        config.legend = Some(legend.clone());
    }
    if let Some(color) = args.background_color {
        config.background_color = Some(color);
    }
    if let Some(width) = args.stroke_width {
        config.stroke_width = width;
    }
    if let Some(resolution) = args.max_resolution {
        config.max_resolution = resolution;
    }
    if let Some(size) = args.font_size {
        config.font_size = size;
    }
    if let Some(size) = args.legend_font_size {
        config.legend_font_size = size;
    }
    Ok(config)
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let records = codec::parse_record_file(&args.input)?;
    let mut styles = Vec::with_capacity(args.styles.len());
    for path in &args.styles {
        styles.push(style::parse_style_file(path)?);
    }
    let config = load_config(&args)?;
    let xml = message::build_message(&config, &styles, &records);

    if args.dry_run {
        println!("{xml}");
        return Ok(());
    }

    let client = Client::new(args.host.clone(), args.port);
    let out_base = args
        .out
        .clone()
        .unwrap_or_else(|| args.input.with_extension(""));
    let saved = client.render(&xml, &out_base)?;
    eprintln!(
        "Saved visualization of {} elements to {}",
        records.len(),
        saved.display()
    );
    Ok(())
}

fn cmd_style(args: StyleArgs) -> Result<()> {
    let text = fs::read_to_string(&args.values)
        .with_context(|| format!("read {}", args.values.display()))?;
    let mut values = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for token in line.split_whitespace() {
            let value: f64 = token
                .parse()
                .with_context(|| format!("invalid magnitude `{token}`"))?;
            values.push(value);
        }
    }
    if values.is_empty() {
        anyhow::bail!("no magnitudes in {}", args.values.display());
    }

    let (colors, boundaries) = if args.percentile {
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        quantize::compute_percent_boundaries(0.25 * max, max)
    } else {
        let boundaries = quantize::compute_boundaries(&values, args.bins);
        let colors = quantize::compute_colors(args.start_color, args.end_color, boundaries.len());
        (colors, boundaries)
    };

    let table = StyleTable::from_boundaries(
        args.style_id,
        args.legend,
        &boundaries,
        &colors,
        args.radius,
    );
    style::write_style_file(&table, &args.out)?;
    eprintln!(
        "Wrote {} bins to {}",
        table.bins.len(),
        args.out.display()
    );
    Ok(())
}
