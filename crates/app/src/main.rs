use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lightbeam_core::{
    bands, record, BandSet, BeamConfig, BeamEngine, FrameRecorder, ManualScheduler, PixmapSurface,
    RecordingSettings, Viewport,
};
use tracing_subscriber::EnvFilter;

fn main() -> lightbeam_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Bands { count, seed } => run_bands(count, seed),
        Commands::Config => run_config(),
    }
}

fn run_render(args: RenderArgs) -> lightbeam_core::Result<()> {
    let mut config = match &args.config {
        Some(path) => BeamConfig::load(path)?,
        None => BeamConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(count) = args.bands {
        config.band_count = count;
    }

    tracing::info!(
        width = args.width,
        height = args.height,
        pixel_ratio = args.pixel_ratio,
        frames = args.frames,
        output = ?args.output,
        "rendering beam"
    );

    let mut engine: BeamEngine<PixmapSurface> = BeamEngine::new(config, ManualScheduler::new());
    engine.mount(
        PixmapSurface::new(),
        Viewport::new(args.width, args.height),
        args.pixel_ratio,
    );

    let removed = record::clear_previous(&args.output, "frame")?;
    if removed > 0 {
        tracing::debug!(removed, "cleared previous frames");
    }

    let mut recorder = FrameRecorder::new(RecordingSettings {
        output_dir: args.output.clone(),
        fps: args.fps,
        frames: args.frames,
        prefix: "frame".to_string(),
    });
    let written = recorder.record(&mut engine)?;
    engine.unmount();

    tracing::info!(written, seed = engine.bands().seed(), "finished rendering");
    Ok(())
}

fn run_bands(count: usize, seed: Option<u64>) -> lightbeam_core::Result<()> {
    let config = BeamConfig::default();
    let seed = seed.unwrap_or_else(bands::random_seed);
    let set = BandSet::from_seed(seed, count, &config.bands);
    println!("{}", bands::to_json_pretty(&set)?);
    Ok(())
}

fn run_config() -> lightbeam_core::Result<()> {
    println!("{}", BeamConfig::default().to_json_pretty()?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural light beam effect", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the effect headlessly and write every frame as a PNG.
    Render(RenderArgs),
    /// Print the band set generated for a seed as JSON.
    Bands {
        /// Number of bands to generate.
        #[arg(short, long, default_value_t = 28)]
        count: usize,
        /// Seed for the generator. Random when omitted.
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print the default configuration as JSON.
    Config,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Logical viewport width.
    #[arg(long, default_value_t = 960.0)]
    width: f32,
    /// Logical viewport height.
    #[arg(long, default_value_t = 320.0)]
    height: f32,
    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,
    /// Number of frames to render.
    #[arg(short, long, default_value_t = 60)]
    frames: u32,
    /// Playback rate used to step the clock. Must be at least 20, the
    /// slowest rate whose step is not clamped.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Seed for the band generator. Overrides the configured seed.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overrides the configured band count.
    #[arg(short, long)]
    bands: Option<usize>,
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory the PNG sequence is written to.
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,
}
