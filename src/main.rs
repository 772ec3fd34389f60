use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gif_quant::{DistanceMetric, DitherMode, QuantizerKind};
use gifloom::api::summarize;
use gifloom::models::EncoderConfig;
use gifloom::rendering::load_png;
use gifloom::{FrameOptions, GifEncoder};

#[derive(Parser)]
#[command(name = "gifloom")]
#[command(about = "Gifloom - animated GIF encoder with palette quantization and dithering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode PNG frames into an animated GIF
    Encode {
        /// YAML config file (default: $GIFLOOM_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output GIF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Frame delay in seconds
        #[arg(short, long)]
        delay: Option<f64>,

        /// Loop count (0 = forever)
        #[arg(short, long, conflicts_with = "no_loop")]
        repeat: Option<u16>,

        /// Play the animation once
        #[arg(long)]
        no_loop: bool,

        /// Dithering algorithm (e.g. "nearest", "floyd-steinberg", "riemersma")
        #[arg(long)]
        dither: Option<DitherMode>,

        /// Palette builder: "wu", "neuquant" or "rgbquant"
        #[arg(short, long)]
        quantizer: Option<QuantizerKind>,

        /// Color distance metric (e.g. "euclidean-bt709", "ciede2000")
        #[arg(long)]
        metric: Option<DistanceMetric>,

        /// Palette size target per frame (2-256)
        #[arg(long)]
        colors: Option<usize>,

        /// Write the GIF base64-encoded
        #[arg(long)]
        base64: bool,

        /// Input PNG frames, in display order
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
    /// Print the structure of a GIF file
    Inspect {
        /// GIF file to inspect
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gifloom=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Encode {
            config,
            output,
            delay,
            repeat,
            no_loop,
            dither,
            quantizer,
            metric,
            colors,
            base64,
            frames,
        } => {
            let mut config = EncoderConfig::load_or_default(config)?;
            if let Some(delay) = delay {
                config.delay = delay;
            }
            if let Some(mode) = dither {
                config.dithering = mode;
            }
            if let Some(kind) = quantizer {
                config.quantizer = kind;
            }
            if let Some(metric) = metric {
                config.distance = metric;
            }
            if let Some(colors) = colors {
                config.max_colors = colors;
            }
            if no_loop {
                config.repeat = None;
            } else if repeat.is_some() {
                config.repeat = repeat;
            }
            run_encode(config, &frames, &output, base64).await
        }
        Commands::Inspect { file, json } => run_inspect(&file, json),
    }
}

async fn run_encode(
    config: EncoderConfig,
    frames: &[PathBuf],
    output: &PathBuf,
    base64: bool,
) -> anyhow::Result<()> {
    let mut encoder = GifEncoder::new(config)?;
    let total = frames.len();
    encoder.on_render_progress(move |fraction| {
        tracing::debug!(progress = fraction, frames = total, "Encoding");
    });

    for path in frames {
        let frame =
            load_png(path).with_context(|| format!("Failed to load {}", path.display()))?;
        encoder.add_frame(frame, FrameOptions::default())?;
    }

    let bytes = if base64 {
        encoder.get_base64_gif().await?.into_bytes()
    } else {
        encoder.get_blob_gif().await?
    };
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Encoded {} ({} frames, {} bytes)", output.display(), total, bytes.len());

    Ok(())
}

fn run_inspect(file: &PathBuf, json: bool) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let summary = summarize(&bytes).with_context(|| format!("Failed to decode {}", file.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
