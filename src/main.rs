use clap::Parser;
use std::path::{Path, PathBuf};
use tilemark::config::Config;
use tilemark::error::WatermarkError;
use tilemark::pipeline::{self, JobRequest};
use tilemark::prompt::{collect_fields, FieldOverrides};

/// Tilemark - stamp tiled provenance watermarks on PDFs and images
#[derive(Parser, Debug)]
#[command(name = "tilemark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file (.pdf, .jpg, .jpeg, .png, .webp, .tif, .tiff, .bmp)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file; for images the extension selects the format
    #[arg(short, long)]
    output: PathBuf,

    /// Rotation in degrees, counter-clockwise [default: -35]
    #[arg(long, allow_hyphen_values = true)]
    angle: Option<f32>,

    /// Opacity from 0 to 1 [default: 0.18]
    #[arg(long)]
    opacity: Option<f32>,

    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Font file path, or a font file name searched in system font directories
    #[arg(long)]
    font: Option<String>,

    /// Main text, e.g. "Copy for Bank XYZ"
    #[arg(long)]
    recipient: Option<String>,

    /// Purpose, e.g. "KYC 2025"
    #[arg(long)]
    purpose: Option<String>,

    /// Additional free text
    #[arg(long)]
    extra: Option<String>,

    /// Leave the date out of the watermark
    #[arg(long)]
    no_date: bool,

    /// Leave the content hash out of the watermark
    #[arg(long)]
    no_hash: bool,

    /// Never prompt; unset fields take their defaults
    #[arg(long)]
    non_interactive: bool,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = tilemark::logging::init_subscriber(args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match execute(&args) {
        Ok(report) => {
            println!("[OK] Watermark applied -> {}", report.output.display());
            println!("[i] SHA-256 of original: {}", report.sha256);
        }
        Err(e) => {
            eprintln!("[!] {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn execute(args: &Args) -> Result<pipeline::JobReport, WatermarkError> {
    let overrides = FieldOverrides {
        recipient: args.recipient.clone(),
        purpose: args.purpose.clone(),
        extra_text: args.extra.clone(),
        include_date: args.no_date.then_some(false),
        include_hash: args.no_hash.then_some(false),
    };

    // Fail on a bad input before reading the config or asking any question
    let mut request = JobRequest::new(&args.input, &args.output, overrides.clone().into_fields());
    pipeline::check_request(&request)?;
    let config = load_config(args)?;

    if !args.non_interactive {
        eprintln!("\n=== WATERMARK SETUP ===");
        let stdin = std::io::stdin();
        request.fields = collect_fields(&overrides, stdin.lock(), std::io::stderr())?;
    }

    pipeline::run(&request, &config)
}

/// Config file (or defaults) with command line overrides applied.
fn load_config(args: &Args) -> Result<Config, WatermarkError> {
    let mut config = match &args.config {
        Some(path) => {
            let config = Config::from_file(path).map_err(WatermarkError::Config)?;
            tracing::debug!(config_file = %path.display(), "Configuration loaded");
            config
        }
        None => Config::default(),
    };

    if let Some(angle) = args.angle {
        config.watermark.angle = angle;
    }
    if let Some(opacity) = args.opacity {
        let clamped = opacity.clamp(0.0, 1.0);
        if clamped != opacity {
            tracing::warn!(requested = opacity, used = clamped, "Opacity clamped to [0, 1]");
        }
        config.watermark.opacity = clamped;
    }
    if let Some(font) = &args.font {
        if looks_like_path(font) {
            config.font.path = Some(PathBuf::from(font));
        } else {
            config.font.path = None;
            config.font.name = Some(font.clone());
        }
    }

    Ok(config)
}

fn looks_like_path(value: &str) -> bool {
    let path = Path::new(value);
    path.is_file() || path.components().count() > 1
}
