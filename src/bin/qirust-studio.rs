use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use qirust_studio::{make_qr, Content, ContentType, OutputFormat, PersonalizationMode, QrRequest, StylePreset};

/// Generate a styled PNG or SVG QR code for a URL or any text.
#[derive(Parser, Debug)]
#[command(name = "qirust-studio", version)]
struct Cli {
    /// The URL or text to encode in the QR code.
    #[arg(long, short = 'd')]
    data: String,

    /// Output file path (defaults to qr.png, or qr.svg for vector output).
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Size of each QR module in pixels.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    box_size: u32,

    /// Border size in modules around the QR.
    #[arg(long, default_value_t = 4)]
    border: u32,

    /// Foreground color (#RGB or #RRGGBB).
    #[arg(long, default_value = "#000000")]
    fg: String,

    /// Background color (#RGB or #RRGGBB).
    #[arg(long, default_value = "#ffffff")]
    bg: String,

    /// Make the background transparent.
    #[arg(long)]
    transparent: bool,

    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// Color preset (gold, silver, wedding_ivory, birthday, minimal_tech, craft_beer).
    #[arg(long, default_value = "custom")]
    style: String,

    /// Draw a rounded frame.
    #[arg(long)]
    frame: bool,

    #[arg(long, value_enum, default_value_t = ModeChoice::None)]
    mode: ModeChoice,

    /// Text to place on the code (initials, a caption).
    #[arg(long, conflicts_with_all = ["logo", "photo"])]
    text: Option<String>,

    /// Logo image to place on the code.
    #[arg(long, conflicts_with = "photo")]
    logo: Option<PathBuf>,

    /// Photo to place on the code, cropped to a circle.
    #[arg(long)]
    photo: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Svg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    None,
    Minimal,
    Focal,
    EasterEgg,
}

fn open_image(path: &Path) -> anyhow::Result<Content> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Content::from_image_bytes(&bytes).with_context(|| format!("decode {}", path.display()))
}

fn build_request(cli: &Cli) -> anyhow::Result<QrRequest> {
    let mut request = QrRequest::new(cli.data.trim());
    request.module_size = cli.box_size;
    request.border_modules = cli.border;
    request.fg_color = cli.fg.clone();
    request.bg_color = cli.bg.clone();
    request.transparent_background = cli.transparent;
    request.output_format = match cli.format {
        FormatChoice::Png => OutputFormat::Raster,
        FormatChoice::Svg => OutputFormat::Vector,
    };
    request.style_preset = StylePreset::from_name(&cli.style);
    request.add_frame = cli.frame;
    request.personalization_mode = match cli.mode {
        ModeChoice::None => PersonalizationMode::None,
        ModeChoice::Minimal => PersonalizationMode::Minimal,
        ModeChoice::Focal => PersonalizationMode::Focal,
        ModeChoice::EasterEgg => PersonalizationMode::EasterEgg,
    };
    (request.content_type, request.content) = match (&cli.text, &cli.logo, &cli.photo) {
        (Some(text), _, _) => (ContentType::Text, Content::Text(text.clone())),
        (_, Some(path), _) => (ContentType::Logo, open_image(path)?),
        (_, _, Some(path)) => (ContentType::Image, open_image(path)?),
        _ => (ContentType::Text, Content::Absent),
    };
    Ok(request)
}

fn run(cli: &Cli) -> anyhow::Result<PathBuf> {
    let request = build_request(cli)?;
    let output = cli.output.clone().unwrap_or_else(|| match cli.format {
        FormatChoice::Png => PathBuf::from("qr.png"),
        FormatChoice::Svg => PathBuf::from("qr.svg"),
    });

    let result = make_qr(request)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(&output, &result.encoded_bytes).with_context(|| format!("write {}", output.display()))?;
    Ok(output)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(path) => println!("QR code saved to: {}", path.display()),
        Err(err) => {
            eprintln!("Failed to generate QR code: {err:#}");
            std::process::exit(1);
        }
    }
}
