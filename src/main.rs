use std::path::PathBuf;

use anyhow::{Result, anyhow};
use business_card_rust::model::{TemplateId, preset_catalog};
use business_card_rust::{Config, ExportFormat};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    Pdf,
    Svg,
    All,
}

#[derive(Parser, Debug)]
#[command(
    name = "business-card-rust",
    version,
    about = "Render a business card to PNG, PDF and SVG"
)]
struct Cli {
    /// Card description file (.toml or .json)
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Output format; repeat for several (png, pdf, svg, all)
    #[arg(short = 'f', long = "format", value_enum, default_value = "all")]
    format: Vec<FormatArg>,

    /// Raster resolution (overrides settings [export] dpi)
    #[arg(short = 'd', long = "dpi")]
    dpi: Option<u32>,

    /// Output directory (overrides settings [export] output_dir)
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// Logo to use instead of the card's own (URL, data URL or file path)
    #[arg(long = "logo")]
    logo: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// List template ids and exit
    #[arg(long = "show-templates")]
    show_templates: bool,

    /// List templates, fonts, DPI presets, QR levels and gradients, then exit
    #[arg(long = "show-presets")]
    show_presets: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    business_card_rust::logging::init(cli.verbose)?;

    if cli.show_templates {
        for template in TemplateId::ALL {
            println!("{}\t{}", template.id(), template.display_name());
        }
        return Ok(());
    }

    if cli.show_presets {
        for line in preset_catalog() {
            println!("{}", line);
        }
        return Ok(());
    }

    let input = cli
        .input
        .ok_or_else(|| anyhow!("--input is required"))?;
    let config = Config {
        input,
        formats: expand_formats(&cli.format),
        dpi: cli.dpi,
        output_dir: cli.out,
        logo: cli.logo,
        settings_path: cli.read_settings,
    };

    let report = business_card_rust::run(config).await?;
    for (_, path) in &report.written {
        println!("{}", path.display());
    }
    if report.is_success() {
        return Ok(());
    }
    for (format, err) in &report.failed {
        eprintln!("{} export failed: {}", format, err);
    }
    Err(anyhow!("{} export(s) failed", report.failed.len()))
}

fn expand_formats(args: &[FormatArg]) -> Vec<ExportFormat> {
    let mut formats = Vec::new();
    for arg in args {
        let expanded: &[ExportFormat] = match arg {
            FormatArg::Png => &[ExportFormat::Raster],
            FormatArg::Pdf => &[ExportFormat::Print],
            FormatArg::Svg => &[ExportFormat::Vector],
            FormatArg::All => &ExportFormat::ALL,
        };
        for format in expanded {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }
    }
    formats
}
