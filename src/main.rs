use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pharmkit::{config, media, paths, qr};

/// Drug label QR codes and media manifest maintenance
#[derive(Parser)]
#[command(name = "pharmkit", version)]
#[command(
    about = "Generate drug QR codes and reconcile media.json with the media folder",
    long_about = None
)]
struct Cli {
    /// Project root all default paths resolve against (default: $PROJECT_ROOT or ".")
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Config file (default: <root>/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write <identifier>_qrcode.png for every identifier in drugs.json
    Qr {
        /// Identifier list (default: <root>/drugs.json)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Directory for the PNG files (default: <root>)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// URL prefix the identifier is appended to
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    /// Normalize media.json so every media folder has an entry
    Media {
        /// Manifest to rewrite (default: <root>/media.json)
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Media root directory (default: <root>/media)
        #[arg(long, value_name = "DIR")]
        media_dir: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli
        .root
        .unwrap_or_else(|| PathBuf::from(paths::project_root()));
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Qr {
            input,
            output_dir,
            base_url,
        } => run_qr(&root, config_file, input, output_dir, base_url),
        Commands::Media {
            manifest,
            media_dir,
        } => run_media(&root, config_file, manifest, media_dir),
    }
}

fn run_qr(
    root: &Path,
    config_file: Option<&Path>,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let mut qr_config = config::load_qr_config(root, config_file);
    if let Some(input) = input {
        qr_config.identifiers_path = input;
    }
    if let Some(output_dir) = output_dir {
        qr_config.output_dir = output_dir;
    }
    if let Some(base_url) = base_url {
        qr_config.base_url = base_url;
    }

    let report = qr::generate_qr_codes(&qr_config).with_context(|| {
        format!(
            "QR generation from {} failed",
            qr_config.identifiers_path.display()
        )
    })?;

    println!(
        "Generated {} QR codes in {}",
        report.count(),
        qr_config.output_dir.display()
    );
    Ok(())
}

fn run_media(
    root: &Path,
    config_file: Option<&Path>,
    manifest: Option<PathBuf>,
    media_dir: Option<PathBuf>,
) -> Result<()> {
    let mut media_config = config::load_reconcile_config(root, config_file);
    if let Some(manifest) = manifest {
        media_config.manifest_path = manifest;
    }
    if let Some(media_dir) = media_dir {
        media_config.media_dir = media_dir;
    }

    let report = media::run(&media_config).with_context(|| {
        format!(
            "Reconciling {} failed",
            media_config.manifest_path.display()
        )
    })?;

    println!(
        "{}: {} folders, {} scanned, {} manifest-only entries preserved",
        media_config.manifest_path.display(),
        report.folders.len(),
        report.scanned.len(),
        report.preserved.len()
    );
    Ok(())
}
