use std::path::PathBuf;
use std::process;

use clap::Parser;

use image_restore::{default_output_path, media_type_for_path, save_image, RestoreSession};

#[derive(Parser)]
#[command(
    name = "image-restore",
    about = "Sharpen and brighten an image with a fixed restoration pipeline",
    version,
    after_help = "Simple usage: image-restore <image>  (writes {name}_restored.{ext})"
)]
struct Cli {
    /// Input image file
    input: PathBuf,

    /// Output file (default: {name}_restored.{ext})
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if !cli.input.is_file() {
        eprintln!("Error: Input file does not exist: {}", cli.input.display());
        process::exit(1);
    }

    let Some(media_type) = media_type_for_path(&cli.input) else {
        eprintln!(
            "Error: Not a supported image file: {}",
            cli.input.display()
        );
        process::exit(1);
    };

    let bytes = match std::fs::read(&cli.input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", cli.input.display());
            process::exit(1);
        }
    };

    let mut session = RestoreSession::new();
    let displayed = match session.load_and_rasterize(&bytes, media_type) {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", cli.input.display());
            process::exit(1);
        }
    };

    if !cli.quiet {
        eprintln!(
            "Loaded {} ({}x{})",
            cli.input.display(),
            displayed.width(),
            displayed.height()
        );
    }

    let restored = match session.restore() {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", cli.input.display());
            process::exit(1);
        }
    };

    let output = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.input));

    if let Err(e) = save_image(&restored, &output) {
        eprintln!("[FAIL] {}: {e}", output.display());
        process::exit(1);
    }

    if !cli.quiet {
        eprintln!("[OK] {}", output.display());
    }
}
