use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use reserve_letter::config::Settings;
use reserve_letter::signature::{FileSignature, HttpSignature, SignatureSource};
use reserve_letter::{LetterFont, RenderOptions};

/// Render a reservation letter to a paginated A4 PDF.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Plain-text letter, one paragraph per line ("-" reads stdin)
    input: PathBuf,

    /// Output PDF path
    output: PathBuf,

    /// Signature image URL (overrides SIGNATURE_URL)
    #[arg(long, conflicts_with = "signature_file")]
    signature_url: Option<String>,

    /// Signature image file (PNG or JPEG)
    #[arg(long)]
    signature_file: Option<PathBuf>,

    /// TrueType/OpenType font to embed instead of Times-Roman (overrides LETTER_FONT)
    #[arg(long)]
    font: Option<PathBuf>,
}

fn read_input(path: &PathBuf) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::from_env();

    let text = match read_input(&args.input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error reading {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let signature: Option<Box<dyn SignatureSource>> = match (&args.signature_url, &args.signature_file) {
        (Some(url), _) => Some(Box::new(HttpSignature::new(url.as_str()))),
        (None, Some(path)) => Some(Box::new(FileSignature::new(path))),
        (None, None) => settings
            .signature_source()
            .map(|s| Box::new(s) as Box<dyn SignatureSource>),
    };

    let options = RenderOptions {
        geometry: settings.geometry(),
        font: args
            .font
            .map(LetterFont::true_type)
            .unwrap_or_else(|| settings.letter_font()),
        signature,
    };

    match reserve_letter::render_letter_to_file(&text, &options, &args.output) {
        Ok(()) => {
            println!("Wrote {}", args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
