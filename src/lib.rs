pub mod config;
pub mod dossier;
mod error;
mod fonts;
pub mod mail;
mod model;
mod pdf;
pub mod signature;
pub mod validation;
pub mod wizard;
pub mod workflow;

pub use error::Error;
pub use fonts::{FontMetrics, LetterFont};
pub use model::{
    ImageData, LaidOutPage, LetterLayout, LineKind, PageGeometry, PlacedImage, PlacedLine,
    SignatureImage,
};
pub use pdf::layout::{SIGNATURE_CAPTION, WrappedLine, layout_letter, wrap_paragraph};

use std::path::Path;
use std::time::Instant;

use signature::SignatureSource;

/// Everything a render needs besides the letter text.
#[derive(Default)]
pub struct RenderOptions {
    pub geometry: PageGeometry,
    pub font: LetterFont,
    pub signature: Option<Box<dyn SignatureSource>>,
}

/// Fetch the signature (if any), then lay out and serialize the letter.
/// A signature that cannot be loaded is logged and left out.
pub fn render_letter(text: &str, options: &RenderOptions) -> Result<Vec<u8>, Error> {
    let signature = options
        .signature
        .as_ref()
        .and_then(|source| signature::load_signature(source.as_ref()));
    render_letter_with(text, &options.geometry, &options.font, signature.as_ref())
}

/// Render with an already-loaded signature. Deterministic for equal inputs.
pub fn render_letter_with(
    text: &str,
    geometry: &PageGeometry,
    font: &LetterFont,
    signature: Option<&SignatureImage>,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let used = pdf::used_chars(text);
    let loaded = fonts::load_font(font, &used)?;
    let t_font = t0.elapsed();

    let layout = layout_letter(text, geometry, &loaded.metrics, signature.is_some());
    let t_layout = t0.elapsed();

    let bytes = pdf::render(&layout, geometry, &loaded, &used, signature)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: font={:.1}ms, layout={:.1}ms, serialize={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_font.as_secs_f64() * 1000.0,
        (t_layout - t_font).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        layout.page_count(),
        bytes.len(),
    );

    Ok(bytes)
}

pub fn render_letter_to_file(text: &str, options: &RenderOptions, output: &Path) -> Result<(), Error> {
    let bytes = render_letter(text, options)?;
    std::fs::write(output, &bytes)?;
    Ok(())
}
