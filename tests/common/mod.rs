#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;

use reserve_letter::signature::SignatureSource;
use reserve_letter::{Error, LetterLayout, LineKind};

pub const EPS: f32 = 0.01;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPS
}

/// Words of all body lines, in drawing order.
pub fn body_words(layout: &LetterLayout) -> Vec<String> {
    layout
        .pages
        .iter()
        .flat_map(|p| p.lines.iter())
        .filter(|l| l.kind == LineKind::Body)
        .flat_map(|l| l.text.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

pub fn body_texts(layout: &LetterLayout) -> Vec<String> {
    layout
        .pages
        .iter()
        .flat_map(|p| p.body_lines())
        .map(|l| l.text.clone())
        .collect()
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Number of page objects in a generated PDF.
pub fn pdf_page_count(pdf: &[u8]) -> usize {
    count_occurrences(pdf, b"/Type /Page") - count_occurrences(pdf, b"/Type /Pages")
}

pub fn contains(pdf: &[u8], needle: &[u8]) -> bool {
    count_occurrences(pdf, needle) > 0
}

/// Inflated bodies of every Flate stream that decodes, in file order.
pub fn inflated_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = pdf;
    while let Some(start) = find(rest, b"stream\n") {
        let body = &rest[start + b"stream\n".len()..];
        let Some(end) = find(body, b"\nendstream") else {
            break;
        };
        if let Ok(inflated) = miniz_oxide::inflate::decompress_to_vec_zlib(&body[..end]) {
            out.push(inflated);
        }
        rest = &body[end + b"\nendstream".len()..];
    }
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Whether some page content shows `text` with the standard font. The
/// operand may be written as a literal string or as a hex string.
pub fn shows_text(pdf: &[u8], text: &str) -> bool {
    let winansi: Vec<u8> = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    let hex: String = winansi.iter().map(|b| format!("{b:02X}")).collect();
    // literal strings keep ASCII as-is; compare the run after the last non-ASCII char
    let ascii_tail = text.rsplit(|c: char| !c.is_ascii()).next().unwrap_or(text);
    inflated_streams(pdf).iter().any(|content| {
        count_occurrences(content, hex.as_bytes()) > 0
            || count_occurrences(content, hex.to_lowercase().as_bytes()) > 0
            || (!ascii_tail.is_empty() && count_occurrences(content, ascii_tail.as_bytes()) > 0)
    })
}

pub fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 20, 80, alpha]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 10, 10]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}

/// A signature source that always fails like an unreachable host.
pub struct UnreachableSignature;

impl SignatureSource for UnreachableSignature {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        Err(Error::Http("connection refused".to_string()))
    }

    fn describe(&self) -> String {
        "unreachable".to_string()
    }
}

/// A system TrueType font if one is installed.
pub fn find_system_ttf() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

pub fn mot_paragraph(count: usize) -> String {
    "mot ".repeat(count)
}
