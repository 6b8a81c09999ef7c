//! Signature image sources. A signature that cannot be fetched or decoded is
//! never fatal: the letter is rendered without it.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::model::{ImageData, SignatureImage};

pub trait SignatureSource {
    fn fetch(&self) -> Result<Vec<u8>, Error>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Fetches the signature over HTTP(S) with a single GET.
pub struct HttpSignature {
    url: String,
    timeout: Duration,
}

impl HttpSignature {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SignatureSource for HttpSignature {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "GET {} returned {}",
                self.url,
                response.status()
            )));
        }
        Ok(response.bytes()?.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

pub struct FileSignature {
    path: PathBuf,
}

impl FileSignature {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SignatureSource for FileSignature {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        Ok(std::fs::read(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Signature bytes already in memory.
pub struct StaticSignature(pub Vec<u8>);

impl SignatureSource for StaticSignature {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.0.len())
    }
}

/// Only absolute http(s) URLs are fetched; anything else means "no signature".
pub fn source_for_url(url: Option<&str>) -> Option<HttpSignature> {
    let url = url?.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(HttpSignature::new(url))
    } else {
        if !url.is_empty() {
            log::debug!("Ignoring non-HTTP signature location {url}");
        }
        None
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8, 0xFF])
}

/// Decode PNG or JPEG bytes into an embeddable image.
pub fn decode_signature(data: Vec<u8>) -> Result<SignatureImage, Error> {
    let reader = image::ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| Error::Image(e.to_string()))?;
    let decoded = reader.decode().map_err(|e| Error::Image(e.to_string()))?;
    let (pixel_width, pixel_height) = (decoded.width(), decoded.height());
    if pixel_width == 0 || pixel_height == 0 {
        return Err(Error::Image("empty image".to_string()));
    }

    if is_jpeg(&data) {
        let grayscale = matches!(
            decoded.color(),
            image::ColorType::L8 | image::ColorType::L16
        );
        return Ok(SignatureImage {
            data: ImageData::Jpeg {
                bytes: data,
                grayscale,
            },
            pixel_width,
            pixel_height,
        });
    }

    let rgba = decoded.to_rgba8();
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
    let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
    let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());

    Ok(SignatureImage {
        data: ImageData::Rgb { rgb, alpha },
        pixel_width,
        pixel_height,
    })
}

/// Fetch and decode the signature, logging and swallowing any failure.
pub fn load_signature(source: &dyn SignatureSource) -> Option<SignatureImage> {
    let t0 = std::time::Instant::now();
    let result = source.fetch().and_then(decode_signature);
    match result {
        Ok(img) => {
            log::debug!(
                "Loaded signature {}x{} from {} in {:.1}ms",
                img.pixel_width,
                img.pixel_height,
                source.describe(),
                t0.elapsed().as_secs_f64() * 1000.0,
            );
            Some(img)
        }
        Err(e) => {
            log::warn!(
                "Could not load signature image from {}, continuing without it: {e}",
                source.describe()
            );
            None
        }
    }
}
