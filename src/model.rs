/// Fixed page geometry for letter rendering. All values are PDF points
/// (1/72 inch), origin at the bottom-left corner of the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub line_height: f32,
    pub font_size: f32,
    pub caption_font_size: f32,
    /// A body line is not drawn while the cursor is closer than this to the
    /// page bottom margin.
    pub body_break_threshold: f32,
    /// Same rule for the signature image.
    pub signature_break_threshold: f32,
    pub signature_width: f32,
    pub signature_height: f32,
    /// Distance from the cursor down to the image's bottom edge.
    pub signature_drop: f32,
    /// Distance from the cursor down to the caption baseline.
    pub caption_drop: f32,
    /// Blank lines inserted between the body and the signature block.
    pub signature_gap_lines: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 50.0,
            line_height: 14.0,
            font_size: 11.0,
            caption_font_size: 9.0,
            body_break_threshold: 100.0,
            signature_break_threshold: 80.0,
            signature_width: 150.0,
            signature_height: 50.0,
            signature_drop: 60.0,
            caption_drop: 70.0,
            signature_gap_lines: 2.0,
        }
    }
}

impl PageGeometry {
    pub fn max_content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Cursor position of the first line on a fresh page.
    pub fn top(&self) -> f32 {
        self.page_height - self.margin
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Body,
    Caption,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub kind: LineKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedImage {
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaidOutPage {
    pub lines: Vec<PlacedLine>,
    pub image: Option<PlacedImage>,
}

impl LaidOutPage {
    pub fn body_lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.lines.iter().filter(|l| l.kind == LineKind::Body)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LetterLayout {
    pub pages: Vec<LaidOutPage>,
}

impl LetterLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn caption(&self) -> Option<&PlacedLine> {
        self.pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .find(|l| l.kind == LineKind::Caption)
    }
}

/// Pixel payload of a decoded signature image.
#[derive(Clone, Debug)]
pub enum ImageData {
    /// Passed through untouched and embedded with DCTDecode.
    Jpeg { bytes: Vec<u8>, grayscale: bool },
    /// 8-bit RGB samples plus an optional 8-bit alpha channel.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// A fetched and decoded signature image ready for embedding.
#[derive(Clone, Debug)]
pub struct SignatureImage {
    pub data: ImageData,
    pub pixel_width: u32,
    pub pixel_height: u32,
}
