use crate::fonts::FontMetrics;
use crate::model::{LaidOutPage, LetterLayout, LineKind, PageGeometry, PlacedImage, PlacedLine};

/// Attribution line drawn under the signature.
pub const SIGNATURE_CAPTION: &str = "Validé par l'avocate partenaire AccidentDoc";

/// A wrapped line and its measured width.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    pub width: f32,
}

/// Greedy word wrap. Lines break only at ASCII whitespace, so a
/// non-breaking space stays inside its word. A word wider than `max_width`
/// sits alone on its own line.
pub fn wrap_paragraph(
    paragraph: &str,
    metrics: &FontMetrics,
    font_size: f32,
    max_width: f32,
) -> Vec<WrappedLine> {
    let space_w = metrics.space_width(font_size);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_w: f32 = 0.0;

    let words = paragraph
        .split(|c: char| c.is_ascii_whitespace())
        .filter(|w| !w.is_empty());
    for word in words {
        let word_w = metrics.text_width(word, font_size);
        let candidate_w = if line.is_empty() {
            word_w
        } else {
            line_w + space_w + word_w
        };

        if candidate_w > max_width && !line.is_empty() {
            lines.push(WrappedLine {
                text: std::mem::take(&mut line),
                width: line_w,
            });
            line.push_str(word);
            line_w = word_w;
        } else {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            line_w = candidate_w;
        }
    }

    if !line.is_empty() {
        lines.push(WrappedLine {
            text: line,
            width: line_w,
        });
    }
    lines
}

struct Paginator<'a> {
    geometry: &'a PageGeometry,
    metrics: &'a FontMetrics,
    finished: Vec<LaidOutPage>,
    current: LaidOutPage,
    y: f32,
}

impl<'a> Paginator<'a> {
    fn new(geometry: &'a PageGeometry, metrics: &'a FontMetrics) -> Self {
        Self {
            geometry,
            metrics,
            finished: Vec::new(),
            current: LaidOutPage::default(),
            y: geometry.top(),
        }
    }

    fn new_page(&mut self) {
        self.finished.push(std::mem::take(&mut self.current));
        self.y = self.geometry.top();
        log::debug!("Page break → page {}", self.finished.len() + 1);
    }

    fn ensure_room(&mut self, threshold: f32) {
        if self.y < self.geometry.margin + threshold {
            self.new_page();
        }
    }

    fn draw_line(&mut self, line: WrappedLine) {
        self.ensure_room(self.geometry.body_break_threshold);
        self.current.lines.push(PlacedLine {
            text: line.text,
            x: self.geometry.margin,
            y: self.y,
            width: line.width,
            font_size: self.geometry.font_size,
            kind: LineKind::Body,
        });
        self.y -= self.geometry.line_height;
    }

    fn paragraph(&mut self, paragraph: &str) {
        if paragraph.trim().is_empty() {
            self.y -= self.geometry.line_height;
            return;
        }
        let lines = wrap_paragraph(
            paragraph,
            self.metrics,
            self.geometry.font_size,
            self.geometry.max_content_width(),
        );
        for line in lines {
            self.draw_line(line);
        }
    }

    fn signature_block(&mut self, with_image: bool) {
        let g = self.geometry;
        self.y -= g.line_height * g.signature_gap_lines;

        if with_image {
            self.ensure_room(g.signature_break_threshold);
            self.current.image = Some(PlacedImage {
                x: g.margin,
                y: self.y - g.signature_drop,
                width: g.signature_width,
                height: g.signature_height,
            });
        }

        let mut caption_y = self.y - g.caption_drop;
        if caption_y < g.margin {
            self.new_page();
            caption_y = self.y;
        }
        self.y = caption_y;
        self.current.lines.push(PlacedLine {
            text: SIGNATURE_CAPTION.to_string(),
            x: g.margin,
            y: self.y,
            width: self.metrics.text_width(SIGNATURE_CAPTION, g.caption_font_size),
            font_size: g.caption_font_size,
            kind: LineKind::Caption,
        });
    }

    fn finish(mut self) -> LetterLayout {
        self.finished.push(self.current);
        LetterLayout {
            pages: self.finished,
        }
    }
}

/// Lay out a letter body followed by the signature block.
///
/// Paragraphs are separated by `\n`. A blank paragraph advances the cursor by
/// one line without a page-break check. Every body line is preceded by a
/// page-break check against `body_break_threshold`; the signature image uses
/// `signature_break_threshold`. `with_signature_image` reserves and places the
/// image; the caption is always emitted.
pub fn layout_letter(
    text: &str,
    geometry: &PageGeometry,
    metrics: &FontMetrics,
    with_signature_image: bool,
) -> LetterLayout {
    let mut paginator = Paginator::new(geometry, metrics);
    for paragraph in text.split('\n') {
        paginator.paragraph(paragraph);
    }
    paginator.signature_block(with_signature_image);
    paginator.finish()
}
