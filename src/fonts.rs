use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;

/// Font used for the letter body and the attribution caption.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LetterFont {
    /// The standard Times-Roman Type1 font, not embedded.
    #[default]
    TimesRoman,
    /// A TrueType/OpenType file, subset and embedded.
    TrueType { path: PathBuf, face_index: u32 },
}

impl LetterFont {
    pub fn true_type(path: impl Into<PathBuf>) -> Self {
        LetterFont::TrueType {
            path: path.into(),
            face_index: 0,
        }
    }
}

/// Advance widths of the active letter font, in 1000-units per em.
#[derive(Clone, Debug)]
pub struct FontMetrics {
    widths_1000: Vec<f32>,
    char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontMetrics {
    /// Times-Roman AFM advance widths (no kerning).
    pub fn times_roman() -> Self {
        Self {
            widths_1000: TIMES_ROMAN_WIDTHS.to_vec(),
            char_widths_1000: None,
        }
    }

    /// Width of a single character in 1000-units. Embedded fonts answer from
    /// their per-char table; the standard font measures anything it cannot
    /// encode as `?`, which is what gets drawn.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000 {
            if let Some(&w) = map.get(&ch) {
                return w;
            }
        }
        let byte = winansi_or_placeholder(ch);
        self.widths_1000[(byte - 32) as usize]
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

enum FontSource {
    Standard,
    TrueType { data: Vec<u8>, face_index: u32 },
}

/// A letter font resolved for one render: metrics for layout plus whatever
/// the writer needs to emit the font objects.
pub(crate) struct LoadedFont {
    name: String,
    source: FontSource,
    pub(crate) metrics: FontMetrics,
}

pub(crate) fn load_font(font: &LetterFont, used_chars: &BTreeSet<char>) -> Result<LoadedFont, Error> {
    match font {
        LetterFont::TimesRoman => Ok(LoadedFont {
            name: "Times-Roman".to_string(),
            source: FontSource::Standard,
            metrics: FontMetrics::times_roman(),
        }),
        LetterFont::TrueType { path, face_index } => {
            let data = std::fs::read(path)?;
            let face = Face::parse(&data, *face_index)
                .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
            let units = face.units_per_em() as f32;
            // Unmapped chars are drawn with .notdef (glyph 0), so measure them with it.
            let advance = |ch: char| {
                let gid = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
                face.glyph_hor_advance(gid)
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0)
            };
            let widths_1000 = (32u8..=255u8).map(|b| advance(winansi_to_char(b))).collect();
            let char_widths_1000 = used_chars.iter().map(|&ch| (ch, advance(ch))).collect();
            let name = family_name(&face).unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "LetterFont".to_string())
            });
            log::debug!("Loaded letter font {name} from {}", path.display());
            Ok(LoadedFont {
                name,
                metrics: FontMetrics {
                    widths_1000,
                    char_widths_1000: Some(char_widths_1000),
                },
                source: FontSource::TrueType {
                    data,
                    face_index: *face_index,
                },
            })
        }
    }
}

fn family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<BTreeMap<char, u16>>,
}

impl FontEntry {
    /// Bytes for a `Tj` operand: 2-byte glyph IDs for embedded fonts,
    /// WinAnsi for the standard font.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    font: &LoadedFont,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &BTreeSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &font.source {
        FontSource::Standard => {
            pdf.type1_font(font_ref)
                .base_font(Name(font.name.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
        FontSource::TrueType { data, face_index } => Some(embed_truetype(
            pdf,
            font_ref,
            &font.name,
            data,
            *face_index,
            used_chars,
            alloc,
        )?),
    };

    log::debug!(
        "register_font: {} → {:.1}ms",
        font.name,
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with
/// Identity-H encoding, subset to the characters the letter uses.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<BTreeMap<char, u16>, Error> {
    let face = Face::parse(font_data, face_index).map_err(|e| Error::Font(format!("{font_name}: {e}")))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    // BTreeSet iteration keeps glyph remapping, and therefore the output bytes, stable
    let mut remapper = subsetter::GlyphRemapper::new();
    let glyphs: Vec<PlannedGlyph> = used_chars
        .iter()
        .filter_map(|&ch| {
            let gid = face.glyph_index(ch)?;
            Some(PlannedGlyph {
                ch,
                original_gid: gid.0,
                subset_gid: remapper.remap(gid.0),
                width: face
                    .glyph_hor_advance(gid)
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0),
            })
        })
        .collect();

    let (subset_data, subsetted) = match subsetter::subset(font_data, face_index, &remapper) {
        Ok(data) => (data, true),
        Err(e) => {
            log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
            (font_data.to_vec(), false)
        }
    };
    let (char_to_gid, gid_widths) = glyph_mapping(&glyphs, subsetted);

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Font(format!("{font_name}: font program too large")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

struct PlannedGlyph {
    ch: char,
    original_gid: u16,
    subset_gid: u16,
    width: f32,
}

/// Char-to-glyph map and sorted `/W` entries for the embedded font program.
/// A full (unsubsetted) program keeps the face's own glyph IDs.
fn glyph_mapping(glyphs: &[PlannedGlyph], subsetted: bool) -> (BTreeMap<char, u16>, Vec<(u16, f32)>) {
    let gid = |g: &PlannedGlyph| if subsetted { g.subset_gid } else { g.original_gid };
    let char_to_gid = glyphs.iter().map(|g| (g.ch, gid(g))).collect();
    let mut gid_widths: Vec<(u16, f32)> = glyphs.iter().map(|g| (gid(g), g.width)).collect();
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);
    (char_to_gid, gid_widths)
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

fn winansi_or_placeholder(c: char) -> u8 {
    match char_to_winansi(c) {
        0 => b'?',
        b => b,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().map(winansi_or_placeholder).collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Times-Roman advance widths for WinAnsi bytes 32..=255 (Adobe AFM).
/// Code points undefined in WinAnsi are 0.
#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [f32; 224] = [
    250.0, 333.0, 408.0, 500.0, 500.0, 833.0, 778.0, 180.0, 333.0, 333.0, 500.0, 564.0, 250.0, 333.0, 250.0, 278.0,
    500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 278.0, 278.0, 564.0, 564.0, 564.0, 444.0,
    921.0, 722.0, 667.0, 667.0, 722.0, 611.0, 556.0, 722.0, 722.0, 333.0, 389.0, 722.0, 611.0, 889.0, 722.0, 722.0,
    556.0, 722.0, 667.0, 556.0, 611.0, 722.0, 722.0, 944.0, 722.0, 722.0, 611.0, 333.0, 278.0, 333.0, 469.0, 500.0,
    333.0, 444.0, 500.0, 444.0, 500.0, 444.0, 333.0, 500.0, 500.0, 278.0, 278.0, 500.0, 278.0, 778.0, 500.0, 500.0,
    500.0, 500.0, 333.0, 389.0, 278.0, 500.0, 500.0, 722.0, 500.0, 500.0, 444.0, 480.0, 200.0, 480.0, 541.0, 0.0,
    500.0, 0.0, 333.0, 500.0, 444.0, 1000.0, 500.0, 500.0, 333.0, 1000.0, 556.0, 333.0, 889.0, 0.0, 611.0, 0.0,
    0.0, 333.0, 333.0, 444.0, 444.0, 350.0, 500.0, 1000.0, 333.0, 980.0, 389.0, 333.0, 722.0, 0.0, 444.0, 722.0,
    250.0, 333.0, 500.0, 500.0, 500.0, 500.0, 200.0, 500.0, 333.0, 760.0, 276.0, 500.0, 564.0, 333.0, 760.0, 333.0,
    400.0, 564.0, 300.0, 300.0, 333.0, 500.0, 453.0, 250.0, 333.0, 300.0, 310.0, 500.0, 750.0, 750.0, 750.0, 444.0,
    722.0, 722.0, 722.0, 722.0, 722.0, 722.0, 889.0, 667.0, 611.0, 611.0, 611.0, 611.0, 333.0, 333.0, 333.0, 333.0,
    722.0, 722.0, 722.0, 722.0, 722.0, 722.0, 722.0, 564.0, 722.0, 722.0, 722.0, 722.0, 722.0, 722.0, 556.0, 500.0,
    444.0, 444.0, 444.0, 444.0, 444.0, 444.0, 667.0, 444.0, 444.0, 444.0, 444.0, 444.0, 278.0, 278.0, 278.0, 278.0,
    500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 564.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0, 500.0,
];
