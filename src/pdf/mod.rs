pub mod layout;

use std::collections::BTreeSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{FontEntry, LoadedFont, register_font};
use crate::model::{ImageData, LetterLayout, LineKind, PageGeometry, SignatureImage};

const CAPTION_GRAY: f32 = 0.4;

/// Characters the font has to cover: the letter, the caption and a space.
pub(crate) fn used_chars(text: &str) -> BTreeSet<char> {
    let mut chars: BTreeSet<char> = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    chars.extend(layout::SIGNATURE_CAPTION.chars());
    chars.insert(' ');
    chars
}

fn embed_signature(
    pdf: &mut Pdf,
    img: &SignatureImage,
    alloc: &mut impl FnMut() -> Ref,
) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.pixel_width as i32, img.pixel_height as i32);

    match &img.data {
        ImageData::Jpeg { bytes, grayscale } => {
            let mut xobj = pdf.image_xobject(xobj_ref, bytes);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *grayscale {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        ImageData::Rgb { rgb, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    xobj_ref
}

fn page_content(
    page: &crate::model::LaidOutPage,
    font: &FontEntry,
    image_name: Option<&str>,
) -> Content {
    let mut content = Content::new();

    if let (Some(img), Some(name)) = (&page.image, image_name) {
        content.save_state();
        content.transform([img.width, 0.0, 0.0, img.height, img.x, img.y]);
        content.x_object(Name(name.as_bytes()));
        content.restore_state();
    }

    if page.lines.is_empty() {
        return content;
    }

    content.begin_text();
    let mut td_x = 0.0_f32;
    let mut td_y = 0.0_f32;
    let mut cur_size = 0.0_f32;
    let mut cur_kind = None;

    for line in &page.lines {
        if cur_kind != Some(line.kind) {
            match line.kind {
                LineKind::Body => content.set_fill_gray(0.0),
                LineKind::Caption => content.set_fill_gray(CAPTION_GRAY),
            };
            cur_kind = Some(line.kind);
        }
        if cur_size != line.font_size {
            content.set_font(Name(font.pdf_name.as_bytes()), line.font_size);
            cur_size = line.font_size;
        }
        content.next_line(line.x - td_x, line.y - td_y);
        td_x = line.x;
        td_y = line.y;
        content.show(Str(&font.encode(&line.text)));
    }
    content.end_text();
    content
}

/// Serialize a laid-out letter. The same layout, font and signature always
/// produce the same bytes.
pub(crate) fn render(
    layout: &LetterLayout,
    geometry: &PageGeometry,
    font: &LoadedFont,
    used_chars: &BTreeSet<char>,
    signature: Option<&SignatureImage>,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let font_entry = register_font(&mut pdf, font, "F1".to_string(), &mut alloc, used_chars)?;
    let t_fonts = t0.elapsed();

    let has_placed_image = layout.pages.iter().any(|p| p.image.is_some());
    let image_xobject = match signature {
        Some(img) if has_placed_image => Some(("Im1", embed_signature(&mut pdf, img, &mut alloc))),
        _ => None,
    };
    let t_images = t0.elapsed();

    let n = layout.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in layout.pages.iter().enumerate() {
        let content = page_content(page, &font_entry, image_xobject.map(|(name, _)| name));
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for (i, page) in layout.pages.iter().enumerate() {
        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, geometry.page_width, geometry.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        resources
            .fonts()
            .pair(Name(font_entry.pdf_name.as_bytes()), font_entry.font_ref);
        if let (Some(_), Some((name, xobj_ref))) = (&page.image, image_xobject) {
            resources.x_objects().pair(Name(name.as_bytes()), xobj_ref);
        }
    }

    let t_assembly = t0.elapsed();
    log::info!(
        "Render phases: font_embed={:.1}ms, images={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_images).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}
