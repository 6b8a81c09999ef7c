mod common;

use common::{
    UnreachableSignature, contains, find_system_ttf, jpeg_bytes, mot_paragraph, pdf_page_count, png_bytes,
    shows_text,
};
use reserve_letter::signature::{SignatureSource, StaticSignature, decode_signature, load_signature, source_for_url};
use reserve_letter::{
    ImageData, LetterFont, PageGeometry, RenderOptions, SIGNATURE_CAPTION, render_letter, render_letter_with,
};

#[test]
fn short_letter_renders_a_single_page() {
    let pdf = render_letter("Bonjour.\n\nCeci est un test.", &RenderOptions::default())
        .expect("render");

    assert!(pdf.starts_with(b"%PDF-"));
    assert_eq!(pdf_page_count(&pdf), 1);
    assert!(contains(&pdf, b"/Times-Roman"));
    assert!(contains(&pdf, b"/WinAnsiEncoding"));
    assert!(contains(&pdf, b"/MediaBox"));
}

#[test]
fn long_letter_renders_several_pages() {
    let pdf = render_letter(&mot_paragraph(3000), &RenderOptions::default()).expect("render");
    assert_eq!(pdf_page_count(&pdf), 3);
}

#[test]
fn rendering_is_byte_identical_across_runs() {
    let geometry = PageGeometry::default();
    let signature = decode_signature(png_bytes(60, 20, 200)).expect("png decodes");
    let text = format!("Objet : réserves\n\n{}", mot_paragraph(800));

    let a = render_letter_with(&text, &geometry, &LetterFont::TimesRoman, Some(&signature)).expect("render");
    let b = render_letter_with(&text, &geometry, &LetterFont::TimesRoman, Some(&signature)).expect("render");
    assert_eq!(a, b);
}

#[test]
fn unreachable_signature_still_renders() {
    let options = RenderOptions {
        signature: Some(Box::new(UnreachableSignature)),
        ..Default::default()
    };
    let pdf = render_letter("Texte de la lettre.", &options).expect("render without signature");

    assert_eq!(pdf_page_count(&pdf), 1);
    assert!(!contains(&pdf, b"/XObject"));
    assert!(shows_text(&pdf, "Texte de la lettre."));
    assert!(shows_text(&pdf, SIGNATURE_CAPTION), "attribution caption missing");
}

#[test]
fn signature_url_must_be_http() {
    assert!(source_for_url(None).is_none());
    assert!(source_for_url(Some("")).is_none());
    assert!(source_for_url(Some("   ")).is_none());
    assert!(source_for_url(Some("/var/lib/signature.png")).is_none());
    assert!(source_for_url(Some("ftp://cdn.exemple.fr/signature.png")).is_none());
    assert!(source_for_url(Some("file:///tmp/signature.png")).is_none());

    let source = source_for_url(Some(" https://cdn.exemple.fr/signature.png ")).expect("https accepted");
    assert_eq!(source.describe(), "https://cdn.exemple.fr/signature.png");
    assert!(source_for_url(Some("http://localhost:8080/sig.png")).is_some());
}

#[test]
fn unset_signature_url_renders_caption_without_image() {
    let options = RenderOptions {
        signature: source_for_url(Some("signature.png")).map(|s| Box::new(s) as Box<dyn SignatureSource>),
        ..Default::default()
    };
    assert!(options.signature.is_none());

    let pdf = render_letter("Texte.", &options).expect("render");
    assert!(!contains(&pdf, b"/XObject"));
    assert!(shows_text(&pdf, SIGNATURE_CAPTION));
}

#[test]
fn undecodable_signature_is_dropped() {
    assert!(load_signature(&StaticSignature(b"<html>404</html>".to_vec())).is_none());

    let options = RenderOptions {
        signature: Some(Box::new(StaticSignature(vec![0x89, b'P', b'N', b'G', 0, 0]))),
        ..Default::default()
    };
    let pdf = render_letter("Texte.", &options).expect("render");
    assert!(!contains(&pdf, b"/XObject"));
}

#[test]
fn transparent_png_signature_is_embedded_with_soft_mask() {
    let options = RenderOptions {
        signature: Some(Box::new(StaticSignature(png_bytes(40, 12, 128)))),
        ..Default::default()
    };
    let pdf = render_letter("Texte.", &options).expect("render");

    assert!(contains(&pdf, b"/XObject"));
    assert!(contains(&pdf, b"/Im1"));
    assert!(contains(&pdf, b"/SMask"));
}

#[test]
fn opaque_png_has_no_soft_mask() {
    let img = decode_signature(png_bytes(8, 4, 255)).expect("decode");
    match img.data {
        ImageData::Rgb { rgb, alpha } => {
            assert_eq!(rgb.len(), 8 * 4 * 3);
            assert!(alpha.is_none());
        }
        ImageData::Jpeg { .. } => panic!("png decoded as jpeg"),
    }
    assert_eq!((img.pixel_width, img.pixel_height), (8, 4));
}

#[test]
fn jpeg_signature_is_passed_through() {
    let bytes = jpeg_bytes(16, 8);
    let img = decode_signature(bytes.clone()).expect("decode");
    match &img.data {
        ImageData::Jpeg { bytes: embedded, grayscale } => {
            assert_eq!(embedded, &bytes);
            assert!(!grayscale);
        }
        ImageData::Rgb { .. } => panic!("jpeg re-encoded"),
    }

    let pdf = render_letter_with("Texte.", &PageGeometry::default(), &LetterFont::TimesRoman, Some(&img))
        .expect("render");
    assert!(contains(&pdf, b"/DCTDecode"));
}

#[test]
fn missing_font_file_is_fatal() {
    let font = LetterFont::true_type("/nonexistent/fonts/Letter.ttf");
    let result = render_letter_with("Texte.", &PageGeometry::default(), &font, None);
    assert!(result.is_err());
}

#[test]
fn corrupt_font_file_is_fatal() {
    let dir = std::env::temp_dir().join(format!("reserve-letter-font-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("broken.ttf");
    std::fs::write(&path, b"not a font").expect("write");

    let result = render_letter_with("Texte.", &PageGeometry::default(), &LetterFont::true_type(&path), None);
    assert!(matches!(result, Err(reserve_letter::Error::Font(_))));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn embedded_truetype_font_renders_deterministically() {
    let Some(path) = find_system_ttf() else {
        println!("No TrueType font installed, skipping");
        return;
    };
    let font = LetterFont::true_type(&path);
    let text = "Lettre de réserves — « contestation » œuvre\n\nFin.";

    let a = render_letter_with(text, &PageGeometry::default(), &font, None).expect("render");
    let b = render_letter_with(text, &PageGeometry::default(), &font, None).expect("render");
    assert_eq!(a, b);
    assert!(contains(&a, b"/Identity-H"));
    assert!(contains(&a, b"/FontFile2"));
    assert!(!contains(&a, b"/WinAnsiEncoding"));
}
