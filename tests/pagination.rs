mod common;

use common::{approx, body_texts, body_words, mot_paragraph};
use reserve_letter::{FontMetrics, LineKind, PageGeometry, layout_letter, wrap_paragraph};

fn lay_out(text: &str, with_image: bool) -> reserve_letter::LetterLayout {
    layout_letter(text, &PageGeometry::default(), &FontMetrics::times_roman(), with_image)
}

const LOREM: &str = "Madame, Monsieur,\n\
Par la présente, nous émettons des réserves motivées sur le caractère professionnel de l'accident déclaré le 12 mars par notre salarié, survenu selon ses dires sur le parking de l'établissement en dehors de ses horaires de travail habituels.\n\
\n\
Aucun témoin n'a assisté aux faits, et la déclaration ne mentionne aucune lésion constatée immédiatement. Nous sollicitons en conséquence l'ouverture d'une instruction contradictoire.\n\
Veuillez agréer, Madame, Monsieur, l'expression de nos salutations distinguées.";

#[test]
fn short_letter_fits_on_one_page() {
    let geometry = PageGeometry::default();
    let layout = lay_out("Bonjour.\n\nCeci est un test.", true);

    assert_eq!(layout.page_count(), 1);
    assert_eq!(body_texts(&layout), vec!["Bonjour.", "Ceci est un test."]);

    let lines: Vec<_> = layout.pages[0].body_lines().collect();
    assert!(approx(lines[0].y, geometry.top()));
    // one line advance plus one blank-line gap
    assert!(approx(lines[0].y - lines[1].y, 2.0 * geometry.line_height));
    assert!(approx(lines[0].x, geometry.margin));

    let img = layout.pages[0].image.expect("signature placed");
    let cursor = lines[1].y - geometry.line_height - 2.0 * geometry.line_height;
    assert!(approx(img.y, cursor - geometry.signature_drop));
    assert!(approx(img.width, 150.0) && approx(img.height, 50.0));

    let caption = layout.caption().expect("caption");
    assert_eq!(caption.text, reserve_letter::SIGNATURE_CAPTION);
    assert!(approx(caption.y, cursor - geometry.caption_drop));
    assert_eq!(caption.font_size, 9.0);
}

#[test]
fn lines_never_exceed_content_width() {
    let geometry = PageGeometry::default();
    let metrics = FontMetrics::times_roman();
    let text = format!("{LOREM}\n{}", LOREM.replace('\n', " ").repeat(6));
    let layout = layout_letter(&text, &geometry, &metrics, false);

    for line in layout.pages.iter().flat_map(|p| p.body_lines()) {
        assert!(
            line.width <= geometry.max_content_width(),
            "line too wide ({}): {}",
            line.width,
            line.text
        );
        let measured = metrics.text_width(&line.text, geometry.font_size);
        assert!((measured - line.width).abs() < 0.05, "{measured} vs {}", line.width);
    }
}

#[test]
fn words_are_preserved_in_order() {
    let text = format!("{LOREM}\n\n{}\n  indentation   et   espaces  ", mot_paragraph(120));
    let layout = lay_out(&text, true);

    let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    assert_eq!(body_words(&layout), expected);
}

#[test]
fn greedy_wrap_fills_lines() {
    let geometry = PageGeometry::default();
    let metrics = FontMetrics::times_roman();
    let lines = wrap_paragraph(&mot_paragraph(500), &metrics, geometry.font_size, geometry.max_content_width());

    // "mot" is 17.116pt and a space 2.75pt at 11pt: 25 words per line
    assert_eq!(lines.len(), 20);
    assert!(lines.iter().all(|l| l.text.split(' ').count() == 25));

    // adding the next word to any full line would overflow
    let space = metrics.space_width(geometry.font_size);
    let word = metrics.text_width("mot", geometry.font_size);
    for line in &lines[..lines.len() - 1] {
        assert!(line.width + space + word > geometry.max_content_width());
    }
}

#[test]
fn blank_lines_leave_a_gap_without_text() {
    let geometry = PageGeometry::default();
    let layout = lay_out("Premier\n\n\nSecond\n   \nTroisième", false);

    let lines: Vec<_> = layout.pages[0].body_lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| !l.text.trim().is_empty()));
    assert!(approx(lines[0].y - lines[1].y, 3.0 * geometry.line_height));
    // whitespace-only paragraph counts as blank
    assert!(approx(lines[1].y - lines[2].y, 2.0 * geometry.line_height));
}

#[test]
fn long_paragraph_respects_bottom_threshold() {
    let geometry = PageGeometry::default();
    let threshold = geometry.margin + geometry.body_break_threshold;
    let text = mot_paragraph(500);
    let layout = lay_out(&text, true);

    assert_eq!(body_words(&layout).len(), 500);
    for (i, page) in layout.pages.iter().enumerate() {
        let lines: Vec<_> = page.body_lines().collect();
        for line in &lines {
            assert!(line.y >= threshold, "page {i}: line at {} below threshold", line.y);
        }
        if i > 0 && !lines.is_empty() {
            assert!(approx(lines[0].y, geometry.top()));
        }
    }
}

#[test]
fn very_long_paragraph_spans_several_pages() {
    let geometry = PageGeometry::default();
    let threshold = geometry.margin + geometry.body_break_threshold;
    let layout = lay_out(&mot_paragraph(3000), false);

    // 120 lines at 46 lines per page
    assert_eq!(layout.page_count(), 3);
    assert_eq!(body_words(&layout).len(), 3000);

    for pair in layout.pages.windows(2) {
        let last = pair[0].body_lines().last().expect("full page");
        let first = pair[1].body_lines().next().expect("continued page");
        assert!(last.y >= threshold);
        // the break happened because the next line would have crossed the threshold
        assert!(last.y - geometry.line_height < threshold);
        assert!(approx(first.y, geometry.top()));
    }
    assert_eq!(layout.pages[0].body_lines().count(), 46);
}

#[test]
fn empty_letter_has_only_the_signature_block() {
    let geometry = PageGeometry::default();
    let layout = lay_out("", true);

    assert_eq!(layout.page_count(), 1);
    assert!(body_texts(&layout).is_empty());
    assert!(layout.pages[0].image.is_some());

    // the single empty paragraph advances one line, then the signature gap
    let caption = layout.caption().expect("caption");
    let expected = geometry.top() - 3.0 * geometry.line_height - geometry.caption_drop;
    assert!(approx(caption.y, expected));
}

#[test]
fn overlong_word_sits_alone_and_is_not_split() {
    let word = "a".repeat(150);
    let text = format!("avant {word} après");
    let layout = lay_out(&text, false);

    assert_eq!(body_texts(&layout), vec!["avant".to_string(), word.clone(), "après".to_string()]);
    let wide = layout.pages[0].body_lines().nth(1).expect("long line");
    assert!(wide.width > PageGeometry::default().max_content_width());
}

#[test]
fn signature_image_moves_to_next_page_when_short_of_room() {
    let geometry = PageGeometry::default();

    // 45 one-line paragraphs leave the cursor at 133.89 after the gap: image fits
    let text = vec!["ligne"; 45].join("\n");
    let layout = lay_out(&text, true);
    assert_eq!(layout.page_count(), 1);
    assert!(layout.pages[0].image.is_some());

    // 46 leave it at 119.89, under the 130 signature threshold
    let text = vec!["ligne"; 46].join("\n");
    let layout = lay_out(&text, true);
    assert_eq!(layout.page_count(), 2);
    assert!(layout.pages[0].image.is_none());
    let img = layout.pages[1].image.expect("image on second page");
    assert!(approx(img.y, geometry.top() - geometry.signature_drop));
    assert_eq!(layout.pages[1].body_lines().count(), 0);

    let caption = layout.pages[1]
        .lines
        .iter()
        .find(|l| l.kind == LineKind::Caption)
        .expect("caption follows image");
    assert!(approx(caption.y, geometry.top() - geometry.caption_drop));
}

#[test]
fn caption_breaks_page_instead_of_entering_margin() {
    let geometry = PageGeometry::default();
    let text = vec!["ligne"; 46].join("\n");
    let layout = lay_out(&text, false);

    assert_eq!(layout.page_count(), 2);
    let caption = layout.caption().expect("caption");
    assert!(approx(caption.y, geometry.top()));
    assert!(layout.pages[1].lines.iter().all(|l| l.kind == LineKind::Caption));
}

#[test]
fn blank_paragraphs_do_not_check_for_page_breaks() {
    let geometry = PageGeometry::default();
    let text = "\n".repeat(60) + "fin";
    let layout = lay_out(&text, false);

    // 60 blank steps push the cursor off the page; only the text line breaks
    assert_eq!(layout.pages[0].lines.len(), 0);
    let line = layout.pages[1].body_lines().next().expect("text on page 2");
    assert_eq!(line.text, "fin");
    assert!(approx(line.y, geometry.top()));
}

#[test]
fn layout_is_deterministic() {
    let a = lay_out(LOREM, true);
    let b = lay_out(LOREM, true);
    assert_eq!(a, b);
}

#[test]
fn non_breaking_space_is_kept_inside_words() {
    let geometry = PageGeometry::default();
    let metrics = FontMetrics::times_roman();

    let lines = wrap_paragraph("Objet\u{a0}: réserves", &metrics, geometry.font_size, geometry.max_content_width());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "Objet\u{a0}: réserves");

    // the filler leaves room for "Objet" (492.05pt) but not for "Objet\u{a0}:"
    // (497.86pt), so the pair moves down together instead of stranding the colon
    let text = format!("{}le Objet\u{a0}: réserves", "mot ".repeat(23));
    let lines = wrap_paragraph(&text, &metrics, geometry.font_size, geometry.max_content_width());
    assert_eq!(lines.len(), 2);
    assert!(lines[0].text.ends_with(" le"));
    assert_eq!(lines[1].text, "Objet\u{a0}: réserves");
}

#[test]
fn nbsp_only_paragraph_counts_as_blank() {
    let geometry = PageGeometry::default();
    let layout = lay_out("avant\n\u{a0}\napres", false);

    let lines: Vec<_> = layout.pages[0].body_lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(approx(lines[0].y - lines[1].y, 2.0 * geometry.line_height));
}
