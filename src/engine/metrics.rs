//! Text measurement for the builtin Helvetica faces.
//!
//! Widths come from the standard Helvetica / Helvetica-Bold AFM tables
//! (units per 1000 em) for printable ASCII. Oblique faces share the upright
//! widths. Anything outside ASCII is measured as a digit-width glyph.

const FIRST: u32 = 0x20;

#[rustfmt::skip]
const REGULAR: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK: u16 = 556;

/// Ascender height as a fraction of the font size.
pub const ASCENT: f32 = 0.718;

fn glyph_width(c: char, bold: bool) -> u16 {
    let table = if bold { &BOLD } else { &REGULAR };
    let code = c as u32;
    if c == '\u{00A0}' {
        return table[0];
    }
    code.checked_sub(FIRST)
        .and_then(|i| table.get(i as usize))
        .copied()
        .unwrap_or(FALLBACK)
}

/// Advance of every Courier glyph as a fraction of the font size.
pub const MONO_ADVANCE: f32 = 0.6;

/// Width of `text` in points at `font_size`.
pub fn text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c, bold))).sum();
    units as f32 * font_size / 1000.0
}

/// Width of `text` set in Courier.
pub fn mono_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * MONO_ADVANCE * font_size
}

/// Split a single word into pieces no wider than `max_width`. Every piece
/// holds at least one character.
pub fn split_to_width(word: &str, font_size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0;
    for c in word.chars() {
        let w = f32::from(glyph_width(c, bold)) * font_size / 1000.0;
        if width + w > max_width && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn afm_widths() {
        // H e l l o = 722 + 556 + 222 + 222 + 556 = 2278
        assert!((text_width("Hello", 10.0, false) - 22.78).abs() < 0.001);
        assert!(text_width("Hello", 10.0, true) > text_width("Hello", 10.0, false));
        assert_eq!(text_width("é", 10.0, false), 5.56);
    }

    #[test]
    fn long_words_are_split() {
        let word = "x".repeat(200);
        let pieces = split_to_width(&word, 12.0, false, 100.0);
        assert!(pieces.len() > 1);
        assert_eq!(pieces.concat(), word);
        assert!(pieces.iter().all(|l| text_width(l, 12.0, false) <= 100.0));
    }

    #[test]
    fn narrow_limit_still_makes_progress() {
        assert_eq!(split_to_width("ab", 12.0, false, 1.0), vec!["a", "b"]);
        assert!((mono_width("abcd", 10.0) - 24.0).abs() < 0.001);
    }
}
