//! Text the built-in PDF fonts can show.
//!
//! The standard Helvetica faces are encoded as WinAnsi (Windows-1252); any
//! character outside that set would be dropped from the page. `to_win_ansi`
//! folds such characters to their closest WinAnsi form instead.

/// Characters 0x80..0x9F of Windows-1252.
const WIN_ANSI_EXTRAS: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Base letters for Latin Extended-A, U+0100..=U+017F.
#[rustfmt::skip]
const LATIN_EXTENDED_A: [&str; 8] = [
    "AaAaAaCcCcCcCcDd",
    "DdEeEeEeEeEeGgGg",
    "GgGgHhHhIiIiIiIi",
    "IiIiJjKkkLlLlLlL",
    "lLlNnNnNnnNnOoOo",
    "OoOoRrRrRrSsSsSs",
    "SsTtTtTtUuUuUuUu",
    "UuUuWwYyYZzZzZzs",
];

pub fn is_win_ansi(c: char) -> bool {
    matches!(c, '\n' | ' '..='~' | '\u{A0}'..='\u{FF}') || WIN_ANSI_EXTRAS.contains(c)
}

/// Rewrites `text` so every character is encodable in WinAnsi.
///
/// Newlines are kept. Other control characters become spaces. Letters with
/// diacritics outside Latin-1 lose the diacritic, typographic variants map to
/// their plain form, and anything else becomes `?`. Zero-width characters are
/// removed.
pub fn to_win_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if is_win_ansi(c) => out.push(c),
            c if c.is_control() => out.push(' '),
            '\u{132}' => out.push_str("IJ"),
            '\u{133}' => out.push_str("ij"),
            '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' => {}
            c if c.is_whitespace() => out.push(' '),
            other => out.push(fold(other)),
        }
    }
    out
}

fn fold(c: char) -> char {
    let code = u32::from(c);
    match c {
        '\u{100}'..='\u{17F}' => {
            let offset = (code - 0x100) as usize;
            LATIN_EXTENDED_A[offset / 16]
                .chars()
                .nth(offset % 16)
                .unwrap_or('?')
        }
        '\u{1A0}' => 'O',
        '\u{1A1}' => 'o',
        '\u{1AF}' => 'U',
        '\u{1B0}' => 'u',
        '\u{218}' => 'S',
        '\u{219}' => 's',
        '\u{21A}' => 'T',
        '\u{21B}' => 't',
        // Vietnamese: upper case on even code points.
        '\u{1EA0}'..='\u{1EB7}' => by_parity(code, 'A'),
        '\u{1EB8}'..='\u{1EC7}' => by_parity(code, 'E'),
        '\u{1EC8}'..='\u{1ECB}' => by_parity(code, 'I'),
        '\u{1ECC}'..='\u{1EE3}' => by_parity(code, 'O'),
        '\u{1EE4}'..='\u{1EF1}' => by_parity(code, 'U'),
        '\u{1EF2}'..='\u{1EF9}' => by_parity(code, 'Y'),
        '\u{2010}'..='\u{2012}' | '\u{2212}' => '-',
        '\u{2015}' => '—',
        '\u{201B}' | '\u{2032}' => '\'',
        '\u{201F}' | '\u{2033}' => '"',
        _ => '?',
    }
}

fn by_parity(code: u32, upper: char) -> char {
    if code % 2 == 0 {
        upper
    } else {
        upper.to_ascii_lowercase()
    }
}
