//! Static font-metric tables for the PDF built-in Helvetica faces.
//!
//! Character widths are in em units (relative to font size), taken from the
//! standard Helvetica AFM files. PDF viewers render the built-in faces with
//! these exact advances, so centring and word-wrap computed here match the
//! printed page.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32. Accented Latin letters are measured as their
//! unaccented base letter, which has the same advance in Helvetica.

use serde::{Deserialize, Serialize};

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

/// The built-in faces used by the summary sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Table values.
    Helvetica,
    /// Headings and table labels.
    HelveticaBold,
    /// Footer date stamp. Same advances as regular Helvetica.
    HelveticaOblique,
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Geometry of one summary-sheet page, in millimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    /// Left/right margin of the table and bottom limit before a page break.
    pub margin_mm: f32,
    /// Top of the table on the first page.
    pub table_top_mm: f32,
    pub label_column_mm: f32,
    pub cell_padding_mm: f32,
    pub body_font_size_pt: f32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f32,
}

impl PageConfig {
    pub fn value_column_mm(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm - self.label_column_mm
    }

    pub fn line_height_mm(&self) -> f32 {
        self.body_font_size_pt * self.line_height_factor * MM_PER_PT
    }
}

/// A4 portrait, 14 mm side margins, 11pt body text, table starting 40 mm from the top.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 14.0,
        table_top_mm: 40.0,
        label_column_mm: 50.0,
        cell_padding_mm: 4.0,
        body_font_size_pt: 11.0,
        line_height_factor: 1.15,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family.
///
/// `widths[i]` = width of ASCII character `(i + 32)`, covering 0x20 (space) through 0x7E (~).
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub font: FontFamily,
    widths: [f32; 95],
    /// Fallback width for characters with no base-letter mapping.
    pub average_char_width: f32,
    pub space_width: f32,
    pub bullet_width: f32,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> f32 {
        if c == '•' {
            return self.bullet_width;
        }
        let base = fold_to_ascii(c);
        let code = base as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Rendered width in millimetres at `size_pt`.
    pub fn measure_mm(&self, s: &str, size_pt: f32) -> f32 {
        self.measure_str(s) * size_pt * MM_PER_PT
    }

    /// Greedy word-wrap into lines no wider than `max_width_mm`.
    ///
    /// Explicit newlines are kept. A single word wider than the line is split
    /// between characters. Returns one empty line for empty input.
    pub fn wrap_lines(&self, text: &str, max_width_mm: f32, size_pt: f32) -> Vec<String> {
        let max_em = max_width_mm / (size_pt * MM_PER_PT);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                let word_w = self.measure_str(word);
                let space_w = if current.is_empty() { 0.0 } else { self.space_width };

                if current_width + space_w + word_w <= max_em {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                    current_width += space_w + word_w;
                    continue;
                }

                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }

                if word_w <= max_em {
                    current.push_str(word);
                    current_width = word_w;
                } else {
                    for c in word.chars() {
                        let w = self.char_width(c);
                        if current_width + w > max_em && !current.is_empty() {
                            lines.push(std::mem::take(&mut current));
                            current_width = 0.0;
                        }
                        current.push(c);
                        current_width += w;
                    }
                }
            }
            lines.push(current);
        }
        lines
    }
}

/// Maps accented Latin letters to the ASCII letter with the same advance.
fn fold_to_ascii(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        '’' | '‘' => '\'',
        '\u{a0}' => ' ',
        other => other,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

/// Helvetica (regular and oblique share advances).
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Helvetica,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.52,
    space_width: 0.278,
    bullet_width: 0.350,
};

/// Helvetica-Bold.
static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::HelveticaBold,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.57,
    space_width: 0.278,
    bullet_width: 0.350,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: &FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Helvetica | FontFamily::HelveticaOblique => &HELVETICA_TABLE,
        FontFamily::HelveticaBold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
