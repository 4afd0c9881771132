// PDF layout support: static Helvetica metrics used to centre headings and
// word-wrap table cells on the summary sheet, and the WinAnsi fold that keeps
// text printable with those fonts.

pub mod charset;
pub mod font_metrics;

pub use charset::to_win_ansi;
pub use font_metrics::{default_page_config, get_metrics, FontFamily, PageConfig};
