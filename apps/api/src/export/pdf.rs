//! A4 PDF rendering of the summary sheet with the built-in Helvetica faces.
//!
//! Layout and drawing are separate: `plan` computes every text run and cell
//! rectangle in millimetres from the top-left corner, `render` replays the
//! plan through printpdf. Wrapping uses the static metric tables, which match
//! how viewers render the built-in fonts.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use super::{ExportError, SummarySheet};
use crate::layout::font_metrics::MM_PER_PT;
use crate::layout::{get_metrics, FontFamily, PageConfig};

type Rgb8 = (u8, u8, u8);

const TITLE_COLOR: Rgb8 = (37, 99, 235);
const LABEL_TEXT: Rgb8 = (30, 41, 59);
const VALUE_TEXT: Rgb8 = (0, 0, 0);
const LABEL_FILL: Rgb8 = (243, 244, 246);
const GRID_LINE: Rgb8 = (226, 232, 240);
const FOOTER_TEXT: Rgb8 = (156, 163, 175);

const TITLE_SIZE: f32 = 18.0;
const TITLE_BASELINE_MM: f32 = 20.0;
const SUBTITLE_SIZE: f32 = 14.0;
const SUBTITLE_BASELINE_MM: f32 = 28.0;
const FOOTER_SIZE: f32 = 8.0;
const FOOTER_RIGHT_INSET_MM: f32 = 20.0;
const FOOTER_BOTTOM_INSET_MM: f32 = 10.0;
const GRID_LINE_MM: f32 = 0.1;
/// Helvetica cap height, as a fraction of the font size.
const CAP_HEIGHT: f32 = 0.718;
const LAYER_NAME: &str = "Calque 1";

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        font: FontFamily,
        size_pt: f32,
        x_mm: f32,
        /// Baseline, measured from the top edge.
        baseline_mm: f32,
        color: Rgb8,
    },
    Cell {
        x_mm: f32,
        top_mm: f32,
        width_mm: f32,
        height_mm: f32,
        fill: Option<Rgb8>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePlan {
    pub ops: Vec<DrawOp>,
}

/// Lays the sheet out on as many pages as the table needs.
///
/// A row that would cross the bottom margin moves to the next page, unless it
/// is already the first row on its page.
pub fn plan(sheet: &SummarySheet, page: &PageConfig) -> Vec<PagePlan> {
    let bold = get_metrics(&FontFamily::HelveticaBold);
    let regular = get_metrics(&FontFamily::Helvetica);
    let size = page.body_font_size_pt;
    let line_h = page.line_height_mm();
    let pad = page.cell_padding_mm;
    let label_x = page.margin_mm;
    let value_x = page.margin_mm + page.label_column_mm;
    let value_w = page.value_column_mm();
    let bottom_limit = page.height_mm - page.margin_mm;

    let mut pages = Vec::new();
    let mut ops = Vec::new();

    for (text, size_pt, baseline_mm) in [
        (sheet.title, TITLE_SIZE, TITLE_BASELINE_MM),
        (sheet.subtitle, SUBTITLE_SIZE, SUBTITLE_BASELINE_MM),
    ] {
        let width = bold.measure_mm(text, size_pt);
        ops.push(DrawOp::Text {
            text: text.to_string(),
            font: FontFamily::HelveticaBold,
            size_pt,
            x_mm: (page.width_mm - width) / 2.0,
            baseline_mm,
            color: TITLE_COLOR,
        });
    }

    let mut y = page.table_top_mm;
    let mut rows_on_page = 0usize;

    for row in &sheet.rows {
        let label_lines = bold.wrap_lines(row.label, page.label_column_mm - 2.0 * pad, size);
        let value_lines: Vec<String> = row
            .value
            .lines()
            .iter()
            .flat_map(|line| regular.wrap_lines(line, value_w - 2.0 * pad, size))
            .collect();
        let text_lines = label_lines.len().max(value_lines.len());
        let row_h = text_lines as f32 * line_h + 2.0 * pad;

        if y + row_h > bottom_limit && rows_on_page > 0 {
            pages.push(PagePlan {
                ops: std::mem::take(&mut ops),
            });
            y = page.margin_mm;
            rows_on_page = 0;
        }

        ops.push(DrawOp::Cell {
            x_mm: label_x,
            top_mm: y,
            width_mm: page.label_column_mm,
            height_mm: row_h,
            fill: Some(LABEL_FILL),
        });
        ops.push(DrawOp::Cell {
            x_mm: value_x,
            top_mm: y,
            width_mm: value_w,
            height_mm: row_h,
            fill: None,
        });

        let cells = [
            (label_lines, FontFamily::HelveticaBold, label_x, LABEL_TEXT),
            (value_lines, FontFamily::Helvetica, value_x, VALUE_TEXT),
        ];
        for (lines, font, x, rgb) in cells {
            // Vertically centred in the row.
            let block_h = lines.len() as f32 * line_h;
            let first_top = y + (row_h - block_h) / 2.0;
            for (i, line) in lines.into_iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                ops.push(DrawOp::Text {
                    text: line,
                    font,
                    size_pt: size,
                    x_mm: x + pad,
                    baseline_mm: first_top + i as f32 * line_h + baseline_offset(size, line_h),
                    color: rgb,
                });
            }
        }

        y += row_h;
        rows_on_page += 1;
    }

    let footer_w = get_metrics(&FontFamily::HelveticaOblique).measure_mm(&sheet.footer, FOOTER_SIZE);
    ops.push(DrawOp::Text {
        text: sheet.footer.clone(),
        font: FontFamily::HelveticaOblique,
        size_pt: FOOTER_SIZE,
        x_mm: page.width_mm - FOOTER_RIGHT_INSET_MM - footer_w,
        baseline_mm: page.height_mm - FOOTER_BOTTOM_INSET_MM,
        color: FOOTER_TEXT,
    });
    pages.push(PagePlan { ops });

    pages
}

/// Distance from the top of a line box to its baseline.
fn baseline_offset(size_pt: f32, line_h: f32) -> f32 {
    let cap = size_pt * MM_PER_PT * CAP_HEIGHT;
    (line_h + cap) / 2.0
}

fn color(rgb: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(rgb.0) / 255.0,
        f32::from(rgb.1) / 255.0,
        f32::from(rgb.2) / 255.0,
        None,
    ))
}

fn pdf_error(e: printpdf::Error) -> ExportError {
    ExportError::Pdf(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: FontFamily) -> &IndirectFontRef {
        match font {
            FontFamily::Helvetica => &self.regular,
            FontFamily::HelveticaBold => &self.bold,
            FontFamily::HelveticaOblique => &self.oblique,
        }
    }
}

/// Renders the sheet to PDF bytes.
pub fn render(sheet: &SummarySheet, page: &PageConfig) -> Result<Vec<u8>, ExportError> {
    let pages = plan(sheet, page);
    let (w, h) = (Mm(page.width_mm), Mm(page.height_mm));

    let (doc, first_page, first_layer) = PdfDocument::new(sheet.title, w, h, LAYER_NAME);
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_error)?,
    };

    for (i, page_plan) in pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(w, h, LAYER_NAME)
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        draw_page(&layer, page_plan, &fonts, page.height_mm);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn draw_page(layer: &PdfLayerReference, page_plan: &PagePlan, fonts: &Fonts, page_h: f32) {
    layer.set_outline_color(color(GRID_LINE));
    layer.set_outline_thickness(GRID_LINE_MM / MM_PER_PT);

    for op in &page_plan.ops {
        match op {
            DrawOp::Cell {
                x_mm,
                top_mm,
                width_mm,
                height_mm,
                fill,
            } => {
                let rect = Rect::new(
                    Mm(*x_mm),
                    Mm(page_h - top_mm - height_mm),
                    Mm(x_mm + width_mm),
                    Mm(page_h - top_mm),
                );
                let rect = match fill {
                    Some(rgb) => {
                        layer.set_fill_color(color(*rgb));
                        rect.with_mode(PaintMode::FillStroke)
                    }
                    None => rect.with_mode(PaintMode::Stroke),
                };
                layer.add_rect(rect);
            }
            DrawOp::Text {
                text,
                font,
                size_pt,
                x_mm,
                baseline_mm,
                color: rgb,
            } => {
                layer.set_fill_color(color(*rgb));
                layer.use_text(
                    text.as_str(),
                    *size_pt,
                    Mm(*x_mm),
                    Mm(page_h - baseline_mm),
                    fonts.get(*font),
                );
            }
        }
    }
}
