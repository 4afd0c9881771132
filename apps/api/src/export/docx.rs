//! WordprocessingML (.docx) rendering of the summary sheet.
//!
//! The package is assembled by hand: five parts zipped with deflate.
//! Sizes are in half-points, widths and spacing in twentieths of a point.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{CellValue, ExportError, SummarySheet};

const HEADING_COLOR: &str = "2563EB";
const FOOTER_COLOR: &str = "6B7280";
const LABEL_SHADING: &str = "F3F4F6";
const LABEL_FONT: &str = "Montserrat";
const VALUE_FONT: &str = "Roboto";

const TITLE_SIZE: u32 = 48;
const SUBTITLE_SIZE: u32 = 36;
const BODY_SIZE: u32 = 28;
const FOOTER_SIZE: u32 = 20;

/// A4 text width with 1" margins.
const TABLE_WIDTH: u32 = 9026;
const LABEL_WIDTH: u32 = TABLE_WIDTH * 30 / 100;
const VALUE_WIDTH: u32 = TABLE_WIDTH - LABEL_WIDTH;
const CELL_MARGIN: u32 = 200;

const BULLET_NUM_ID: u32 = 1;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:abstractNum w:abstractNumId="0">
<w:multiLevelType w:val="singleLevel"/>
<w:lvl w:ilvl="0">
<w:start w:val="1"/>
<w:numFmt w:val="bullet"/>
<w:lvlText w:val="•"/>
<w:lvlJc w:val="left"/>
<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
</w:lvl>
</w:abstractNum>
<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
</w:numbering>"#;

/// Packages the sheet as a .docx file.
pub fn render(sheet: &SummarySheet) -> Result<Vec<u8>, ExportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let document = render_document_xml(sheet);
    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/numbering.xml", NUMBERING),
        ("word/document.xml", &document),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// The `word/document.xml` body: headings, the label/value table, the date stamp.
pub fn render_document_xml(sheet: &SummarySheet) -> String {
    let mut body = String::new();

    body.push_str(&paragraph(
        r#"<w:jc w:val="center"/>"#,
        &run(sheet.title, LABEL_FONT, TITLE_SIZE, RunStyle::heading()),
    ));
    body.push_str(&paragraph(
        r#"<w:spacing w:after="600"/><w:jc w:val="center"/>"#,
        &run(sheet.subtitle, LABEL_FONT, SUBTITLE_SIZE, RunStyle::heading()),
    ));

    body.push_str(&format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="{TABLE_WIDTH}" w:type="dxa"/><w:tblBorders>{borders}</w:tblBorders><w:tblCellMar><w:top w:w="{CELL_MARGIN}" w:type="dxa"/><w:left w:w="{CELL_MARGIN}" w:type="dxa"/><w:bottom w:w="{CELL_MARGIN}" w:type="dxa"/><w:right w:w="{CELL_MARGIN}" w:type="dxa"/></w:tblCellMar></w:tblPr><w:tblGrid><w:gridCol w:w="{LABEL_WIDTH}"/><w:gridCol w:w="{VALUE_WIDTH}"/></w:tblGrid>"#,
        borders = table_borders(),
    ));
    for row in &sheet.rows {
        let label = paragraph("", &run(row.label, LABEL_FONT, BODY_SIZE, RunStyle::bold()));
        let value = value_paragraphs(&row.value);
        body.push_str(&format!(
            r#"<w:tr><w:tc><w:tcPr><w:tcW w:w="{LABEL_WIDTH}" w:type="dxa"/><w:shd w:val="clear" w:color="auto" w:fill="{LABEL_SHADING}"/><w:vAlign w:val="center"/></w:tcPr>{label}</w:tc><w:tc><w:tcPr><w:tcW w:w="{VALUE_WIDTH}" w:type="dxa"/><w:vAlign w:val="center"/></w:tcPr>{value}</w:tc></w:tr>"#
        ));
    }
    body.push_str("</w:tbl>");

    body.push_str(&paragraph(
        r#"<w:spacing w:before="400"/><w:jc w:val="right"/>"#,
        &run(&sheet.footer, VALUE_FONT, FOOTER_SIZE, RunStyle::footer()),
    ));

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#
    )
}

/// One paragraph per line of text, so line breaks match the PDF.
fn value_paragraphs(value: &CellValue) -> String {
    let plain = |line: &str| paragraph("", &run(line, VALUE_FONT, BODY_SIZE, RunStyle::plain()));
    match value {
        CellValue::Text(text) => text.split('\n').map(plain).collect(),
        CellValue::Lines(lines) => lines.iter().flat_map(|line| line.split('\n')).map(plain).collect(),
        CellValue::Bullets(items) => items
            .iter()
            .flat_map(|item| {
                item.split('\n').enumerate().map(|(i, line)| {
                    // Continuation lines sit under the bullet text, unnumbered.
                    let properties = if i == 0 {
                        format!(
                            r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="{BULLET_NUM_ID}"/></w:numPr>"#
                        )
                    } else {
                        r#"<w:ind w:left="720"/>"#.to_string()
                    };
                    paragraph(
                        &properties,
                        &run(line, VALUE_FONT, BODY_SIZE, RunStyle::plain()),
                    )
                })
            })
            .collect(),
    }
}

fn table_borders() -> String {
    ["top", "left", "bottom", "right", "insideH", "insideV"]
        .iter()
        .map(|side| format!(r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="E2E8F0"/>"#))
        .collect()
}

#[derive(Clone, Copy)]
struct RunStyle {
    bold: bool,
    italic: bool,
    color: Option<&'static str>,
}

impl RunStyle {
    fn plain() -> Self {
        Self {
            bold: false,
            italic: false,
            color: None,
        }
    }

    fn bold() -> Self {
        Self {
            bold: true,
            ..Self::plain()
        }
    }

    fn heading() -> Self {
        Self {
            bold: true,
            italic: false,
            color: Some(HEADING_COLOR),
        }
    }

    fn footer() -> Self {
        Self {
            bold: false,
            italic: true,
            color: Some(FOOTER_COLOR),
        }
    }
}

fn paragraph(properties: &str, runs: &str) -> String {
    if properties.is_empty() {
        format!("<w:p>{runs}</w:p>")
    } else {
        format!("<w:p><w:pPr>{properties}</w:pPr>{runs}</w:p>")
    }
}

fn run(text: &str, font: &str, size: u32, style: RunStyle) -> String {
    let mut props = format!(r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#);
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if let Some(color) = style.color {
        props.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
    }
    props.push_str(&format!(r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#));
    format!(
        r#"<w:r><w:rPr>{props}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape_xml(text)
    )
}

/// Escapes markup and drops characters XML 1.0 does not allow.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
