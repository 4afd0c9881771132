//! Document exporters: the finished records rendered as a Word or PDF summary sheet.
//!
//! Both formats render from one `SummarySheet`, so labels, row order and text
//! are identical whichever format the student downloads. Rendering is pure:
//! the generation date is passed in rather than read from the clock.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use bytes::Bytes;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::{to_win_ansi, PageConfig};
use crate::models::{ProjectInfo, StudentInfo};

pub mod docx;
pub mod pdf;

pub const TITLE: &str = "Fiche de renseignements sujet de mémoire";
pub const SUBTITLE: &str = "Cours Méthodologie de Recherche";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid horizontal space regex"));

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("DOCX packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported export format '{0}' (expected docx or pdf)")]
pub struct UnsupportedFormat(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Ok(ExportFormat::Docx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// `Synthese_<LastName>_<FirstName>.<ext>`, whitespace runs in each name replaced by `_`.
pub fn export_filename(student: &StudentInfo, format: ExportFormat) -> String {
    format!(
        "Synthese_{}_{}.{}",
        WHITESPACE_RUN.replace_all(&student.last_name, "_"),
        WHITESPACE_RUN.replace_all(&student.first_name, "_"),
        format.extension()
    )
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name (RFC 6266).
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

// ────────────────────────────────────────────────────────────────────────────
// Summary sheet
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    /// Separate lines, no markers.
    Lines(Vec<String>),
    Bullets(Vec<String>),
}

impl CellValue {
    /// The cell as plain lines, bullets prefixed with `•`.
    pub fn lines(&self) -> Vec<String> {
        match self {
            CellValue::Text(text) => vec![text.clone()],
            CellValue::Lines(lines) => lines.clone(),
            CellValue::Bullets(items) => items.iter().map(|item| format!("• {item}")).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: CellValue,
}

/// Format-independent content of the exported sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySheet {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub rows: Vec<SummaryRow>,
    pub footer: String,
}

/// User text as it appears on the sheet.
///
/// Folded to what the PDF fonts can encode, so both formats carry the same
/// characters. Lines are trimmed and runs of spaces collapse to one, which is
/// how the PDF wraps them; the line breaks themselves are kept.
pub fn sheet_text(raw: &str) -> String {
    to_win_ansi(raw)
        .split('\n')
        .map(|line| HORIZONTAL_SPACE.replace_all(line.trim(), " "))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_sheet(student: &StudentInfo, project: &ProjectInfo, date: NaiveDate) -> SummarySheet {
    let rows = vec![
        SummaryRow {
            label: "Nom et Prénom",
            value: CellValue::Text(sheet_text(&student.display_name())),
        },
        SummaryRow {
            label: "Filière",
            value: CellValue::Text(sheet_text(&student.major)),
        },
        SummaryRow {
            label: "Contact",
            value: CellValue::Lines(vec![
                format!("Email: {}", sheet_text(&student.email)),
                format!("Tél: {}", sheet_text(&student.phone)),
            ]),
        },
        SummaryRow {
            label: "Sujet du Mémoire",
            value: CellValue::Text(sheet_text(&project.topic)),
        },
        SummaryRow {
            label: "Objectif Général",
            value: CellValue::Text(sheet_text(&project.general_objective)),
        },
        SummaryRow {
            label: "Objectifs Spécifiques",
            value: CellValue::Bullets(
                project
                    .specific_objectives
                    .iter()
                    .map(|objective| sheet_text(objective))
                    .collect(),
            ),
        },
    ];

    SummarySheet {
        title: TITLE,
        subtitle: SUBTITLE,
        rows,
        footer: format!("Généré le {}", date.format("%d/%m/%Y")),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Export entry point
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Bytes,
}

impl ExportedDocument {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Renders the records in `format`. Blocking; call from `spawn_blocking`.
pub fn export_document(
    student: &StudentInfo,
    project: &ProjectInfo,
    format: ExportFormat,
    date: NaiveDate,
    page: &PageConfig,
) -> Result<ExportedDocument, ExportError> {
    let sheet = build_sheet(student, project, date);
    let bytes = match format {
        ExportFormat::Docx => docx::render(&sheet)?,
        ExportFormat::Pdf => pdf::render(&sheet, page)?,
    };
    let filename = export_filename(student, format);
    debug!(%filename, size = bytes.len(), "Document rendered");

    Ok(ExportedDocument {
        format,
        filename,
        bytes: Bytes::from(bytes),
    })
}

/// Copies the document into `dir`. Written to a temp file first and renamed
/// into place, so a failure never leaves a partial file under the final name.
pub fn archive(dir: &Path, document: &ExportedDocument) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&document.bytes)?;
    tmp.as_file().sync_all()?;
    let target = dir.join(&document.filename);
    tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
    info!(path = %target.display(), "Export archived");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{project, student};
    use super::*;
    use crate::layout::default_page_config;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_filename_pattern() {
        assert_eq!(
            export_filename(&student(), ExportFormat::Docx),
            "Synthese_Dupont_Jean.docx"
        );
        assert_eq!(
            export_filename(&student(), ExportFormat::Pdf),
            "Synthese_Dupont_Jean.pdf"
        );
    }

    #[test]
    fn test_filename_replaces_whitespace_runs() {
        let mut s = student();
        s.last_name = "De La  Fontaine".to_string();
        s.first_name = "Marie\tClaire".to_string();
        assert_eq!(
            export_filename(&s, ExportFormat::Pdf),
            "Synthese_De_La_Fontaine_Marie_Claire.pdf"
        );
    }

    #[test]
    fn test_content_disposition_ascii_name() {
        assert_eq!(
            content_disposition("Synthese_Dupont_Jean.pdf"),
            "attachment; filename=\"Synthese_Dupont_Jean.pdf\"; filename*=UTF-8''Synthese_Dupont_Jean.pdf"
        );
    }

    #[test]
    fn test_content_disposition_accented_name() {
        let header = content_disposition("Synthese_Lefèvre_Éloïse.docx");
        assert!(header.contains("filename=\"Synthese_Lef_vre__lo_se.docx\""));
        assert!(header.ends_with("filename*=UTF-8''Synthese_Lef%C3%A8vre_%C3%89lo%C3%AFse.docx"));
        assert!(header.is_ascii());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("docx".parse::<ExportFormat>(), Ok(ExportFormat::Docx));
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!(
            "odt".parse::<ExportFormat>(),
            Err(UnsupportedFormat("odt".to_string()))
        );
    }

    #[test]
    fn test_sheet_rows_in_fixed_order() {
        let sheet = build_sheet(&student(), &project(), date());
        let labels: Vec<_> = sheet.rows.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                "Nom et Prénom",
                "Filière",
                "Contact",
                "Sujet du Mémoire",
                "Objectif Général",
                "Objectifs Spécifiques"
            ]
        );
        assert_eq!(sheet.rows[0].value, CellValue::Text("DUPONT Jean".to_string()));
        assert_eq!(
            sheet.rows[2].value.lines(),
            vec!["Email: jean.dupont@exemple.fr", "Tél: +33 6 12 34 56 78"]
        );
    }

    #[test]
    fn test_objectives_are_three_bullets() {
        let sheet = build_sheet(&student(), &project(), date());
        match &sheet.rows[5].value {
            CellValue::Bullets(items) => assert_eq!(items.len(), 3),
            other => panic!("expected bullets, got {other:?}"),
        }
        assert_eq!(sheet.rows[5].value.lines()[0], "• Recenser les usages actuels");
    }

    #[test]
    fn test_footer_uses_french_date() {
        let sheet = build_sheet(&student(), &project(), date());
        assert_eq!(sheet.footer, "Généré le 07/03/2026");
        assert_eq!(sheet.title, TITLE);
        assert_eq!(sheet.subtitle, SUBTITLE);
    }

    #[test]
    fn test_sheet_text_is_printable_with_pdf_fonts() {
        let mut s = student();
        s.last_name = "Łukasiewicz".to_string();
        s.first_name = "Nguyễn".to_string();
        let mut p = project();
        p.general_objective = "Objectif\u{000C}copié depuis un PDF".to_string();
        let sheet = build_sheet(&s, &p, date());

        assert_eq!(sheet.rows[0].value, CellValue::Text("LUKASIEWICZ Nguyen".to_string()));
        assert_eq!(
            sheet.rows[4].value,
            CellValue::Text("Objectif copié depuis un PDF".to_string())
        );
        for row in &sheet.rows {
            for line in row.value.lines() {
                assert!(line.chars().all(crate::layout::charset::is_win_ansi), "{line:?}");
            }
        }
    }

    #[test]
    fn test_sheet_text_keeps_line_breaks_and_collapses_spaces() {
        assert_eq!(sheet_text("  Ligne un \r\n\tLigne   deux  "), "Ligne un\nLigne deux");
        assert_eq!(sheet_text("Mise en œuvre"), "Mise en œuvre");
    }

    #[test]
    fn test_export_document_both_formats() {
        let page = default_page_config();
        let docx = export_document(&student(), &project(), ExportFormat::Docx, date(), &page)
            .unwrap();
        assert!(docx.bytes.starts_with(b"PK"));
        assert_eq!(docx.filename, "Synthese_Dupont_Jean.docx");

        let pdf =
            export_document(&student(), &project(), ExportFormat::Pdf, date(), &page).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert_eq!(pdf.content_type(), "application/pdf");
    }

    #[test]
    fn test_archive_writes_final_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ExportedDocument {
            format: ExportFormat::Pdf,
            filename: "Synthese_Dupont_Jean.pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.3 test"),
        };
        archive(dir.path(), &doc).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("Synthese_Dupont_Jean.pdf")]);
        assert_eq!(
            std::fs::read(dir.path().join("Synthese_Dupont_Jean.pdf")).unwrap(),
            b"%PDF-1.3 test"
        );
    }
}
