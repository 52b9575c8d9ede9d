//! PDF summary reports for processed batches

use crate::aggregator::{DocumentRecord, ImageFailure};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Report written for uploaded files
pub const LOCAL_REPORT_NAME: &str = "PII_Report.pdf";
/// Report written for fetched URLs
pub const REMOTE_REPORT_NAME: &str = "Remote_PII_Report.pdf";

// Letter, in points
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN_LEFT: f32 = 30.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_TOP: f32 = 40.0;
const MARGIN_BOTTOM: f32 = 40.0;

const BODY_SIZE: f32 = 9.0;
const LEADING: f32 = 12.0;

/// Detail table columns: (x offset from the left margin, width)
const COLUMNS: [(f32, f32); 3] = [(0.0, 190.0), (195.0, 70.0), (270.0, 282.0)];

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report filename: {0}")]
    InvalidFilename(String),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build PDF: {0}")]
    Pdf(String),
}

/// Aggregate numbers shown at the top of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_images: usize,
    pub pii_detected_count: usize,
    pub pii_percentage: f64,
    pub pii_types: BTreeMap<String, usize>,
}

impl ReportSummary {
    pub fn from_records(records: &[DocumentRecord]) -> Self {
        let total_images = records.len();
        let pii_detected_count = records.iter().filter(|r| r.has_pii()).count();

        let mut pii_types = BTreeMap::new();
        for entity in records.iter().flat_map(|r| &r.entities) {
            *pii_types.entry(entity.entity_type.clone()).or_insert(0) += 1;
        }

        let pii_percentage = if total_images > 0 {
            pii_detected_count as f64 / total_images as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_images,
            pii_detected_count,
            pii_percentage,
            pii_types,
        }
    }

    /// Entity types by descending count, ties by name
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut types: Vec<(&str, usize)> =
            self.pii_types.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        types.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        types
    }
}

/// Accept only plain `*.pdf` names made of `[A-Za-z0-9._-]`
pub fn validate_filename(filename: &str) -> Result<(), ReportError> {
    let valid = filename.len() > ".pdf".len()
        && filename.ends_with(".pdf")
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ReportError::InvalidFilename(filename.to_string()))
    }
}

/// Writes Letter-size PDF reports into one directory
#[derive(Debug, Clone)]
pub struct PdfReportGenerator {
    output_dir: PathBuf,
    sequence: Arc<AtomicU64>,
}

impl PdfReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Per-batch variant of `base`, e.g. `PII_Report-20240101T120000-3.pdf`.
    /// Names never repeat within one generator.
    pub fn unique_name(&self, base: &str) -> String {
        let stem = base.strip_suffix(".pdf").unwrap_or(base);
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!(
            "{}-{}-{}.pdf",
            stem,
            chrono::Local::now().format("%Y%m%dT%H%M%S"),
            sequence
        )
    }

    /// Location of report `filename`, after validating the name
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, ReportError> {
        validate_filename(filename)?;
        Ok(self.output_dir.join(filename))
    }

    /// Render a report for `records` (and any failed images) as `filename`
    pub fn generate(
        &self,
        filename: &str,
        records: &[DocumentRecord],
        failures: &[ImageFailure],
    ) -> Result<PathBuf, ReportError> {
        let path = self.path_for(filename)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let summary = ReportSummary::from_records(records);
        let mut layout = Layout::new();
        write_summary(&mut layout, &summary);
        write_details(&mut layout, records);
        if !failures.is_empty() {
            write_failures(&mut layout, failures);
        }

        let mut doc = build_document(layout.finish())?;
        doc.compress();

        // Readers only ever see a complete file under the final name
        let partial = path.with_extension("pdf.partial");
        doc.save(&partial).map_err(|e| ReportError::Pdf(e.to_string()))?;
        std::fs::rename(&partial, &path)?;

        tracing::info!(
            "Report {} written: {} images, {} with PII",
            path.display(),
            summary.total_images,
            summary.pii_detected_count
        );

        Ok(path)
    }
}

fn write_summary(layout: &mut Layout, summary: &ReportSummary) {
    layout.heading("PII Detection Report", 18.0);
    layout.text(
        &format!(
            "Generated {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
        BODY_SIZE,
    );
    layout.gap(16.0);

    layout.heading("Overall Summary", 13.0);
    let common = summary
        .most_common()
        .iter()
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect::<Vec<_>>()
        .join(", ");
    layout.row(&[
        "Total Images Scanned",
        "",
        &summary.total_images.to_string(),
    ]);
    layout.row(&[
        "Images Containing PII",
        "",
        &format!(
            "{} ({:.2}%)",
            summary.pii_detected_count, summary.pii_percentage
        ),
    ]);
    layout.row(&[
        "Most Common PII Types",
        "",
        if common.is_empty() { "None" } else { common.as_str() },
    ]);
    layout.gap(20.0);
}

fn write_details(layout: &mut Layout, records: &[DocumentRecord]) {
    layout.heading("Detailed Results", 13.0);
    layout.header_row(&["Image Name", "PII Detected", "Detected Entities"]);

    for record in records {
        let entities = record
            .entities
            .iter()
            .map(|e| format!("{} (Score: {:.2})", e.entity_type, e.score))
            .collect::<Vec<_>>()
            .join("\n");
        layout.row(&[
            &record.image_name,
            if record.has_pii() { "Yes" } else { "No" },
            if entities.is_empty() { "None" } else { entities.as_str() },
        ]);
    }
}

fn write_failures(layout: &mut Layout, failures: &[ImageFailure]) {
    layout.gap(20.0);
    layout.heading("Images Not Processed", 13.0);
    layout.header_row(&["Image Name", "Failure", "Message"]);
    for failure in failures {
        let kind = serde_json::to_value(failure.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        layout.row(&[&failure.image_name, &kind, &failure.message]);
    }
}

/// Accumulates text operations, starting a new page when one fills up
struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM && !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN_TOP;
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn heading(&mut self, text: &str, size: f32) {
        self.ensure_space(size + LEADING * 2.0);
        self.y -= size;
        self.show("F2", size, MARGIN_LEFT, text);
        self.y -= size * 0.6;
    }

    fn text(&mut self, text: &str, size: f32) {
        let width = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        for line in wrap(text, width, size) {
            self.ensure_space(LEADING);
            self.y -= LEADING;
            self.show("F1", size, MARGIN_LEFT, &line);
        }
    }

    fn header_row(&mut self, cells: &[&str; 3]) {
        self.cells("F2", cells);
    }

    fn row(&mut self, cells: &[&str; 3]) {
        self.cells("F1", cells);
    }

    fn cells(&mut self, font: &str, cells: &[&str; 3]) {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(COLUMNS)
            .map(|(cell, (_, width))| wrap(cell, width, BODY_SIZE))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);

        self.ensure_space(lines as f32 * LEADING + 4.0);
        let top = self.y;
        for (column, cell_lines) in wrapped.iter().enumerate() {
            let x = MARGIN_LEFT + COLUMNS[column].0;
            for (i, line) in cell_lines.iter().enumerate() {
                self.y = top - LEADING * (i as f32 + 1.0);
                self.show(font, BODY_SIZE, x, line);
            }
        }
        self.y = top - lines as f32 * LEADING - 4.0;
        self.rule(self.y + 2.0);
    }

    fn show(&mut self, font: &str, size: f32, x: f32, text: &str) {
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), self.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(sanitize(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn rule(&mut self, y: f32) {
        self.current.extend([
            Operation::new("w", vec![0.5f32.into()]),
            Operation::new("m", vec![MARGIN_LEFT.into(), y.into()]),
            Operation::new("l", vec![(PAGE_WIDTH - MARGIN_RIGHT).into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn build_document(pages: Vec<Vec<Operation>>) -> Result<Document, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

/// Split text into lines that fit `width` points at `size`, honouring '\n'
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    // Helvetica averages a little over half an em per character
    let max_chars = ((width / (size * 0.55)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let split = word
                    .char_indices()
                    .nth(max_chars)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                let rest = word.split_off(split);
                lines.push(word);
                word = rest;
            }
            let needed =
                line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }

    lines
}

/// Base-14 fonts only cover Latin-1; everything else prints as '?'
fn sanitize(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::pii::PiiEntity;

    fn record(name: &str, types: &[&str]) -> DocumentRecord {
        DocumentRecord {
            image_name: name.to_string(),
            detected_text: "x".repeat(40),
            entities: types
                .iter()
                .enumerate()
                .map(|(i, t)| PiiEntity {
                    entity_type: t.to_string(),
                    start: i * 10,
                    end: i * 10 + 5,
                    score: 0.85,
                    recognizer: "test".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record("a.png", &["IND_PHONE", "IND_AADHAAR"]),
            record("b.png", &[]),
            record("c.png", &["IND_PHONE"]),
            record("d.png", &[]),
        ];
        let summary = ReportSummary::from_records(&records);

        assert_eq!(summary.total_images, 4);
        assert_eq!(summary.pii_detected_count, 2);
        assert!((summary.pii_percentage - 50.0).abs() < 1e-9);
        assert_eq!(summary.pii_types["IND_PHONE"], 2);
        assert_eq!(
            summary.most_common(),
            vec![("IND_PHONE", 2), ("IND_AADHAAR", 1)]
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = ReportSummary::from_records(&[]);
        assert_eq!(summary.total_images, 0);
        assert_eq!(summary.pii_percentage, 0.0);
    }

    #[test]
    fn test_filename_validation() {
        assert!(validate_filename("PII_Report.pdf").is_ok());
        assert!(validate_filename("scan-2024.01.pdf").is_ok());
        assert!(validate_filename("../etc/passwd.pdf").is_err());
        assert!(validate_filename("report.txt").is_err());
        assert!(validate_filename(".pdf").is_err());
        assert!(validate_filename("a b.pdf").is_err());
    }

    #[test]
    fn test_generate_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let generator = PdfReportGenerator::new(dir.path().join("reports"));

        let records: Vec<DocumentRecord> = (0..120)
            .map(|i| record(&format!("scan_{}.png", i), &["IND_PHONE", "EMAIL_ADDRESS"]))
            .collect();
        let failures = vec![ImageFailure {
            image_name: "broken.png".to_string(),
            kind: FailureKind::DecodeFailure,
            message: "Failed to decode image: bad header".to_string(),
        }];

        let path = generator
            .generate(LOCAL_REPORT_NAME, &records, &failures)
            .unwrap();
        assert_eq!(path, dir.path().join("reports").join(LOCAL_REPORT_NAME));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = Document::load(&path).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_generate_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let generator = PdfReportGenerator::new(dir.path());
        let path = generator.generate(REMOTE_REPORT_NAME, &[], &[]).unwrap();
        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_generate_rejects_bad_name() {
        let dir = tempfile::tempdir().unwrap();
        let generator = PdfReportGenerator::new(dir.path());
        assert!(matches!(
            generator.generate("../out.pdf", &[], &[]),
            Err(ReportError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_unique_names_are_valid_and_distinct() {
        let generator = PdfReportGenerator::new(".");
        let first = generator.unique_name(LOCAL_REPORT_NAME);
        let second = generator.clone().unique_name(LOCAL_REPORT_NAME);

        assert_ne!(first, second);
        assert!(first.starts_with("PII_Report-"));
        assert!(validate_filename(&first).is_ok());
        assert!(validate_filename(&second).is_ok());
    }

    #[test]
    fn test_wrap_respects_width_and_newlines() {
        let lines = wrap("IND_PHONE (Score: 0.85)\nIND_AADHAAR (Score: 0.90)", 500.0, 9.0);
        assert_eq!(lines.len(), 2);

        let long = "a".repeat(200);
        let lines = wrap(&long, 50.0, 9.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }
}
