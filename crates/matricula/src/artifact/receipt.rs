//! PDF enrollment receipt.
//!
//! [`Receipt`] holds the content of a receipt (what is printed and in which
//! order). [`Receipt::to_pdf`] lays it out on a single A4 page with `lopdf`.

use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::config::ReceiptConfig;
use crate::error::Result;
use crate::record::Record;

/// Format used for every date printed on a receipt.
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Printed in place of an absent text field.
pub const PLACEHOLDER: &str = "N/A";

/// Field labels, in print order.
pub const FIELD_LABELS: [&str; 7] = [
    "Enrollment ID",
    "Document Number",
    "Full Name",
    "Program",
    "Cohort",
    "Enrollment Date",
    "Status",
];

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 57;

const LABEL_WIDTH: i64 = 150;
const ROW_HEIGHT: i64 = 24;
const BOX_PADDING: i64 = 15;
const BOX_TOP: i64 = 690;

const REGULAR_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

/// One label/value row of the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptField {
    /// Fixed label.
    pub label: &'static str,
    /// Printed value.
    pub value: String,
}

/// Everything printed on a receipt, in print order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Page header.
    pub title: String,
    /// Heading above the field block.
    pub heading: String,
    /// Record fields.
    pub fields: Vec<ReceiptField>,
    /// Generation timestamp line.
    pub generated: String,
    /// Page footer.
    pub footer: String,
}

impl Receipt {
    /// Build the receipt content for a record.
    ///
    /// `generated_at` is the render time, not the enrollment time.
    #[must_use]
    pub fn for_record(
        record: &Record,
        config: &ReceiptConfig,
        generated_at: NaiveDateTime,
    ) -> Self {
        let or_placeholder =
            |value: &Option<String>| value.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
        let values = [
            record.id.to_string(),
            or_placeholder(&record.document_number),
            or_placeholder(&record.full_name),
            or_placeholder(&record.program),
            or_placeholder(&record.cohort),
            record.enrollment_date.format(DATE_FORMAT).to_string(),
            or_placeholder(&record.status),
        ];
        let fields = FIELD_LABELS
            .into_iter()
            .zip(values)
            .map(|(label, value)| ReceiptField { label, value })
            .collect();

        Self {
            title: config.title.clone(),
            heading: config.heading.clone(),
            fields,
            generated: format!("Generated on: {}", generated_at.format(DATE_FORMAT)),
            footer: config.footer.clone(),
        }
    }

    /// Render the receipt as a single-page PDF.
    ///
    /// # Errors
    ///
    /// Returns an error if the page content cannot be encoded or the
    /// document cannot be serialized.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font("Helvetica"));
        let bold_id = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let content = Content {
            operations: self.operations(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1_i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&self.heading)),
            "Producer" => Object::string_literal("matricula"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(lopdf::Error::from)?;
        Ok(bytes)
    }

    fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();

        centered_text(&mut ops, BOLD_FONT, 20, PAGE_HEIGHT - MARGIN, &self.title);
        centered_text(&mut ops, BOLD_FONT, 18, BOX_TOP + 30, &self.heading);

        let rows = i64::try_from(self.fields.len()).unwrap_or(i64::MAX);
        let box_height = 2 * BOX_PADDING + rows * ROW_HEIGHT;
        let box_bottom = BOX_TOP - box_height;
        ops.push(Operation::new("w", vec![Object::Integer(1)]));
        ops.push(Operation::new(
            "re",
            vec![
                Object::Integer(MARGIN),
                Object::Integer(box_bottom),
                Object::Integer(PAGE_WIDTH - 2 * MARGIN),
                Object::Integer(box_height),
            ],
        ));
        ops.push(Operation::new("S", vec![]));

        let label_x = MARGIN + BOX_PADDING;
        let mut y = BOX_TOP - BOX_PADDING - 12;
        for field in &self.fields {
            text(&mut ops, BOLD_FONT, 12, label_x, y, &format!("{}:", field.label));
            text(&mut ops, REGULAR_FONT, 12, label_x + LABEL_WIDTH, y, &field.value);
            y -= ROW_HEIGHT;
        }

        centered_text(&mut ops, REGULAR_FONT, 10, box_bottom - 40, &self.generated);
        centered_text(&mut ops, REGULAR_FONT, 10, MARGIN - 17, &self.footer);
        ops
    }
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn text(ops: &mut Vec<Operation>, font: &[u8], size: i64, x: i64, y: i64, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(win_ansi(value))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Center on the page using an average glyph width of half the font size.
fn centered_text(ops: &mut Vec<Operation>, font: &[u8], size: i64, y: i64, value: &str) {
    let chars = i64::try_from(value.chars().count()).unwrap_or(i64::MAX);
    let width = chars.saturating_mul(size) / 2;
    let x = ((PAGE_WIDTH - width) / 2).max(MARGIN);
    text(ops, font, size, x, y, value);
}

/// Encode text for the standard fonts. Characters outside Latin-1 become `?`.
fn win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample_record() -> Record {
        let mut record = Record::new("123", "Ana Ruiz", "ADSO", "2753421").with_status("Active");
        record.id = 1;
        record.enrollment_date = at(8, 5, 9);
        record
    }

    /// Collect the strings drawn with `Tj`, decoded as Latin-1.
    fn drawn_text(pdf: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .map(|op| {
                op.operands[0]
                    .as_str()
                    .unwrap()
                    .iter()
                    .map(|&b| char::from(b))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_fields_in_fixed_order() {
        let receipt = Receipt::for_record(&sample_record(), &ReceiptConfig::default(), at(10, 0, 0));

        let labels: Vec<_> = receipt.fields.iter().map(|f| f.label).collect();
        assert_eq!(labels, FIELD_LABELS);

        let values: Vec<_> = receipt.fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(
            values,
            [
                "1",
                "123",
                "Ana Ruiz",
                "ADSO",
                "2753421",
                "03/02/2025 08:05:09",
                "Active"
            ]
        );
    }

    #[test]
    fn test_generated_line_uses_render_time() {
        let receipt = Receipt::for_record(&sample_record(), &ReceiptConfig::default(), at(23, 59, 1));
        assert_eq!(receipt.generated, "Generated on: 03/02/2025 23:59:01");
    }

    #[test]
    fn test_missing_text_fields_render_placeholder() {
        let record = Record {
            id: 9,
            ..Record::default()
        };
        let receipt = Receipt::for_record(&record, &ReceiptConfig::default(), at(10, 0, 0));

        for field in &receipt.fields[1..5] {
            assert_eq!(field.value, PLACEHOLDER, "{}", field.label);
        }
        assert_eq!(receipt.fields[6].value, PLACEHOLDER);
    }

    #[test]
    fn test_header_and_footer_from_config() {
        let config = ReceiptConfig {
            title: "SISTEMA DE MATRÍCULA".to_string(),
            heading: "COMPROBANTE".to_string(),
            footer: "SENA".to_string(),
        };
        let receipt = Receipt::for_record(&sample_record(), &config, at(10, 0, 0));
        assert_eq!(receipt.title, "SISTEMA DE MATRÍCULA");
        assert_eq!(receipt.heading, "COMPROBANTE");
        assert_eq!(receipt.footer, "SENA");
    }

    #[test]
    fn test_pdf_contains_content_in_order() {
        let receipt = Receipt::for_record(&sample_record(), &ReceiptConfig::default(), at(10, 0, 0));
        let pdf = receipt.to_pdf().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));

        let drawn = drawn_text(&pdf);
        let mut expected = vec![receipt.title.clone(), receipt.heading.clone()];
        for field in &receipt.fields {
            expected.push(format!("{}:", field.label));
            expected.push(field.value.clone());
        }
        expected.push(receipt.generated.clone());
        expected.push(receipt.footer.clone());
        assert_eq!(drawn, expected);
    }

    #[test]
    fn test_pdf_keeps_latin_diacritics() {
        let mut record = sample_record();
        record.full_name = Some("José Peña (Müller)".to_string());
        let pdf = Receipt::for_record(&record, &ReceiptConfig::default(), at(10, 0, 0))
            .to_pdf()
            .unwrap();

        assert!(drawn_text(&pdf).contains(&"José Peña (Müller)".to_string()));
    }

    #[test]
    fn test_win_ansi_replaces_unsupported() {
        assert_eq!(win_ansi("Año"), vec![b'A', 0xF1, b'o']);
        assert_eq!(win_ansi("名"), b"?".to_vec());
        assert_eq!(win_ansi("a\nb"), b"a?b".to_vec());
    }
}
