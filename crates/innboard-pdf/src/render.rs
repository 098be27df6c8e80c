//! Template renderer: fills a static form layout with structured applicant
//! data, producing an unsigned document.
//!
//! Rendering is a pure function of its input. The renderer knows nothing
//! about signatures or attachments; it only validates required fields and
//! lays out the form. Documents are built directly with lopdf on US Letter
//! pages using the Helvetica base fonts, so no font assets ship with the
//! binary.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object};
use serde_json::Value;

use innboard_core::defaults::{PAGE_HEIGHT_PT, PAGE_MARGIN_PT, PAGE_WIDTH_PT};
use innboard_core::FormKind;

use crate::error::{PdfError, Result};

/// Result of rendering one form: the document plus its page count.
#[derive(Debug)]
pub struct RenderedForm {
    pub doc: Document,
    pub page_count: usize,
}

/// Dot-separated field paths that must be present and non-empty for a
/// form kind to render.
pub fn required_fields(kind: FormKind) -> &'static [&'static str] {
    match kind {
        FormKind::W4 => &[
            "personal_info.first_name",
            "personal_info.last_name",
            "personal_info.ssn",
            "filing_status",
        ],
        FormKind::I9 => &[
            "personal_info.first_name",
            "personal_info.last_name",
            "personal_info.date_of_birth",
            "citizenship_status",
        ],
        FormKind::DirectDeposit => &[
            "personal_info.first_name",
            "personal_info.last_name",
            "bank_name",
            "routing_number",
            "account_number",
        ],
        FormKind::HumanTrafficking | FormKind::WeaponsPolicy | FormKind::PolicyAck => &[
            "personal_info.first_name",
            "personal_info.last_name",
        ],
    }
}

/// Labeled body fields rendered for each form kind, beyond the common
/// applicant header. Absent optional values render as a blank line.
fn body_fields(kind: FormKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        FormKind::W4 => &[
            ("Social Security Number", "personal_info.ssn"),
            ("Filing Status", "filing_status"),
            ("Multiple Jobs or Spouse Works", "multiple_jobs"),
            ("Claimed Dependents Amount", "dependents_amount"),
            ("Other Income", "other_income"),
            ("Deductions", "deductions"),
            ("Extra Withholding", "extra_withholding"),
        ],
        FormKind::I9 => &[
            ("Date of Birth", "personal_info.date_of_birth"),
            ("Social Security Number", "personal_info.ssn"),
            ("Citizenship Status", "citizenship_status"),
            ("Alien Registration Number", "alien_number"),
            ("Document Title", "document_title"),
        ],
        FormKind::DirectDeposit => &[
            ("Bank Name", "bank_name"),
            ("Routing Number", "routing_number"),
            ("Account Number", "account_number"),
            ("Account Type", "account_type"),
        ],
        FormKind::HumanTrafficking | FormKind::WeaponsPolicy | FormKind::PolicyAck => &[
            ("Position", "position"),
            ("Department", "department"),
            ("Property", "property_name"),
        ],
    }
}

/// Static acknowledgment copy rendered beneath the field block.
fn acknowledgment_text(kind: FormKind) -> &'static [&'static str] {
    match kind {
        FormKind::W4 => &[
            "Under penalties of perjury, I declare that this certificate, to the best of my \
             knowledge and belief, is true, correct, and complete.",
        ],
        FormKind::I9 => &[
            "I attest, under penalty of perjury, that I am the individual identified above, and \
             that the information and documentation I have provided are complete, true, and \
             correct.",
        ],
        FormKind::DirectDeposit => &[
            "I authorize my employer to deposit my pay to the account listed above and, if \
             necessary, to withdraw funds deposited in error. This authorization remains in \
             effect until I provide written notice of cancellation.",
            "I understand that I must attach a voided check or a letter from my financial \
             institution verifying the account and routing numbers above.",
        ],
        FormKind::HumanTrafficking => &[
            "I acknowledge that I have received and reviewed the required human trafficking \
             awareness training materials, including how to recognize the signs of human \
             trafficking and how to report suspected trafficking activity occurring on hotel \
             property.",
            "I understand that reports may be made confidentially and that the company \
             prohibits retaliation against any employee who makes a good-faith report.",
        ],
        FormKind::WeaponsPolicy => &[
            "I acknowledge that the company maintains a weapons-free workplace. I understand \
             that possession of firearms or other weapons on company property, in company \
             vehicles, or while conducting company business is prohibited except where \
             expressly protected by applicable law.",
            "I understand that violation of this policy may result in disciplinary action up \
             to and including termination of employment.",
        ],
        FormKind::PolicyAck => &[
            "I acknowledge that I have received access to the employee handbook and agree to \
             read and comply with the policies it contains. I understand the handbook is not a \
             contract of employment and that policies may be revised at the company's \
             discretion.",
        ],
    }
}

/// Render a filled, unsigned form for the given kind and field data.
///
/// Fails with [`PdfError::MissingFields`] listing every absent required
/// field; otherwise always produces at least one page.
pub fn render_form(kind: FormKind, data: &Value) -> Result<RenderedForm> {
    validate_required(kind, data)?;

    let mut writer = PageWriter::new();

    writer.heading(kind.title());
    writer.gap(6.0);
    writer.line_pair("Employee", &display_name(data));
    if let Some(v) = lookup(data, "personal_info.email") {
        writer.line_pair("Email", &display_value(v));
    }
    if let Some(v) = lookup(data, "personal_info.phone") {
        writer.line_pair("Phone", &display_value(v));
    }
    writer.gap(10.0);

    for (label, path) in body_fields(kind) {
        let value = lookup(data, path).map(display_value).unwrap_or_default();
        writer.line_pair(label, &value);
    }

    writer.gap(14.0);
    for paragraph in acknowledgment_text(kind) {
        writer.paragraph(paragraph);
        writer.gap(6.0);
    }

    writer.gap(24.0);
    writer.line_pair("Employee Signature", "");
    writer.gap(18.0);
    writer.line_pair("Date", "");

    assemble(writer.finish())
}

/// Validate required fields, collecting every missing path.
pub fn validate_required(kind: FormKind, data: &Value) -> Result<()> {
    let missing: Vec<String> = required_fields(kind)
        .iter()
        .filter(|path| {
            lookup(data, path)
                .map(|v| display_value(v).trim().is_empty())
                .unwrap_or(true)
        })
        .map(|p| p.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PdfError::MissingFields(missing))
    }
}

fn display_name(data: &Value) -> String {
    let first = lookup(data, "personal_info.first_name")
        .map(display_value)
        .unwrap_or_default();
    let last = lookup(data, "personal_info.last_name")
        .map(display_value)
        .unwrap_or_default();
    format!("{first} {last}").trim().to_string()
}

/// Resolve a dot-separated path against a JSON object.
fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        _ => String::new(),
    }
}

// =============================================================================
// PAGE LAYOUT
// =============================================================================

const TITLE_SIZE: f64 = 16.0;
const BODY_SIZE: f64 = 10.0;
const LINE_HEIGHT: f64 = 15.0;
/// Rough character budget per wrapped line at BODY_SIZE Helvetica.
const WRAP_COLUMNS: usize = 92;

/// Accumulates text operations page by page, breaking when the cursor
/// reaches the bottom margin.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    cursor_y: f64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            cursor_y: PAGE_HEIGHT_PT - PAGE_MARGIN_PT - TITLE_SIZE,
        }
    }

    fn ensure_room(&mut self, needed: f64) {
        if self.cursor_y - needed < PAGE_MARGIN_PT {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor_y = PAGE_HEIGHT_PT - PAGE_MARGIN_PT - BODY_SIZE;
    }

    fn text_ops(&mut self, font: &str, size: f64, x: f64, text: &str) {
        self.current.push(Operation::new("BT", vec![]));
        self.current
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.current
            .push(Operation::new("Td", vec![x.into(), self.cursor_y.into()]));
        self.current
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.current.push(Operation::new("ET", vec![]));
    }

    fn heading(&mut self, text: &str) {
        self.ensure_room(TITLE_SIZE + LINE_HEIGHT);
        self.text_ops("F2", TITLE_SIZE, PAGE_MARGIN_PT, text);
        self.cursor_y -= TITLE_SIZE + 4.0;
    }

    /// One "Label: value ______" line; the rule fills the remaining width
    /// when the value is empty (hand-fill areas).
    fn line_pair(&mut self, label: &str, value: &str) {
        self.ensure_room(LINE_HEIGHT);
        self.text_ops("F2", BODY_SIZE, PAGE_MARGIN_PT, &format!("{label}:"));
        let body = if value.is_empty() {
            "_".repeat(40)
        } else {
            value.to_string()
        };
        self.text_ops("F1", BODY_SIZE, PAGE_MARGIN_PT + 170.0, &body);
        self.cursor_y -= LINE_HEIGHT;
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_COLUMNS) {
            self.ensure_room(LINE_HEIGHT);
            self.text_ops("F1", BODY_SIZE, PAGE_MARGIN_PT, &line);
            self.cursor_y -= LINE_HEIGHT;
        }
    }

    fn gap(&mut self, pts: f64) {
        self.cursor_y -= pts;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > columns {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Assemble accumulated page operations into a complete document.
fn assemble(pages_ops: Vec<Vec<Operation>>) -> Result<RenderedForm> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(regular_id),
            "F2" => Object::Reference(bold_id),
        },
    });

    let page_count = pages_ops.len();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for operations in pages_ops {
        let content = Content { operations };
        let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
            "MediaBox" => vec![
                0.into(),
                0.into(),
                PAGE_WIDTH_PT.into(),
                PAGE_HEIGHT_PT.into(),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    Ok(RenderedForm { doc, page_count })
}
