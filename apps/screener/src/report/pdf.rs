//! Downloadable PDF evaluation report.
//!
//! Same header block and feedback layout as the HTML page, set in the
//! built-in Helvetica faces on A4 pages. Built directly with `lopdf`, the
//! PDF object layer `pdf-extract` reads resumes with.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::errors::AppError;
use crate::report::{classify_feedback, metadata_rows, FeedbackLine, ScreeningReport};

// A4 in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const LINE_SPACING: f32 = 1.4;
/// Average Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.52;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

pub fn render_pdf(report: &ScreeningReport) -> Result<Vec<u8>, AppError> {
    let pages = layout(report);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(builtin_font("Helvetica"));
    let bold_id = doc.add_object(builtin_font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }.encode().map_err(pdf_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| pdf_error(e.into()))?;
    Ok(bytes)
}

fn builtin_font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn pdf_error(e: lopdf::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("Failed to write PDF report: {e}"))
}

/// Content stream operations for each page, in order.
fn layout(report: &ScreeningReport) -> Vec<Vec<Operation>> {
    let mut writer = PageWriter::new();

    writer.paragraph("Resume Evaluation Report", BOLD, TITLE_SIZE);
    writer.gap(BODY_SIZE);

    for row in metadata_rows(report) {
        writer.paragraph(&format!("{}: {}", row.label, row.value), REGULAR, BODY_SIZE);
    }
    writer.gap(BODY_SIZE);

    for (kind, line) in classify_feedback(&report.feedback) {
        let line = line.replace("**", "");
        match kind {
            FeedbackLine::Score => writer.paragraph(&line, BOLD, HEADING_SIZE),
            FeedbackLine::Heading => {
                writer.gap(BODY_SIZE / 2.0);
                writer.paragraph(&line, BOLD, HEADING_SIZE);
            }
            FeedbackLine::Body => writer.paragraph(&line, REGULAR, BODY_SIZE),
        }
    }

    writer.finish()
}

/// Top-down line placement with page breaks at the bottom margin.
struct PageWriter {
    finished: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn paragraph(&mut self, text: &str, font: &str, size: f32) {
        let text = to_win_ansi(text);
        for line in wrap(&text, max_chars(size)) {
            self.line(&line, font, size);
        }
    }

    fn line(&mut self, text: &str, font: &str, size: f32) {
        let advance = size * LINE_SPACING;
        if self.y - advance < MARGIN {
            self.finished.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= advance;

        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![MARGIN.into(), self.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(latin1_bytes(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.finished.push(self.current);
        self.finished
    }
}

fn max_chars(size: f32) -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (size * AVG_GLYPH_WIDTH)) as usize
}

/// Keeps what the standard Type1 faces can draw: printable ASCII and Latin-1.
/// Common typographic marks are folded to ASCII; everything else (emoji) is dropped.
fn to_win_ansi(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '—' | '–' | '•' => Some('-'),
            '‘' | '’' => Some('\''),
            '“' | '”' => Some('"'),
            '≈' => Some('~'),
            ' '..='~' | '\u{a0}'..='\u{ff}' => Some(c),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() { 0 } else { current.chars().count() + 1 };
        if needed + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
