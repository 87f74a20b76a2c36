use crate::chart::ChartImage;
use crate::wells::SensorRecord;

use super::REPORT_TITLE;

// A4 portrait, millimetres, y measured from the top edge.
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_TOP_MM: f32 = 15.0;
const MARGIN_BOTTOM_MM: f32 = 15.0;
const MARGIN_LEFT_MM: f32 = 10.0;

const TITLE_HEIGHT_MM: f32 = 10.0;
const TITLE_GAP_MM: f32 = 5.0;
const FIELD_HEIGHT_MM: f32 = 8.0;
const CHART_X_MM: f32 = 30.0;
const CHART_WIDTH_MM: f32 = 150.0;
const CHART_GAP_MM: f32 = 5.0;
const TEXT_LINE_HEIGHT_MM: f32 = 6.0;

/// Display columns per diagnosis line at 11 pt across the printable width.
pub const WRAP_COLUMNS: usize = 90;

pub const TITLE_FONT_PT: f32 = 14.0;
pub const FIELD_FONT_PT: f32 = 11.0;
pub const TEXT_FONT_PT: f32 = 11.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Field { label: &'static str, value: String },
    Chart { width_mm: f32, height_mm: f32 },
    TextLine(String),
}

impl Block {
    /// The text painted for this block, if any.
    pub fn text(&self) -> Option<String> {
        match self {
            Block::Title(t) | Block::TextLine(t) => Some(t.clone()),
            Block::Field { label, value } => Some(format!("{label}: {value}")),
            Block::Chart { .. } => None,
        }
    }
}

/// A block anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub x_mm: f32,
    pub y_mm: f32,
    pub block: Block,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPage {
    pub blocks: Vec<PlacedBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<ReportPage>,
}

impl ReportLayout {
    pub fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }
}

/// Cursor that starts a new page when the next block would not fit.
struct Flow {
    pages: Vec<ReportPage>,
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            pages: vec![ReportPage::default()],
            y: MARGIN_TOP_MM,
        }
    }

    fn place(&mut self, x_mm: f32, height: f32, block: Block) {
        if self.y + height > PAGE_HEIGHT_MM - MARGIN_BOTTOM_MM && self.y > MARGIN_TOP_MM {
            self.pages.push(ReportPage::default());
            self.y = MARGIN_TOP_MM;
        }
        let page = self.pages.len() - 1;
        self.pages[page].blocks.push(PlacedBlock {
            x_mm,
            y_mm: self.y,
            block,
        });
        self.y += height;
    }

    fn skip(&mut self, gap: f32) {
        self.y += gap;
    }
}

/// Lay out title, field dump, chart and diagnosis text.
pub fn compose(record: &SensorRecord, diagnosis: &str, chart: &ChartImage) -> ReportLayout {
    let mut flow = Flow::new();

    flow.place(MARGIN_LEFT_MM, TITLE_HEIGHT_MM, Block::Title(REPORT_TITLE.to_string()));
    flow.skip(TITLE_GAP_MM);

    for (label, value) in record.fields() {
        flow.place(MARGIN_LEFT_MM, FIELD_HEIGHT_MM, Block::Field { label, value });
    }

    let height_mm = CHART_WIDTH_MM * chart.height() as f32 / chart.width().max(1) as f32;
    flow.skip(CHART_GAP_MM);
    flow.place(
        CHART_X_MM,
        height_mm,
        Block::Chart {
            width_mm: CHART_WIDTH_MM,
            height_mm,
        },
    );
    flow.skip(CHART_GAP_MM);

    for line in wrap_text(diagnosis, WRAP_COLUMNS) {
        flow.place(MARGIN_LEFT_MM, TEXT_LINE_HEIGHT_MM, Block::TextLine(line));
    }

    ReportLayout { pages: flow.pages }
}

/// Word-wrap by display columns, counting full-width glyphs (CJK, Hangul,
/// full-width forms) as two. Explicit line breaks are kept and words wider
/// than `max_columns` are split, so no character is dropped.
fn wrap_text(text: &str, max_columns: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_cols = 0;

        for word in paragraph.split_whitespace() {
            for (chunk, chunk_cols) in split_word(word, max_columns) {
                if current_cols > 0 && current_cols + 1 + chunk_cols > max_columns {
                    lines.push(std::mem::take(&mut current));
                    current_cols = 0;
                }
                if current_cols > 0 {
                    current.push(' ');
                    current_cols += 1;
                }
                current.push_str(&chunk);
                current_cols += chunk_cols;
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Cut a word into pieces no wider than `max_columns` (at least one glyph each).
fn split_word(word: &str, max_columns: usize) -> Vec<(String, usize)> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut cols = 0;

    for c in word.chars() {
        let width = char_columns(c);
        if cols > 0 && cols + width > max_columns {
            chunks.push((std::mem::take(&mut chunk), cols));
            cols = 0;
        }
        chunk.push(c);
        cols += width;
    }
    if !chunk.is_empty() {
        chunks.push((chunk, cols));
    }
    chunks
}

fn char_columns(c: char) -> usize {
    match c as u32 {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x20000..=0x3FFFD => 2,
        _ => 1,
    }
}
