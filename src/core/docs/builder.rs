// ============================================================================
// REQUEST BUILDER
// ============================================================================
// The builder is the only place that does index arithmetic. It owns a
// virtual cursor (where the next insertion lands) and an append-only list of
// operations. Compilers never compute "where does this text end up" on their
// own; they ask the builder for the cursor before and after an insertion.

use super::operations::{
    utf16_len, Alignment, ListPreset, NamedStyleType, Operation, StyleRange, TextStyle,
};

/// Index cost of a page break (the break itself plus its paragraph newline).
pub const PAGE_BREAK_COST: i64 = 2;

/// Underscores used to draw a horizontal rule; Docs has no rule primitive.
pub const RULE_WIDTH: usize = 50;

/// Cursor-tracking accumulator for one batch of operations.
///
/// Single use: create one per compile call and consume it with [`build`].
///
/// [`build`]: RequestBuilder::build
#[derive(Debug)]
pub struct RequestBuilder {
    cursor: i64,
    operations: Vec<Operation>,
}

impl RequestBuilder {
    pub fn new(start_index: i64) -> Self {
        Self {
            cursor: start_index,
            operations: Vec::new(),
        }
    }

    /// Where the next insertion will land.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Inserts `text` at the cursor and advances it by the text's length.
    /// Empty text is a no-op.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.operations.push(Operation::InsertText {
            index: self.cursor,
            text: text.to_string(),
        });
        self.cursor += utf16_len(text);
    }

    pub fn apply_paragraph_style(&mut self, start: i64, end: i64, style: NamedStyleType) {
        self.operations.push(Operation::ApplyParagraphStyle {
            range: StyleRange::new(start, end),
            style,
        });
    }

    pub fn apply_alignment(&mut self, start: i64, end: i64, alignment: Alignment) {
        self.operations.push(Operation::ApplyAlignment {
            range: StyleRange::new(start, end),
            alignment,
        });
    }

    pub fn apply_text_style(&mut self, start: i64, end: i64, style: TextStyle, fields: &str) {
        self.operations.push(Operation::ApplyTextStyle {
            range: StyleRange::new(start, end),
            style,
            fields: fields.to_string(),
        });
    }

    pub fn create_list(&mut self, start: i64, end: i64, preset: ListPreset) {
        self.operations.push(Operation::CreateList {
            range: StyleRange::new(start, end),
            preset,
        });
    }

    /// Inserts a table at the cursor WITHOUT advancing it.
    ///
    /// How many indices a fresh table occupies is only known once the remote
    /// has created it, so anything that must follow the table has to be
    /// compiled in a later pass against a fresh snapshot.
    pub fn insert_table(&mut self, rows: usize, columns: usize) {
        self.operations.push(Operation::InsertTable {
            index: self.cursor,
            rows,
            columns,
        });
    }

    pub fn insert_page_break(&mut self) {
        self.operations.push(Operation::InsertPageBreak { index: self.cursor });
        self.cursor += PAGE_BREAK_COST;
    }

    /// Inserts the plain-text stand-in for a horizontal rule: a newline, a
    /// row of underscores and another newline.
    pub fn insert_horizontal_rule(&mut self) {
        let rule = format!("\n{}\n", "_".repeat(RULE_WIDTH));
        self.insert_text(&rule);
    }

    pub fn build(self) -> Vec<Operation> {
        self.operations
    }
}
