// ============================================================================
// TABLE POPULATION (SECOND PHASE)
// ============================================================================
// A table's cell indices only exist once the remote has created the table, so
// table content is written in a second phase:
//
//   PendingTable  --resolve(snapshot)-->  ResolvedTable  --populate()-->  PopulatedTable
//
// `PendingTable` is what the template compiler records, `ResolvedTable` knows
// the real index of every cell, and `PopulatedTable` holds the batch that
// fills them in.

use thiserror::Error;

use super::operations::{utf16_len, Operation, StyleRange, TextStyle};
use super::snapshot::DocumentSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Document snapshot contains no tables to populate")]
    NoTables,

    #[error("Table at index {0} has no addressable cells")]
    NoCells(i64),
}

/// A table whose content is waiting for the remote to create it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingTable {
    pub rows: usize,
    pub columns: usize,
    pub headers: Option<Vec<String>>,
    pub data: Option<Vec<Vec<String>>>,
}

impl PendingTable {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            ..Self::default()
        }
    }

    /// Whether there is anything to write into the cells at all.
    pub fn has_content(&self) -> bool {
        let headers = self
            .headers
            .as_ref()
            .is_some_and(|h| h.iter().any(|cell| !cell.is_empty()));
        let data = self
            .data
            .as_ref()
            .is_some_and(|rows| rows.iter().flatten().any(|cell| !cell.is_empty()));
        headers || data
    }

    /// Finds the table this job belongs to in a snapshot taken after the
    /// table was inserted.
    ///
    /// New content is always appended at the end of the body, so the most
    /// recently created table is the one closest to the highest index. Taking
    /// the first table instead would overwrite tables that were already in
    /// the document.
    pub fn resolve(self, snapshot: &DocumentSnapshot) -> Result<ResolvedTable, TableError> {
        let located = snapshot
            .tables()
            .max_by_key(|table| table.start_index)
            .ok_or(TableError::NoTables)?;

        let table = located.table;
        if table.rows != self.rows || table.columns != self.columns {
            tracing::warn!(
                expected_rows = self.rows,
                expected_columns = self.columns,
                actual_rows = table.rows,
                actual_columns = table.columns,
                table_start = located.start_index,
                "Located table does not match the pending job's dimensions"
            );
        }

        let cell_starts: Vec<Vec<Option<i64>>> = table
            .table_rows
            .iter()
            .map(|row| row.table_cells.iter().map(|c| c.content_start()).collect())
            .collect();

        if cell_starts.iter().all(|row| row.is_empty()) {
            return Err(TableError::NoCells(located.start_index));
        }

        Ok(ResolvedTable {
            job: self,
            table_start: located.start_index,
            cell_starts,
        })
    }
}

/// A pending table matched to a real table in the document.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    job: PendingTable,
    table_start: i64,
    /// `[row][column]` index of each cell's first character.
    cell_starts: Vec<Vec<Option<i64>>>,
}

/// The batch that fills one table.
#[derive(Debug, Clone)]
pub struct PopulatedTable {
    pub cells_written: usize,
    pub operations: Vec<Operation>,
}

/// One cell write, kept separately so the writes can be sorted.
#[derive(Debug, Clone)]
struct CellInsert {
    index: i64,
    text: String,
    header: bool,
}

impl ResolvedTable {
    pub fn table_start(&self) -> i64 {
        self.table_start
    }

    fn cell_start(&self, row: usize, column: usize) -> Option<i64> {
        self.cell_starts.get(row)?.get(column).copied().flatten()
    }

    /// Builds the cell inserts in strictly descending index order, followed
    /// by a bold style for every header cell.
    ///
    /// Inserting at index N shifts everything after N, so writing the highest
    /// cell first keeps every precomputed index valid until it is used.
    pub fn populate(self) -> PopulatedTable {
        let mut inserts: Vec<CellInsert> = Vec::new();
        let mut row_offset = 0;

        if let Some(headers) = &self.job.headers {
            for (column, text) in headers.iter().enumerate() {
                self.push_cell(&mut inserts, 0, column, text, true);
            }
            row_offset = 1;
        }

        if let Some(data) = &self.job.data {
            for (i, row) in data.iter().enumerate() {
                for (column, text) in row.iter().enumerate() {
                    self.push_cell(&mut inserts, i + row_offset, column, text, false);
                }
            }
        }

        inserts.sort_by(|a, b| b.index.cmp(&a.index));

        let mut operations: Vec<Operation> = inserts
            .iter()
            .map(|cell| Operation::InsertText {
                index: cell.index,
                text: cell.text.clone(),
            })
            .collect();

        // Header text ends up shifted right by every insert addressed below
        // it, so the style range is computed from the post-insert position.
        for header in inserts.iter().filter(|cell| cell.header) {
            let shift: i64 = inserts
                .iter()
                .filter(|other| other.index < header.index)
                .map(|other| utf16_len(&other.text))
                .sum();
            let start = header.index + shift;
            let style = TextStyle::bold();
            let fields = style.field_mask();
            operations.push(Operation::ApplyTextStyle {
                range: StyleRange::new(start, start + utf16_len(&header.text)),
                style,
                fields,
            });
        }

        PopulatedTable {
            cells_written: inserts.len(),
            operations,
        }
    }

    fn push_cell(
        &self,
        inserts: &mut Vec<CellInsert>,
        row: usize,
        column: usize,
        text: &str,
        header: bool,
    ) {
        if text.is_empty() {
            return;
        }
        // Rows/columns beyond the real table are dropped.
        if let Some(index) = self.cell_start(row, column) {
            inserts.push(CellInsert {
                index,
                text: text.to_string(),
                header,
            });
        }
    }
}
