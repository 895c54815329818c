use serde::Deserialize;

// ============================================================================
// DOCUMENT SNAPSHOT
// ============================================================================
// The slice of a `documents.get` response the writer needs: where the body
// ends, and where each table's cells start. Field names follow the API.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    /// The API omits `startIndex` for the leading section break (index 0).
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub columns: usize,
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

impl TableCell {
    /// Index of the first character inside the cell (its empty paragraph on
    /// a freshly created table).
    pub fn content_start(&self) -> Option<i64> {
        self.content.first().map(|element| element.start_index)
    }
}

/// A top-level table together with the index it starts at.
#[derive(Debug, Clone, Copy)]
pub struct LocatedTable<'a> {
    pub start_index: i64,
    pub table: &'a Table,
}

impl DocumentSnapshot {
    /// Parses a raw `documents.get` response.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// End index of the body (one past its final newline).
    pub fn end_index(&self) -> i64 {
        self.body
            .content
            .last()
            .map(|element| element.end_index)
            .unwrap_or(1)
    }

    /// Where appended content goes: just before the body's final newline,
    /// which can never be deleted or written past.
    pub fn insertion_index(&self) -> i64 {
        (self.end_index() - 1).max(1)
    }

    pub fn tables(&self) -> impl Iterator<Item = LocatedTable<'_>> {
        self.body.content.iter().filter_map(|element| {
            element.table.as_ref().map(|table| LocatedTable {
                start_index: element.start_index,
                table,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_end_and_insertion_index() {
        let snapshot = DocumentSnapshot::from_json(json!({
            "documentId": "doc",
            "title": "Notes",
            "body": { "content": [
                { "endIndex": 1, "sectionBreak": {} },
                { "startIndex": 1, "endIndex": 12, "paragraph": {} }
            ]}
        }))
        .unwrap();

        assert_eq!(snapshot.end_index(), 12);
        assert_eq!(snapshot.insertion_index(), 11);
        assert_eq!(snapshot.body.content[0].start_index, 0);
        assert_eq!(snapshot.tables().count(), 0);
    }

    #[test]
    fn test_empty_document_defaults() {
        let snapshot = DocumentSnapshot::from_json(json!({})).unwrap();
        assert_eq!(snapshot.end_index(), 1);
        assert_eq!(snapshot.insertion_index(), 1);
    }

    #[test]
    fn test_tables_and_cell_starts() {
        let snapshot = DocumentSnapshot::from_json(json!({
            "body": { "content": [
                { "endIndex": 1 },
                { "startIndex": 1, "endIndex": 2 },
                { "startIndex": 2, "endIndex": 9, "table": {
                    "rows": 1, "columns": 2,
                    "tableRows": [{ "tableCells": [
                        { "startIndex": 4, "content": [{ "startIndex": 5, "endIndex": 6 }] },
                        { "startIndex": 6, "content": [{ "startIndex": 7, "endIndex": 8 }] }
                    ]}]
                }}
            ]}
        }))
        .unwrap();

        let tables: Vec<_> = snapshot.tables().collect();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].start_index, 2);
        let cells = &tables[0].table.table_rows[0].table_cells;
        assert_eq!(cells[0].content_start(), Some(5));
        assert_eq!(cells[1].content_start(), Some(7));
    }
}
