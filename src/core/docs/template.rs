// ============================================================================
// DOCUMENT TEMPLATES
// ============================================================================
// A template is the structured alternative to Markdown: a title, sections and
// typed elements, usually generated by a program. Unlike Markdown it is
// validated up front and rejected as a whole on the first problem, so a bad
// template never produces a half-written document.
//
// Example:
// ```json
// {
//   "title": { "text": "Weekly report" },
//   "sections": [
//     { "heading": "Status", "content": [
//       { "type": "text", "content": "All green.", "style": { "bold": true } },
//       { "type": "list", "list_type": "numbered", "items": ["one", "two"] }
//     ]}
//   ],
//   "elements": [
//     { "type": "table", "rows": 2, "columns": 2, "headers": ["Key", "Value"] }
//   ]
// }
// ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::operations::{Alignment, ListPreset, NamedStyleType, RgbColor, TextStyle};
use super::tables::PendingTable;

pub const MIN_FONT_SIZE: f64 = 8.0;
pub const MAX_FONT_SIZE: f64 = 72.0;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("Invalid template JSON: {0}")]
    Parse(String),

    #[error("Failed to read template file: {0}")]
    Io(String),

    #[error("{path}: heading must not be empty")]
    MissingHeading { path: String },

    #[error("{path}: unknown element type '{kind}'")]
    UnknownElement { path: String, kind: String },

    #[error("{path}: list needs at least one item")]
    EmptyList { path: String },

    #[error("{path}: list item {index} is empty")]
    EmptyListItem { path: String, index: usize },

    #[error("{path}: unknown list type '{value}'")]
    UnknownListType { path: String, value: String },

    #[error("{path}: table needs at least one row and one column (got {rows}x{columns})")]
    InvalidTableSize {
        path: String,
        rows: i64,
        columns: i64,
    },

    #[error("{path}: unknown paragraph style '{value}'")]
    UnknownNamedStyle { path: String, value: String },

    #[error("{path}: font size {size} is outside 8-72")]
    InvalidFontSize { path: String, size: f64 },

    #[error("{path}: {field} must be 6 hex digits, got '{value}'")]
    InvalidColor {
        path: String,
        field: &'static str,
        value: String,
    },

    #[error("{path}: unknown alignment '{value}'")]
    InvalidAlignment { path: String, value: String },
}

// ============================================================================
// INPUT SHAPE (as deserialized)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentTemplate {
    #[serde(default)]
    pub title: Option<TitleSpec>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleSpec {
    #[serde(default)]
    pub text: String,
    /// Named paragraph style, `title` when absent.
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionSpec {
    #[serde(default)]
    pub heading: String,
    /// Named paragraph style for the heading, `heading1` when absent.
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub content: Vec<ElementSpec>,
}

/// One element, kept loose so validation can report exactly what is wrong
/// instead of a generic deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementSpec {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub style: Option<StyleSpec>,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub list_type: Option<String>,
    #[serde(default)]
    pub rows: Option<i64>,
    #[serde(default)]
    pub columns: Option<i64>,
    #[serde(default)]
    pub headers: Option<Vec<String>>,
    #[serde(default)]
    pub data: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleSpec {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub named_style: Option<String>,
    pub alignment: Option<String>,
}

impl DocumentTemplate {
    pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| TemplateError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Validates the whole template and flattens it into blocks in document
    /// order: title, then each section (heading and content), then top-level
    /// elements. Stops at the first problem.
    pub fn validate(&self) -> Result<Vec<TemplateBlock>, TemplateError> {
        let mut blocks = Vec::new();

        if let Some(title) = &self.title {
            let style = named_style_or(title.style.as_deref(), NamedStyleType::Title, "title")?;
            if !title.text.trim().is_empty() {
                blocks.push(TemplateBlock::Heading {
                    text: title.text.clone(),
                    style,
                });
            }
        }

        for (i, section) in self.sections.iter().enumerate() {
            let path = format!("sections[{}]", i);
            if section.heading.trim().is_empty() {
                return Err(TemplateError::MissingHeading { path });
            }
            let style = named_style_or(section.style.as_deref(), NamedStyleType::Heading(1), &path)?;
            blocks.push(TemplateBlock::Heading {
                text: section.heading.clone(),
                style,
            });

            for (j, element) in section.content.iter().enumerate() {
                blocks.push(element.validate(&format!("{}.content[{}]", path, j))?);
            }
        }

        for (i, element) in self.elements.iter().enumerate() {
            blocks.push(element.validate(&format!("elements[{}]", i))?);
        }

        Ok(blocks)
    }
}

fn named_style_or(
    value: Option<&str>,
    default: NamedStyleType,
    path: &str,
) -> Result<NamedStyleType, TemplateError> {
    match value {
        None => Ok(default),
        Some(name) => {
            NamedStyleType::from_template_name(name).ok_or_else(|| TemplateError::UnknownNamedStyle {
                path: path.to_string(),
                value: name.to_string(),
            })
        }
    }
}

// ============================================================================
// VALIDATED SHAPE
// ============================================================================

/// Paragraph-level formatting for a text element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFormat {
    pub text_style: TextStyle,
    pub named_style: Option<NamedStyleType>,
    pub alignment: Option<Alignment>,
}

/// A validated template element, ready to compile.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBlock {
    Heading {
        text: String,
        style: NamedStyleType,
    },
    Text {
        content: String,
        format: TextFormat,
    },
    List {
        items: Vec<String>,
        preset: ListPreset,
    },
    Table(PendingTable),
    PageBreak,
    HorizontalRule,
}

impl ElementSpec {
    fn validate(&self, path: &str) -> Result<TemplateBlock, TemplateError> {
        match self.kind.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(TemplateBlock::Text {
                content: self.content.clone().unwrap_or_default(),
                format: match &self.style {
                    Some(style) => style.validate(path)?,
                    None => TextFormat::default(),
                },
            }),
            "list" => self.validate_list(path),
            "table" => self.validate_table(path),
            "pagebreak" => Ok(TemplateBlock::PageBreak),
            "hr" => Ok(TemplateBlock::HorizontalRule),
            _ => Err(TemplateError::UnknownElement {
                path: path.to_string(),
                kind: self.kind.clone(),
            }),
        }
    }

    fn validate_list(&self, path: &str) -> Result<TemplateBlock, TemplateError> {
        let items = self.items.clone().unwrap_or_default();
        if items.is_empty() {
            return Err(TemplateError::EmptyList {
                path: path.to_string(),
            });
        }
        if let Some(index) = items.iter().position(|item| item.trim().is_empty()) {
            return Err(TemplateError::EmptyListItem {
                path: path.to_string(),
                index,
            });
        }

        let list_type = self.list_type.as_deref().unwrap_or("bullet");
        let preset =
            ListPreset::from_list_type(list_type).ok_or_else(|| TemplateError::UnknownListType {
                path: path.to_string(),
                value: list_type.to_string(),
            })?;

        Ok(TemplateBlock::List { items, preset })
    }

    fn validate_table(&self, path: &str) -> Result<TemplateBlock, TemplateError> {
        let rows = self.rows.unwrap_or(0);
        let columns = self.columns.unwrap_or(0);
        if rows < 1 || columns < 1 {
            return Err(TemplateError::InvalidTableSize {
                path: path.to_string(),
                rows,
                columns,
            });
        }

        Ok(TemplateBlock::Table(PendingTable {
            headers: self.headers.clone(),
            data: self.data.clone(),
            ..PendingTable::new(rows as usize, columns as usize)
        }))
    }
}

impl StyleSpec {
    fn validate(&self, path: &str) -> Result<TextFormat, TemplateError> {
        if let Some(size) = self.font_size {
            if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
                return Err(TemplateError::InvalidFontSize {
                    path: path.to_string(),
                    size,
                });
            }
        }

        let color = |field: &'static str, value: &Option<String>| match value {
            None => Ok(None),
            Some(hex) => RgbColor::from_hex(hex)
                .map(Some)
                .ok_or_else(|| TemplateError::InvalidColor {
                    path: path.to_string(),
                    field,
                    value: hex.clone(),
                }),
        };
        let foreground = color("color", &self.color)?;
        let background = color("background_color", &self.background_color)?;

        let named_style = match &self.named_style {
            None => None,
            Some(name) => Some(named_style_or(Some(name), NamedStyleType::NormalText, path)?),
        };

        let alignment = match &self.alignment {
            None => None,
            Some(value) => Some(Alignment::parse(value).ok_or_else(|| {
                TemplateError::InvalidAlignment {
                    path: path.to_string(),
                    value: value.clone(),
                }
            })?),
        };

        Ok(TextFormat {
            text_style: TextStyle {
                bold: self.bold,
                italic: self.italic,
                underline: self.underline,
                strikethrough: self.strikethrough,
                font_size: self.font_size,
                font_family: self.font_family.clone().filter(|f| !f.trim().is_empty()),
                foreground,
                background,
                link_url: None,
            },
            named_style,
            alignment,
        })
    }
}
