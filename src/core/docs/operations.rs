// ============================================================================
// OPERATION MODEL
// ============================================================================
// A Google Doc body is one flat buffer addressed by integer indices. Every
// edit we send is one of the variants below. Operations are plain values:
// once the builder has produced one it is never mutated again.

/// Font used for code spans and code blocks.
pub const MONOSPACE_FONT: &str = "Courier New";

/// Length of `text` in the remote's native index unit (UTF-16 code units).
///
/// Every index the builder hands out is derived from this function. Counting
/// bytes or chars instead would silently shift every later operation as soon
/// as the text contains a non-ASCII character.
pub fn utf16_len(text: &str) -> i64 {
    text.encode_utf16().count() as i64
}

/// Half-open `[start, end)` span of document indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRange {
    pub start: i64,
    pub end: i64,
}

impl StyleRange {
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(start <= end, "style range start {start} > end {end}");
        Self { start, end }
    }
}

/// Predefined paragraph formatting preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedStyleType {
    NormalText,
    Title,
    Subtitle,
    /// Heading level 1 through 6.
    Heading(u8),
}

impl NamedStyleType {
    /// Parses the template vocabulary (`heading1..heading4`, `title`,
    /// `subtitle`, `normal`).
    pub fn from_template_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::NormalText),
            "title" => Some(Self::Title),
            "subtitle" => Some(Self::Subtitle),
            "heading1" => Some(Self::Heading(1)),
            "heading2" => Some(Self::Heading(2)),
            "heading3" => Some(Self::Heading(3)),
            "heading4" => Some(Self::Heading(4)),
            _ => None,
        }
    }

    /// Markdown headings go up to level 6; anything deeper is clamped.
    pub fn heading(level: u8) -> Self {
        Self::Heading(level.clamp(1, 6))
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            Self::NormalText => "NORMAL_TEXT",
            Self::Title => "TITLE",
            Self::Subtitle => "SUBTITLE",
            Self::Heading(1) => "HEADING_1",
            Self::Heading(2) => "HEADING_2",
            Self::Heading(3) => "HEADING_3",
            Self::Heading(4) => "HEADING_4",
            Self::Heading(5) => "HEADING_5",
            Self::Heading(_) => "HEADING_6",
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Start,
    Center,
    End,
    Justified,
}

impl Alignment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Start),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::End),
            "justify" | "justified" => Some(Self::Justified),
            _ => None,
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Center => "CENTER",
            Self::End => "END",
            Self::Justified => "JUSTIFIED",
        }
    }
}

/// Glyph preset applied when a paragraph range becomes a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPreset {
    BulletDiscCircleSquare,
    NumberedDecimalAlphaRoman,
    NumberedUpperAlphaAlphaRoman,
    NumberedUpperRomanUpperAlphaDecimal,
    BulletCheckbox,
}

impl ListPreset {
    /// Preset for a Markdown list, picked only by the ordered flag.
    pub fn for_markdown(ordered: bool) -> Self {
        if ordered {
            Self::NumberedDecimalAlphaRoman
        } else {
            Self::BulletDiscCircleSquare
        }
    }

    /// Parses the template list type tag.
    pub fn from_list_type(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "bullet" => Some(Self::BulletDiscCircleSquare),
            "numbered" => Some(Self::NumberedDecimalAlphaRoman),
            "lettered" => Some(Self::NumberedUpperAlphaAlphaRoman),
            "roman" => Some(Self::NumberedUpperRomanUpperAlphaDecimal),
            "checklist" => Some(Self::BulletCheckbox),
            _ => None,
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            Self::BulletDiscCircleSquare => "BULLET_DISC_CIRCLE_SQUARE",
            Self::NumberedDecimalAlphaRoman => "NUMBERED_DECIMAL_ALPHA_ROMAN",
            Self::NumberedUpperAlphaAlphaRoman => "NUMBERED_UPPERALPHA_ALPHA_ROMAN",
            Self::NumberedUpperRomanUpperAlphaDecimal => "NUMBERED_UPPERROMAN_UPPERALPHA_DECIMAL",
            Self::BulletCheckbox => "BULLET_CHECKBOX",
        }
    }
}

/// 24-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    /// Parses exactly six hex digits, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }

    /// Channels as the 0.0..=1.0 floats the API expects.
    pub fn as_unit_floats(&self) -> (f64, f64, f64) {
        (
            f64::from(self.red) / 255.0,
            f64::from(self.green) / 255.0,
            f64::from(self.blue) / 255.0,
        )
    }
}

/// Character-level style. `None` fields are left untouched on the remote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub foreground: Option<RgbColor>,
    pub background: Option<RgbColor>,
    pub link_url: Option<String>,
}

impl TextStyle {
    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: Some(true),
            ..Self::default()
        }
    }

    pub fn strikethrough() -> Self {
        Self {
            strikethrough: Some(true),
            ..Self::default()
        }
    }

    pub fn monospace() -> Self {
        Self {
            font_family: Some(MONOSPACE_FONT.to_string()),
            ..Self::default()
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field_mask().is_empty()
    }

    /// Comma separated list of the API field names this style sets.
    pub fn field_mask(&self) -> String {
        let mut fields: Vec<&str> = Vec::new();
        if self.bold.is_some() {
            fields.push("bold");
        }
        if self.italic.is_some() {
            fields.push("italic");
        }
        if self.underline.is_some() {
            fields.push("underline");
        }
        if self.strikethrough.is_some() {
            fields.push("strikethrough");
        }
        if self.font_size.is_some() {
            fields.push("fontSize");
        }
        if self.font_family.is_some() {
            fields.push("weightedFontFamily");
        }
        if self.foreground.is_some() {
            fields.push("foregroundColor");
        }
        if self.background.is_some() {
            fields.push("backgroundColor");
        }
        if self.link_url.is_some() {
            fields.push("link");
        }
        fields.join(",")
    }
}

/// One addressable mutation of the remote document.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    InsertText {
        index: i64,
        text: String,
    },
    ApplyParagraphStyle {
        range: StyleRange,
        style: NamedStyleType,
    },
    ApplyAlignment {
        range: StyleRange,
        alignment: Alignment,
    },
    ApplyTextStyle {
        range: StyleRange,
        style: TextStyle,
        fields: String,
    },
    CreateList {
        range: StyleRange,
        preset: ListPreset,
    },
    InsertTable {
        index: i64,
        rows: usize,
        columns: usize,
    },
    InsertPageBreak {
        index: i64,
    },
    DeleteRange {
        range: StyleRange,
    },
}

#[cfg(test)]
impl Operation {
    /// Index the operation is addressed at (range start for ranged ones).
    pub fn index(&self) -> i64 {
        match self {
            Self::InsertText { index, .. }
            | Self::InsertTable { index, .. }
            | Self::InsertPageBreak { index } => *index,
            Self::ApplyParagraphStyle { range, .. }
            | Self::ApplyAlignment { range, .. }
            | Self::ApplyTextStyle { range, .. }
            | Self::CreateList { range, .. }
            | Self::DeleteRange { range } => range.start,
        }
    }
}
