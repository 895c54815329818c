// =============================================================================
// BATCH UPDATE REQUEST ENCODING
// =============================================================================
//
// Maps domain operations onto the JSON request objects of
// `documents.batchUpdate`. One operation becomes exactly one request, in the
// same order, so the remote applies its index shifts the way the builder
// assumed.

use serde_json::{json, Value};

use crate::core::docs::operations::{Operation, RgbColor, StyleRange, TextStyle};

pub fn encode_batch(operations: &[Operation]) -> Value {
    json!({
        "requests": operations.iter().map(encode_operation).collect::<Vec<_>>(),
    })
}

pub fn encode_operation(operation: &Operation) -> Value {
    match operation {
        Operation::InsertText { index, text } => json!({
            "insertText": {
                "location": { "index": index },
                "text": text,
            }
        }),
        Operation::ApplyParagraphStyle { range, style } => json!({
            "updateParagraphStyle": {
                "range": encode_range(range),
                "paragraphStyle": { "namedStyleType": style.api_name() },
                "fields": "namedStyleType",
            }
        }),
        Operation::ApplyAlignment { range, alignment } => json!({
            "updateParagraphStyle": {
                "range": encode_range(range),
                "paragraphStyle": { "alignment": alignment.api_name() },
                "fields": "alignment",
            }
        }),
        Operation::ApplyTextStyle {
            range,
            style,
            fields,
        } => json!({
            "updateTextStyle": {
                "range": encode_range(range),
                "textStyle": encode_text_style(style),
                "fields": fields,
            }
        }),
        Operation::CreateList { range, preset } => json!({
            "createParagraphBullets": {
                "range": encode_range(range),
                "bulletPreset": preset.api_name(),
            }
        }),
        Operation::InsertTable {
            index,
            rows,
            columns,
        } => json!({
            "insertTable": {
                "location": { "index": index },
                "rows": rows,
                "columns": columns,
            }
        }),
        Operation::InsertPageBreak { index } => json!({
            "insertPageBreak": {
                "location": { "index": index },
            }
        }),
        Operation::DeleteRange { range } => json!({
            "deleteContentRange": {
                "range": encode_range(range),
            }
        }),
    }
}

fn encode_range(range: &StyleRange) -> Value {
    json!({ "startIndex": range.start, "endIndex": range.end })
}

fn encode_color(color: &RgbColor) -> Value {
    let (red, green, blue) = color.as_unit_floats();
    json!({ "color": { "rgbColor": { "red": red, "green": green, "blue": blue } } })
}

/// Only the fields that are set appear, matching the request's field mask.
fn encode_text_style(style: &TextStyle) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(bold) = style.bold {
        out.insert("bold".into(), json!(bold));
    }
    if let Some(italic) = style.italic {
        out.insert("italic".into(), json!(italic));
    }
    if let Some(underline) = style.underline {
        out.insert("underline".into(), json!(underline));
    }
    if let Some(strikethrough) = style.strikethrough {
        out.insert("strikethrough".into(), json!(strikethrough));
    }
    if let Some(size) = style.font_size {
        out.insert("fontSize".into(), json!({ "magnitude": size, "unit": "PT" }));
    }
    if let Some(family) = &style.font_family {
        out.insert("weightedFontFamily".into(), json!({ "fontFamily": family }));
    }
    if let Some(color) = &style.foreground {
        out.insert("foregroundColor".into(), encode_color(color));
    }
    if let Some(color) = &style.background {
        out.insert("backgroundColor".into(), encode_color(color));
    }
    if let Some(url) = &style.link_url {
        out.insert("link".into(), json!({ "url": url }));
    }
    Value::Object(out)
}
