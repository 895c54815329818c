// ============================================================================
// INLINE STYLE RESOLVER
// ============================================================================
// Inline Markdown is a tree (`**bold _and italic_**`), but the document only
// understands flat `[start, end)` ranges. The resolver walks the tree once,
// keeping a running offset from the start of the block, and emits one style
// operation per styled span. Nested spans resolve naturally: the inner span's
// range is captured while the outer one is still open.
//
// `extract_text` and the resolver must agree on how many units every node
// contributes, otherwise the ranges drift away from the inserted text.

use super::builder::RequestBuilder;
use super::markdown::MdNode;
use super::operations::{utf16_len, TextStyle};

/// Separator Google Docs uses for a line break inside one paragraph.
pub const LINE_SEPARATOR: char = '\u{000B}';

/// Flattens inline nodes into the text that will actually be inserted.
///
/// Soft breaks become a space, hard breaks a line separator. Block nodes
/// contribute nothing.
pub fn extract_text(nodes: &[MdNode]) -> String {
    let mut out = String::new();
    push_text(nodes, &mut out);
    out
}

fn push_text(nodes: &[MdNode], out: &mut String) {
    for node in nodes {
        match node {
            MdNode::Text(text) | MdNode::Code(text) => out.push_str(text),
            MdNode::SoftBreak => out.push(' '),
            MdNode::HardBreak => out.push(LINE_SEPARATOR),
            MdNode::Emphasis(children)
            | MdNode::Strong(children)
            | MdNode::Strikethrough(children)
            | MdNode::Link { children, .. }
            | MdNode::Container(children) => push_text(children, out),
            _ => {}
        }
    }
}

/// Emits text style operations for `nodes`, whose text was inserted at
/// `block_start`. Returns the offset reached, which equals the UTF-16 length
/// of [`extract_text`] for the same nodes.
pub fn resolve_inline_styles(
    nodes: &[MdNode],
    block_start: i64,
    builder: &mut RequestBuilder,
) -> i64 {
    let mut resolver = InlineStyleResolver {
        builder,
        block_start,
        offset: 0,
    };
    resolver.walk(nodes);
    resolver.offset
}

struct InlineStyleResolver<'a> {
    builder: &'a mut RequestBuilder,
    block_start: i64,
    offset: i64,
}

impl InlineStyleResolver<'_> {
    fn walk(&mut self, nodes: &[MdNode]) {
        for node in nodes {
            match node {
                MdNode::Text(text) => self.offset += utf16_len(text),
                MdNode::SoftBreak | MdNode::HardBreak => self.offset += 1,
                MdNode::Code(text) => {
                    let start = self.offset;
                    self.offset += utf16_len(text);
                    self.emit(start, TextStyle::monospace());
                }
                MdNode::Strong(children) => self.styled(children, TextStyle::bold()),
                MdNode::Emphasis(children) => self.styled(children, TextStyle::italic()),
                MdNode::Strikethrough(children) => {
                    self.styled(children, TextStyle::strikethrough())
                }
                MdNode::Link { url, children } => self.styled(children, TextStyle::link(url)),
                MdNode::Container(children) => self.walk(children),
                _ => {}
            }
        }
    }

    fn styled(&mut self, children: &[MdNode], style: TextStyle) {
        let start = self.offset;
        self.walk(children);
        self.emit(start, style);
    }

    fn emit(&mut self, start: i64, style: TextStyle) {
        if self.offset <= start {
            return;
        }
        let fields = style.field_mask();
        self.builder.apply_text_style(
            self.block_start + start,
            self.block_start + self.offset,
            style,
            &fields,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::docs::markdown::parse_markdown;
    use crate::core::docs::operations::{Operation, StyleRange};

    fn inlines(markdown: &str) -> Vec<MdNode> {
        match parse_markdown(markdown).into_iter().next() {
            Some(MdNode::Paragraph(children)) => children,
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    fn styles(ops: &[Operation]) -> Vec<(StyleRange, String)> {
        ops.iter()
            .filter_map(|op| match op {
                Operation::ApplyTextStyle { range, fields, .. } => Some((*range, fields.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_extract_text_flattens_markup() {
        let nodes = inlines("a **b _c_** `d` [e](http://x)\nf");
        assert_eq!(extract_text(&nodes), "a b c d e f");
    }

    #[test]
    fn test_nested_styles_resolve_in_one_pass() {
        let nodes = inlines("x **bold _both_** y");
        let mut builder = RequestBuilder::new(10);
        let end = resolve_inline_styles(&nodes, 10, &mut builder);

        assert_eq!(end, utf16_len(&extract_text(&nodes)));
        // "x " = 2, "bold " = 5, "both" = 4
        assert_eq!(
            styles(&builder.build()),
            vec![
                (StyleRange::new(17, 21), "italic".to_string()),
                (StyleRange::new(12, 21), "bold".to_string()),
            ]
        );
    }

    #[test]
    fn test_soft_break_counts_one_unit() {
        let nodes = inlines("one\n*two*");
        let mut builder = RequestBuilder::new(1);
        resolve_inline_styles(&nodes, 1, &mut builder);
        assert_eq!(
            styles(&builder.build()),
            vec![(StyleRange::new(5, 8), "italic".to_string())]
        );
    }

    #[test]
    fn test_code_and_link_styles() {
        let nodes = inlines("`code` [here](https://example.com)");
        let mut builder = RequestBuilder::new(1);
        resolve_inline_styles(&nodes, 1, &mut builder);

        let ops = builder.build();
        assert_eq!(
            styles(&ops),
            vec![
                (StyleRange::new(1, 5), "weightedFontFamily".to_string()),
                (StyleRange::new(6, 10), "link".to_string()),
            ]
        );
        match &ops[1] {
            Operation::ApplyTextStyle { style, .. } => {
                assert_eq!(style.link_url.as_deref(), Some("https://example.com"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_spans_emit_nothing() {
        let nodes = vec![MdNode::Strong(vec![]), MdNode::Text("plain".to_string())];
        let mut builder = RequestBuilder::new(1);
        resolve_inline_styles(&nodes, 1, &mut builder);
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_offsets_use_utf16_units() {
        let nodes = inlines("😀 **é**");
        let mut builder = RequestBuilder::new(1);
        resolve_inline_styles(&nodes, 1, &mut builder);
        assert_eq!(
            styles(&builder.build()),
            vec![(StyleRange::new(4, 5), "bold".to_string())]
        );
    }
}
