// ============================================================================
// MARKDOWN COMPILER
// ============================================================================
// Turns Markdown into one ordered batch of operations, starting at a caller
// supplied index. This compiler is deliberately lenient: Markdown is free
// text written by people (or agents), so anything we don't model is walked
// for its text instead of being rejected. It has no failure mode.

use super::builder::RequestBuilder;
use super::inline_styles::{extract_text, resolve_inline_styles};
use super::markdown::{parse_markdown, MdNode};
use super::operations::{ListPreset, NamedStyleType, Operation, TextStyle};

/// Compiles `source` into operations whose first insertion lands at
/// `start_index`. Blank input yields an empty batch.
pub fn compile_markdown(source: &str, start_index: i64) -> Vec<Operation> {
    if source.trim().is_empty() {
        return Vec::new();
    }

    let nodes = parse_markdown(source);
    let mut builder = RequestBuilder::new(start_index);
    compile_blocks(&nodes, &mut builder);

    let end_index = builder.cursor();
    let operations = builder.build();
    tracing::debug!(
        blocks = nodes.len(),
        operations = operations.len(),
        end_index,
        "Compiled markdown"
    );
    operations
}

/// Compiles a run of block nodes. Stray inline nodes (e.g. the alt text of an
/// image at container level) are grouped into an implicit paragraph.
fn compile_blocks(nodes: &[MdNode], builder: &mut RequestBuilder) {
    let mut inline_run: Vec<MdNode> = Vec::new();

    for node in nodes {
        if node.is_inline() {
            inline_run.push(node.clone());
            continue;
        }
        if !inline_run.is_empty() {
            compile_paragraph(&inline_run, builder);
            inline_run.clear();
        }
        compile_block(node, builder);
    }

    if !inline_run.is_empty() {
        compile_paragraph(&inline_run, builder);
    }
}

fn compile_block(node: &MdNode, builder: &mut RequestBuilder) {
    match node {
        MdNode::Heading { level, children } => compile_heading(*level, children, builder),
        MdNode::Paragraph(children) => compile_paragraph(children, builder),
        MdNode::List { ordered, items } => compile_list(*ordered, items, builder),
        MdNode::CodeBlock(code) => compile_code_block(code, builder),
        MdNode::ThematicBreak => builder.insert_horizontal_rule(),
        MdNode::Container(children) | MdNode::Item(children) => {
            compile_blocks(children, builder)
        }
        inline => compile_paragraph(std::slice::from_ref(inline), builder),
    }
}

fn compile_heading(level: u8, children: &[MdNode], builder: &mut RequestBuilder) {
    let text = extract_text(children);
    let start = builder.cursor();
    builder.insert_text(&format!("{}\n", text));
    let end = builder.cursor();

    builder.apply_paragraph_style(start, end, NamedStyleType::heading(level));
    resolve_inline_styles(children, start, builder);
}

fn compile_paragraph(children: &[MdNode], builder: &mut RequestBuilder) {
    let text = extract_text(children);
    if text.is_empty() {
        return;
    }

    let start = builder.cursor();
    builder.insert_text(&format!("{}\n", text));
    resolve_inline_styles(children, start, builder);
}

fn compile_list(ordered: bool, items: &[MdNode], builder: &mut RequestBuilder) {
    let mut lines = Vec::new();
    for item in items {
        collect_item_lines(item, &mut lines);
    }
    if lines.is_empty() {
        return;
    }

    let text: String = lines.iter().map(|line| format!("{}\n", line)).collect();
    let start = builder.cursor();
    builder.insert_text(&text);
    let end = builder.cursor();

    builder.create_list(start, end, ListPreset::for_markdown(ordered));
}

/// One line per item. Nested lists are flattened into extra lines after
/// their parent item since only one list level is modelled.
fn collect_item_lines(item: &MdNode, lines: &mut Vec<String>) {
    let children = match item {
        MdNode::Item(children) => children,
        other => std::slice::from_ref(other),
    };

    let mut parts: Vec<String> = Vec::new();
    let mut inline_run: Vec<MdNode> = Vec::new();
    let mut nested: Vec<&MdNode> = Vec::new();

    for child in children {
        match child {
            child if child.is_inline() => inline_run.push(child.clone()),
            MdNode::Paragraph(inlines) | MdNode::Heading { children: inlines, .. } => {
                parts.push(extract_text(inlines))
            }
            MdNode::CodeBlock(code) => parts.push(code.trim_end().to_string()),
            MdNode::List { items, .. } => nested.extend(items.iter()),
            MdNode::Container(inner) => parts.push(extract_text(inner)),
            _ => {}
        }
    }
    if !inline_run.is_empty() {
        parts.insert(0, extract_text(&inline_run));
    }

    let line = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(line);

    for nested_item in nested {
        collect_item_lines(nested_item, lines);
    }
}

fn compile_code_block(code: &str, builder: &mut RequestBuilder) {
    if code.is_empty() {
        return;
    }

    let start = builder.cursor();
    builder.insert_text(code);
    let end = builder.cursor();

    let style = TextStyle::monospace();
    let fields = style.field_mask();
    builder.apply_text_style(start, end, style, &fields);
    builder.insert_text("\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::docs::operations::StyleRange;

    fn insert(index: i64, text: &str) -> Operation {
        Operation::InsertText {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_blank_input_yields_empty_batch() {
        assert!(compile_markdown("", 1).is_empty());
        assert!(compile_markdown("  \n\t\n", 1).is_empty());
    }

    #[test]
    fn test_heading() {
        let ops = compile_markdown("# Hello\n", 1);
        assert_eq!(
            ops,
            vec![
                insert(1, "Hello\n"),
                Operation::ApplyParagraphStyle {
                    range: StyleRange::new(1, 7),
                    style: NamedStyleType::Heading(1),
                },
            ]
        );
    }

    #[test]
    fn test_bold_paragraph_excludes_newline() {
        let ops = compile_markdown("**bold**\n", 5);
        assert_eq!(ops[0], insert(5, "bold\n"));
        assert_eq!(
            ops[1],
            Operation::ApplyTextStyle {
                range: StyleRange::new(5, 9),
                style: TextStyle::bold(),
                fields: "bold".to_string(),
            }
        );
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_one_paragraph_style_per_heading() {
        let source = "# One\n\ntext\n\n## Two\n\n### Three\n\n###### Six\n";
        let headings: Vec<NamedStyleType> = compile_markdown(source, 1)
            .into_iter()
            .filter_map(|op| match op {
                Operation::ApplyParagraphStyle { style, .. } => Some(style),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec![
                NamedStyleType::Heading(1),
                NamedStyleType::Heading(2),
                NamedStyleType::Heading(3),
                NamedStyleType::Heading(6),
            ]
        );
    }

    #[test]
    fn test_blocks_chain_indices() {
        let ops = compile_markdown("# Hi\n\nthere\n", 1);
        assert_eq!(ops[0], insert(1, "Hi\n"));
        assert_eq!(ops[2], insert(4, "there\n"));
    }

    #[test]
    fn test_unordered_list() {
        let ops = compile_markdown("- apples\n- pears\n", 1);
        assert_eq!(
            ops,
            vec![
                insert(1, "apples\npears\n"),
                Operation::CreateList {
                    range: StyleRange::new(1, 14),
                    preset: ListPreset::BulletDiscCircleSquare,
                },
            ]
        );
    }

    #[test]
    fn test_ordered_loose_list_with_nested_items() {
        let ops = compile_markdown("1. first\n\n2. second\n   - inner\n", 1);
        assert_eq!(ops[0], insert(1, "first\nsecond\ninner\n"));
        assert!(matches!(
            ops[1],
            Operation::CreateList {
                preset: ListPreset::NumberedDecimalAlphaRoman,
                ..
            }
        ));
    }

    #[test]
    fn test_code_block() {
        let ops = compile_markdown("```\nlet x = 1;\n```\n", 1);
        assert_eq!(
            ops,
            vec![
                insert(1, "let x = 1;\n"),
                Operation::ApplyTextStyle {
                    range: StyleRange::new(1, 12),
                    style: TextStyle::monospace(),
                    fields: "weightedFontFamily".to_string(),
                },
                insert(12, "\n"),
            ]
        );
    }

    #[test]
    fn test_indented_code_block() {
        let ops = compile_markdown("para\n\n    indented\n", 1);
        assert_eq!(ops[1], insert(6, "indented\n"));
    }

    #[test]
    fn test_thematic_break() {
        let ops = compile_markdown("---\n", 1);
        let expected = format!("\n{}\n", "_".repeat(50));
        assert_eq!(ops, vec![insert(1, &expected)]);
    }

    #[test]
    fn test_block_quote_degrades_to_text() {
        let ops = compile_markdown("> quoted *words*\n", 1);
        assert_eq!(ops[0], insert(1, "quoted words\n"));
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_hard_break_strikethrough_and_image_alt() {
        let ops = compile_markdown("a  \n~~bc~~ ![alt](x.png)\n", 1);
        assert_eq!(
            ops,
            vec![
                insert(1, "a\u{000B}bc alt\n"),
                Operation::ApplyTextStyle {
                    range: StyleRange::new(3, 5),
                    style: TextStyle::strikethrough(),
                    fields: "strikethrough".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_heading_inside_list_item_is_plain_item_text() {
        let ops = compile_markdown("- # Head\n- b\n\n> ## Quoted\n", 1);
        assert_eq!(ops[0], insert(1, "Head\nb\n"));

        let styles: Vec<NamedStyleType> = ops
            .iter()
            .filter_map(|op| match op {
                Operation::ApplyParagraphStyle { style, .. } => Some(*style),
                _ => None,
            })
            .collect();
        // Only the quoted heading keeps its style.
        assert_eq!(styles, vec![NamedStyleType::Heading(2)]);
    }

    #[test]
    fn test_cursor_never_overlaps_between_blocks() {
        let source = "# A\n\nb **c**\n\n- d\n- e\n\n```\nf\n```\n\n---\n\ng\n";
        let ops = compile_markdown(source, 1);
        let mut expected_index = 1;
        for op in &ops {
            if let Operation::InsertText { index, text } = op {
                assert_eq!(*index, expected_index);
                expected_index += crate::core::docs::operations::utf16_len(text);
            }
        }
    }
}
