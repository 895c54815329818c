// ============================================================================
// TEMPLATE COMPILER
// ============================================================================
// Drives the same RequestBuilder as the Markdown compiler, but from validated
// template blocks instead of a parsed tree.
//
// Tables are special. `insert_table` can't advance the cursor, so anything
// compiled after a table in the same batch would land *in front of* it. A
// compile therefore stops right after the first table: the batch ends with
// the InsertTable, the table's content becomes a PendingTable, and the blocks
// that follow become a continuation that is compiled later against the end
// index of a fresh snapshot.

use super::builder::RequestBuilder;
use super::operations::{utf16_len, Operation};
use super::tables::PendingTable;
use super::template::{DocumentTemplate, TemplateBlock, TemplateError, TextFormat};

/// One stage of a compiled template.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// Everything up to and including the first table insert.
    pub operations: Vec<Operation>,
    /// Table content to write once the batch has been applied.
    pub pending_tables: Vec<PendingTable>,
    /// Blocks that come after the table, if any.
    pub continuation: Option<TemplateContinuation>,
}

/// Validated blocks still waiting to be compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateContinuation {
    blocks: Vec<TemplateBlock>,
}

impl TemplateContinuation {
    /// Compiles the next stage starting at `start_index`.
    pub fn compile(self, start_index: i64) -> CompiledTemplate {
        compile_blocks(self.blocks, start_index)
    }
}

/// Validates `template` and compiles its first stage.
///
/// Validation covers the whole template, including blocks that end up in a
/// continuation, so an invalid template never yields any operations.
pub fn compile_template(
    template: &DocumentTemplate,
    start_index: i64,
) -> Result<CompiledTemplate, TemplateError> {
    let blocks = template.validate()?;
    Ok(compile_blocks(blocks, start_index))
}

fn compile_blocks(blocks: Vec<TemplateBlock>, start_index: i64) -> CompiledTemplate {
    let mut builder = RequestBuilder::new(start_index);
    let mut pending_tables = Vec::new();
    let mut continuation = None;

    let mut remaining = blocks.into_iter();
    while let Some(block) = remaining.next() {
        match block {
            TemplateBlock::Table(job) => {
                builder.insert_table(job.rows, job.columns);
                pending_tables.push(job);

                let rest: Vec<TemplateBlock> = remaining.collect();
                if !rest.is_empty() {
                    continuation = Some(TemplateContinuation { blocks: rest });
                }
                break;
            }
            other => compile_block(other, &mut builder),
        }
    }

    let operations = builder.build();
    tracing::debug!(
        operations = operations.len(),
        pending_tables = pending_tables.len(),
        deferred_blocks = continuation.as_ref().map_or(0, |rest| rest.blocks.len()),
        "Compiled template stage"
    );

    CompiledTemplate {
        operations,
        pending_tables,
        continuation,
    }
}

fn compile_block(block: TemplateBlock, builder: &mut RequestBuilder) {
    match block {
        TemplateBlock::Heading { text, style } => {
            let start = builder.cursor();
            builder.insert_text(&format!("{}\n", text));
            let end = builder.cursor();
            builder.apply_paragraph_style(start, end, style);
        }
        TemplateBlock::Text { content, format } => compile_text(&content, format, builder),
        TemplateBlock::List { items, preset } => {
            let text: String = items.iter().map(|item| format!("{}\n", item)).collect();
            let start = builder.cursor();
            builder.insert_text(&text);
            let end = builder.cursor();
            builder.create_list(start, end, preset);
        }
        TemplateBlock::PageBreak => builder.insert_page_break(),
        TemplateBlock::HorizontalRule => builder.insert_horizontal_rule(),
        // Handled by the caller since it ends the stage.
        TemplateBlock::Table(_) => {}
    }
}

fn compile_text(content: &str, format: TextFormat, builder: &mut RequestBuilder) {
    let body = content.strip_suffix('\n').unwrap_or(content);
    if body.is_empty() {
        return;
    }

    let start = builder.cursor();
    builder.insert_text(&format!("{}\n", body));
    let end = builder.cursor();

    if let Some(style) = format.named_style {
        builder.apply_paragraph_style(start, end, style);
    }
    if let Some(alignment) = format.alignment {
        builder.apply_alignment(start, end, alignment);
    }
    if !format.text_style.is_empty() {
        let fields = format.text_style.field_mask();
        builder.apply_text_style(start, start + utf16_len(body), format.text_style, &fields);
    }
}
