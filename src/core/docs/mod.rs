// =============================================================================
// DOCUMENT MUTATION
// =============================================================================
//
// Compiles Markdown or a declarative template into Google Docs batchUpdate
// operations and writes them to a document.
//
// **Layout (leaf first):**
// - `operations` - the edit operations and their style descriptors
// - `builder` - cursor-tracking accumulator; the only place doing index math
// - `markdown` / `inline_styles` / `markdown_compiler` - Markdown path
// - `template` / `template_compiler` - template path (validated, fail closed)
// - `snapshot` / `tables` - second-phase table population
// - `retry` - backoff for transient submission failures
// - `writer` - the compile, submit, populate workflow behind a service port

pub mod builder;
pub mod inline_styles;
pub mod markdown;
pub mod markdown_compiler;
pub mod operations;
pub mod retry;
pub mod snapshot;
pub mod tables;
pub mod template;
pub mod template_compiler;
pub mod writer;

#[allow(unused_imports)]
pub use markdown_compiler::compile_markdown;
#[allow(unused_imports)]
pub use operations::{Operation, StyleRange, TextStyle};
pub use retry::RetryPolicy;
pub use snapshot::DocumentSnapshot;
pub use template::DocumentTemplate;
#[allow(unused_imports)]
pub use template_compiler::compile_template;
#[allow(unused_imports)]
pub use writer::{DocsError, DocumentService, DocumentWriter, WriteMode, WriteSummary};
