// ============================================================================
// DOCUMENT WRITER
// ============================================================================
// The compile-and-submit workflow. Nothing in here talks HTTP: the remote
// document is reached through the `DocumentService` port, which the infra
// layer implements for the real Google Docs API and tests implement in memory.
//
// Flow for one call:
//   1. snapshot the document to learn where its content ends
//   2. compile Markdown or a template into a batch starting there
//   3. submit the batch (with retries)
//   4. for every table the batch created: snapshot again, resolve the real
//      cell indices, submit the cell contents
//   5. for templates with content after a table: snapshot again and compile
//      the next stage at the new end of the document
//
// A failure in step 4 or 5 leaves the earlier batches applied. There is no
// rollback; callers that need all-or-nothing should write to a fresh document.

use async_trait::async_trait;
use thiserror::Error;

use super::markdown_compiler::compile_markdown;
use super::operations::{Operation, StyleRange};
use super::retry::{with_retry, RetryPolicy, Transient};
use super::snapshot::DocumentSnapshot;
use super::tables::{PendingTable, TableError};
use super::template::{DocumentTemplate, TemplateError};
use super::template_compiler::compile_template;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Google Docs API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request to Google Docs failed: {0}")]
    Transport(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected document snapshot: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl DocsError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DocsError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Transient for DocsError {
    /// Rate limits and server-side errors are worth another try.
    fn is_transient(&self) -> bool {
        matches!(self.status(), Some(status) if status == 429 || (500..600).contains(&status))
    }
}

/// Port to the remote document. Implemented by the Google Docs client.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Applies `operations` in order as one batch.
    async fn submit_batch(&self, document_id: &str, operations: &[Operation])
        -> Result<(), DocsError>;

    /// Fetches the current structure of the document, with indices.
    async fn get_snapshot(&self, document_id: &str) -> Result<DocumentSnapshot, DocsError>;
}

/// Where new content goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// After the existing content.
    #[default]
    Append,
    /// Existing body content is deleted first, in the same batch.
    Replace,
}

/// What a write call sent to the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub batches: usize,
    pub operations: usize,
    pub tables: usize,
}

pub struct DocumentWriter<S: DocumentService> {
    service: S,
    retry: RetryPolicy,
}

impl<S: DocumentService> DocumentWriter<S> {
    pub fn new(service: S, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Compiles `markdown` and writes it as a single batch.
    pub async fn write_markdown(
        &self,
        document_id: &str,
        markdown: &str,
        mode: WriteMode,
    ) -> Result<WriteSummary, DocsError> {
        let mut summary = WriteSummary::default();

        let snapshot = self.snapshot(document_id).await?;
        let (mut batch, start_index) = Self::prepare(&snapshot, mode);
        batch.extend(compile_markdown(markdown, start_index));

        if batch.is_empty() {
            tracing::info!(document_id, "Markdown produced no operations, nothing to write");
            return Ok(summary);
        }

        self.submit(document_id, &batch, &mut summary).await?;
        Ok(summary)
    }

    /// Validates and writes a template, populating tables in follow-up
    /// batches. An invalid template fails before any batch is submitted.
    pub async fn write_template(
        &self,
        document_id: &str,
        template: &DocumentTemplate,
        mode: WriteMode,
    ) -> Result<WriteSummary, DocsError> {
        let mut summary = WriteSummary::default();
        let snapshot = self.snapshot(document_id).await?;
        let (mut batch, start_index) = Self::prepare(&snapshot, mode);

        let mut stage = compile_template(template, start_index)?;
        loop {
            batch.extend(std::mem::take(&mut stage.operations));
            if !batch.is_empty() {
                self.submit(document_id, &batch, &mut summary).await?;
                batch.clear();
            }

            for job in std::mem::take(&mut stage.pending_tables) {
                self.populate_table(document_id, job, &mut summary).await?;
            }

            match stage.continuation.take() {
                None => break,
                Some(rest) => {
                    let snapshot = self.snapshot(document_id).await?;
                    stage = rest.compile(snapshot.insertion_index());
                }
            }
        }

        Ok(summary)
    }

    /// Second phase for one table: needs a snapshot taken after the batch
    /// that inserted it.
    async fn populate_table(
        &self,
        document_id: &str,
        job: PendingTable,
        summary: &mut WriteSummary,
    ) -> Result<(), DocsError> {
        summary.tables += 1;
        if !job.has_content() {
            return Ok(());
        }

        let snapshot = self.snapshot(document_id).await?;
        let resolved = job.resolve(&snapshot)?;
        let table_start = resolved.table_start();
        let populated = resolved.populate();
        tracing::info!(
            document_id,
            table_start,
            cells = populated.cells_written,
            "Populating table"
        );

        self.submit(document_id, &populated.operations, summary).await
    }

    /// Leading operations and start index for the chosen mode.
    fn prepare(snapshot: &DocumentSnapshot, mode: WriteMode) -> (Vec<Operation>, i64) {
        let end = snapshot.insertion_index();
        match mode {
            WriteMode::Append => (Vec::new(), end),
            WriteMode::Replace if end > 1 => (
                vec![Operation::DeleteRange {
                    range: StyleRange::new(1, end),
                }],
                1,
            ),
            WriteMode::Replace => (Vec::new(), 1),
        }
    }

    async fn snapshot(&self, document_id: &str) -> Result<DocumentSnapshot, DocsError> {
        let snapshot = with_retry(&self.retry, "Fetching document", || {
            self.service.get_snapshot(document_id)
        })
        .await?;
        tracing::debug!(
            document_id = %snapshot.document_id,
            title = %snapshot.title,
            end_index = snapshot.end_index(),
            tables = snapshot.tables().count(),
            "Fetched document snapshot"
        );
        Ok(snapshot)
    }

    async fn submit(
        &self,
        document_id: &str,
        operations: &[Operation],
        summary: &mut WriteSummary,
    ) -> Result<(), DocsError> {
        tracing::info!(
            document_id,
            operations = operations.len(),
            "Submitting batch"
        );
        with_retry(&self.retry, "Batch update", || {
            self.service.submit_batch(document_id, operations)
        })
        .await?;

        summary.batches += 1;
        summary.operations += operations.len();
        Ok(())
    }
}
