// This is the entry point of the document writer.
//
// **Architecture Overview:**
// - `core/` = Compilation and the write workflow (no HTTP)
// - `infra/` = Implementations of core traits (the Google Docs API)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Read the input and hand it to the writer
//
// Usage: gdocs_compose <doc-id-or-url> <input.md|template.json> [--replace]

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a pile of mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::{bail, Context};
use std::path::Path;

use crate::core::docs::{DocumentTemplate, DocumentWriter, RetryPolicy, WriteMode};
use crate::infra::google_docs::GoogleDocsClient;

const USAGE: &str = "Usage: gdocs_compose <doc-id-or-url> <input.md|template.json> [--replace]";

struct Args {
    document_id: String,
    input: String,
    mode: WriteMode,
}

impl Args {
    fn parse(raw: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut positional = Vec::new();
        let mut mode = WriteMode::Append;

        for arg in raw {
            match arg.as_str() {
                "--replace" => mode = WriteMode::Replace,
                flag if flag.starts_with("--") => bail!("Unknown flag {}\n{}", flag, USAGE),
                _ => positional.push(arg),
            }
        }

        let [doc, input]: [String; 2] = positional
            .try_into()
            .map_err(|_| anyhow::anyhow!(USAGE))?;
        let document_id = GoogleDocsClient::extract_doc_id(&doc)
            .with_context(|| format!("Not a Google Docs URL or document ID: {}", doc))?;

        Ok(Self {
            document_id,
            input,
            mode,
        })
    }

    fn is_template(&self) -> bool {
        Path::new(&self.input)
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let args = Args::parse(std::env::args().skip(1))?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    let client = GoogleDocsClient::from_env()
        .await
        .context("Failed to configure Google Docs access")?;
    let retry = RetryPolicy::from_env();
    tracing::debug!(?retry, "Retry policy");
    let writer = DocumentWriter::new(client, retry);

    let summary = if args.is_template() {
        let template = DocumentTemplate::from_file(&args.input)
            .await
            .with_context(|| format!("Failed to load template {}", args.input))?;
        writer
            .write_template(&args.document_id, &template, args.mode)
            .await
            .context("Failed to write template")?
    } else {
        let markdown = tokio::fs::read_to_string(&args.input)
            .await
            .with_context(|| format!("Failed to read {}", args.input))?;
        writer
            .write_markdown(&args.document_id, &markdown, args.mode)
            .await
            .context("Failed to write Markdown")?
    };

    tracing::info!(
        document_id = %args.document_id,
        batches = summary.batches,
        operations = summary.operations,
        tables = summary.tables,
        "Document updated"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> anyhow::Result<Args> {
        Args::parse(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_markdown_append() {
        let parsed = args(&["https://docs.google.com/document/d/abc123/edit", "notes.md"]).unwrap();
        assert_eq!(parsed.document_id, "abc123");
        assert_eq!(parsed.mode, WriteMode::Append);
        assert!(!parsed.is_template());
    }

    #[test]
    fn test_parse_template_replace() {
        let parsed = args(&["abc123", "--replace", "report.JSON"]).unwrap();
        assert_eq!(parsed.mode, WriteMode::Replace);
        assert!(parsed.is_template());
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(args(&["abc123"]).is_err());
        assert!(args(&["abc123", "a.md", "b.md"]).is_err());
        assert!(args(&["abc123", "a.md", "--force"]).is_err());
        assert!(args(&["not/an/id", "a.md"]).is_err());
    }
}
