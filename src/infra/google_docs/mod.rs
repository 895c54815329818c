// =============================================================================
// GOOGLE DOCS MODULE
// =============================================================================
//
// The HTTP side of document mutation.
//
// **Architecture:**
// This module lives in the infra layer because it handles external I/O
// (HTTP requests to Google APIs). The core layer only knows about the
// `DocumentService` port and the `Operation` values it compiles.
//
// - `requests` - encodes operations into batchUpdate request JSON
// - `google_docs_client` - auth plus the `DocumentService` implementation

pub mod google_docs_client;
pub mod requests;

#[allow(unused_imports)]
pub use google_docs_client::{GoogleDocsClient, ServiceAccountAuth, TokenSource};
#[allow(unused_imports)]
pub use requests::encode_batch;
