// The core module contains all business logic.
// Nothing in here performs I/O against Google; see `infra` for that.

#[path = "docs/mod.rs"]
pub mod docs;
