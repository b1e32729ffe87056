//! Schema Engine: drives a [`DatabaseAdapter`] to extract/apply each object
//! category in the correct order (spec §4.4).

mod adapter;
mod mock;
mod splitter;

pub use adapter::DatabaseAdapter;
pub use mock::MockAdapter;
pub use splitter::split_statements;

use crate::artifact::Artifact;
use crate::error::BackyError;
use crate::job::ObjectCategory;

/// `extract(conn, features, multiple_files) -> iterator<Artifact>` (spec
/// §4.4). Returns artifacts already in backup dependency-rank order; the
/// caller decides whether to keep them separate (`multiple_files=true`) or
/// concatenate them via [`Artifact::concat`].
pub fn extract(
    adapter: &dyn DatabaseAdapter,
    features: &std::collections::BTreeSet<ObjectCategory>,
) -> Result<Vec<Artifact>, BackyError> {
    let mut categories: Vec<ObjectCategory> = features.iter().copied().collect();
    categories.sort_by_key(|c| c.backup_rank());

    let mut artifacts = Vec::with_capacity(categories.len());
    for category in categories {
        let statements = adapter.extract_category(category)?;
        let bytes = statements.join("\n").into_bytes();
        artifacts.push(Artifact::new(category.file_name(), [category], bytes));
    }
    Ok(artifacts)
}

/// `apply(conn, artifact_stream)` (spec §4.4): splits on statement
/// terminators (tolerating block delimiters) and executes each statement
/// against `adapter`. Stops at the first fatal error unless `best_effort`
/// is set, in which case it records skipped statements and continues
/// (spec §9 "Exceptions-as-control-flow").
pub fn apply(adapter: &mut dyn DatabaseAdapter, sql: &str, best_effort: bool) -> Result<Vec<String>, BackyError> {
    let mut skipped = Vec::new();
    for statement in split_statements(sql) {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        match adapter.apply_statement(trimmed) {
            Ok(()) => {}
            Err(err) if best_effort => skipped.push(format!("{trimmed} ({err})")),
            Err(err) => return Err(err),
        }
    }
    Ok(skipped)
}
