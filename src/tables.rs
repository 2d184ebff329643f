use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Query key the widget endpoint expects in front of the table name.
const QUERY_KEY: &str = "t=";

/// The table probed when fast-check mode is on.
pub const FAST_CHECK_TABLE: &str = "kb_knowledge";

/// A backend table identifier to probe for exposure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableCandidate(String);

impl TableCandidate {
    /// Returns `None` for names that are empty or could escape the host's
    /// result directory.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let bare = name.strip_prefix(QUERY_KEY).unwrap_or(name.as_str()).trim();

        if bare.is_empty() || bare.contains(['/', '\\']) || bare.contains("..") {
            return None;
        }

        Some(TableCandidate(bare.to_string()))
    }

    /// Bare table name, used for artifact file names.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Query string form sent to the widget endpoint (`t=<name>`).
    pub fn query(&self) -> String {
        format!("{}{}", QUERY_KEY, self.0)
    }

    pub fn is_fast_check_table(&self) -> bool {
        self.0 == FAST_CHECK_TABLE
    }
}

impl fmt::Display for TableCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a newline-delimited table list, keeping file order.
///
/// Repeated names keep their first occurrence so that every (host, table)
/// pair maps to exactly one job.
pub fn parse(content: &str) -> Arc<[TableCandidate]> {
    let mut seen = HashSet::new();

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let table = TableCandidate::new(line);
            if table.is_none() {
                log::warn!("Skipping invalid table name {:?}", line);
            }
            table
        })
        .filter(|table| seen.insert(table.clone()))
        .collect()
}

/// Load the table list once; the result is shared read-only by every job.
pub fn load(path: &Path) -> Result<Arc<[TableCandidate]>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading table names from {}", path.display()))?;

    let tables = parse(&content);
    log::info!("Loaded {} table candidates from {}", tables.len(), path.display());

    Ok(tables)
}
