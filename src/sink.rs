use crate::error::{Result, ScanError};
use crate::tables::TableCandidate;
use crate::target::Host;
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_RESULT_DIR: &str = "result";

/// Writes leaked records to `<root>/<host label>/<table>.json`.
///
/// Each probe job owns a distinct (host, table) key, so concurrent writers
/// never touch the same file.
#[derive(Debug, Clone)]
pub struct ResultSink {
    root: PathBuf,
}

impl ResultSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ResultSink { root: root.into() }
    }

    pub fn artifact_path(&self, host: &Host, table: &TableCandidate) -> PathBuf {
        self.root
            .join(host.label())
            .join(format!("{}.json", table.name()))
    }

    /// Persist the records, replacing any earlier artifact for the same key.
    pub async fn persist(
        &self,
        host: &Host,
        table: &TableCandidate,
        records: &[Value],
    ) -> Result<PathBuf> {
        let dir = self.root.join(host.label());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ScanError::Io {
                path: dir.clone(),
                source,
            })?;

        let payload = serde_json::to_vec(records).map_err(ScanError::Encode)?;

        let path = self.artifact_path(host, table);
        tokio::fs::write(&path, payload)
            .await
            .map_err(|source| ScanError::Io {
                path: path.clone(),
                source,
            })?;

        log::debug!("Wrote {} records to {}", records.len(), path.display());

        Ok(path)
    }
}
