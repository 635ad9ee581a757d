//! Local CSV directory export, one `<table_id>.csv` file per table.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::source::{ExportError, RawTable, TableExport};

#[derive(Debug, Clone)]
pub struct DirectoryExport {
    root: PathBuf,
}

impl DirectoryExport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TableExport for DirectoryExport {
    /// Files are read whole, so no ordering is requested.
    async fn export(
        &self,
        table_id: &str,
        _newest_first_by: Option<&str>,
    ) -> Result<RawTable, ExportError> {
        // Table ids never contain path components.
        if table_id.is_empty() || table_id.contains(['/', '\\']) || table_id.starts_with('.') {
            return Err(ExportError::NotFound(table_id.to_string()));
        }

        let path = self.root.join(format!("{table_id}.csv"));
        debug!("Reading table {} from {}", table_id, path.display());

        let csv_text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ExportError::NotFound(table_id.to_string()));
            }
            Err(e) => return Err(ExportError::Io(e)),
        };

        Ok(RawTable::parse(&csv_text)?)
    }
}
