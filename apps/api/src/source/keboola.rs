//! Keboola Storage API export.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::source::{ExportError, RawTable, TableExport};

/// Upper bound the data-preview endpoint accepts.
pub const PREVIEW_ROW_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    error: String,
}

/// Reads review tables through the Storage API data-preview endpoint, which
/// returns the table as CSV.
///
/// The preview is a bounded window: rows are requested newest first, and a
/// response that fills the window is marked truncated so callers can report
/// that older reviews were left out.
#[derive(Clone)]
pub struct KeboolaExport {
    client: Client,
    base_url: String,
    token: String,
    row_limit: u32,
}

impl KeboolaExport {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base_url: String,
        token: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ExportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            row_limit: PREVIEW_ROW_LIMIT,
        })
    }

    /// Requests at most `limit` rows, clamped to 1..=[`PREVIEW_ROW_LIMIT`].
    pub fn with_row_limit(mut self, limit: u32) -> Self {
        self.row_limit = limit.clamp(1, PREVIEW_ROW_LIMIT);
        self
    }

    fn preview_url(&self, table_id: &str) -> String {
        format!(
            "{}/v2/storage/tables/{}/data-preview",
            self.base_url, table_id
        )
    }

    fn preview_query(&self, newest_first_by: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.row_limit.to_string())];
        if let Some(column) = newest_first_by {
            query.push(("orderBy[0][column]", column.to_string()));
            query.push(("orderBy[0][order]", "DESC".to_string()));
        }
        query
    }
}

#[async_trait]
impl TableExport for KeboolaExport {
    async fn export(
        &self,
        table_id: &str,
        newest_first_by: Option<&str>,
    ) -> Result<RawTable, ExportError> {
        let url = self.preview_url(table_id);
        debug!("Exporting {table_id} from {url}");

        let response = self
            .client
            .get(&url)
            .header("X-StorageApi-Token", &self.token)
            .query(&self.preview_query(newest_first_by))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("Storage API reports table {table_id} missing");
            return Err(ExportError::NotFound(table_id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StorageErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ExportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let table = RawTable::parse(&body)?;

        let limit = self.row_limit as usize;
        if table.len() >= limit {
            warn!(
                "Table {table_id} filled the {limit}-row preview window; older rows were not read"
            );
            return Ok(table.truncated(limit));
        }
        Ok(table)
    }
}
