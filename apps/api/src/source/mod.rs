//! Response Source Adapter — turns platform-specific review tables into
//! canonical [`Review`] rows ordered by recency.
//!
//! The backing store is reached through [`TableExport`] so the Keboola
//! Storage API and a local CSV directory are interchangeable.

use async_trait::async_trait;
use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::review::{Review, SourcePlatform};
use crate::source::mapping::ColumnMapping;

pub mod directory;
pub mod keboola;
pub mod mapping;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("table '{0}' does not exist")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure to produce canonical reviews. `SourceNotFound` and `EmptyResult`
/// carry distinct user-facing messages.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("The table indicated for this data does not exist")]
    SourceNotFound { table_id: Option<String> },

    #[error("There are no reviews in the data")]
    EmptyResult,

    #[error("Failed to export reviews: {0}")]
    Export(ExportError),
}

impl SourceError {
    /// Stable machine-readable kind, shared by the session overview and HTTP errors.
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::SourceNotFound { .. } => "SOURCE_NOT_FOUND",
            SourceError::EmptyResult => "EMPTY_RESULT",
            SourceError::Export(_) => "EXPORT_ERROR",
        }
    }
}

impl From<ExportError> for SourceError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NotFound(table_id) => SourceError::SourceNotFound {
                table_id: Some(table_id),
            },
            other => SourceError::Export(other),
        }
    }
}

/// Named-table export capability of the data warehouse.
#[async_trait]
pub trait TableExport: Send + Sync {
    /// `newest_first_by` names the date column. Backends that can only return
    /// a bounded window of rows order it by that column, descending, so the
    /// window holds the most recent reviews.
    async fn export(
        &self,
        table_id: &str,
        newest_first_by: Option<&str>,
    ) -> Result<RawTable, ExportError>;
}

/// A table as exported: a header row plus string records.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    records: Vec<StringRecord>,
    /// Row cap the backend hit; rows past it were not exported.
    truncated_at: Option<usize>,
}

impl RawTable {
    /// Parses CSV text with a header row. NUL bytes are stripped first.
    pub fn parse(csv_text: &str) -> Result<Self, csv::Error> {
        let cleaned = csv_text.replace('\0', "");
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(cleaned.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            headers,
            records,
            truncated_at: None,
        })
    }

    /// Marks the table as cut off at `limit` rows.
    pub fn truncated(mut self, limit: usize) -> Self {
        self.truncated_at = Some(limit);
        self
    }

    pub fn truncated_at(&self) -> Option<usize> {
        self.truncated_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.records.iter().map(move |record| RawRow {
            headers: &self.headers,
            record,
        })
    }
}

/// One exported record with lookup by column name.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a [String],
    record: &'a StringRecord,
}

impl<'a> RawRow<'a> {
    /// Cell value for `column`. Missing columns and blank cells are `None`.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|h| h == column)?;
        let value = self.record.get(index)?.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// Reviews of one table, plus the row cap if the export was cut short.
#[derive(Debug, Clone)]
pub struct LoadedReviews {
    pub reviews: Vec<Review>,
    pub truncated_at: Option<usize>,
}

/// Fetches `table_id` and normalizes it with the column mapping of `platform`.
///
/// Output is sorted by descending date; undated rows come last and ties keep
/// table order.
pub async fn load_reviews(
    exporter: &dyn TableExport,
    table_id: Option<&str>,
    platform: SourcePlatform,
) -> Result<LoadedReviews, SourceError> {
    let Some(table_id) = table_id else {
        warn!("No table configured for {platform}");
        return Err(SourceError::SourceNotFound { table_id: None });
    };

    let Some(mapping) = ColumnMapping::for_platform(platform) else {
        warn!("{platform} has no table mapping");
        return Err(SourceError::SourceNotFound {
            table_id: Some(table_id.to_string()),
        });
    };

    let table = exporter.export(table_id, Some(mapping.date)).await?;
    if table.is_empty() {
        debug!("Table {table_id} exported no rows");
        return Err(SourceError::EmptyResult);
    }
    debug!("Exported {} raw rows from {}", table.len(), table_id);

    let mut reviews = normalize(&table, mapping, platform);
    if reviews.is_empty() {
        return Err(SourceError::EmptyResult);
    }

    sort_by_recency(&mut reviews);
    info!(
        "Loaded {} {} reviews from {} ({} dropped)",
        reviews.len(),
        platform,
        table_id,
        table.len() - reviews.len()
    );

    Ok(LoadedReviews {
        reviews,
        truncated_at: table.truncated_at(),
    })
}

/// Maps every row, dropping rows without review text.
pub fn normalize(
    table: &RawTable,
    mapping: &ColumnMapping,
    platform: SourcePlatform,
) -> Vec<Review> {
    table
        .rows()
        .filter_map(|row| mapping.to_review(&row, platform))
        .collect()
}

/// Most recent first. `sort_by` is stable and `None < Some`, so undated rows sink.
pub fn sort_by_recency(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| b.date.cmp(&a.date));
}
