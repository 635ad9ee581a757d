//! One-shot CSV export of the current drafts.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::review::Draft;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    date: Option<String>,
    source: &'static str,
    author_name: Option<&'a str>,
    venue_name: Option<&'a str>,
    rating: Option<u8>,
    url: Option<&'a str>,
    review: &'a str,
    response: Option<&'a str>,
}

impl<'a> From<&'a Draft> for ExportRow<'a> {
    fn from(draft: &'a Draft) -> Self {
        let review = &draft.review;
        Self {
            date: review.date.map(|d| d.to_rfc3339()),
            source: review.source_platform.label(),
            author_name: review.author_name.as_deref(),
            venue_name: review.venue_name.as_deref(),
            rating: review.rating,
            url: review.url.as_deref(),
            review: &review.text,
            response: draft.response.as_deref(),
        }
    }
}

/// Renders one row per draft with a header row, even when there are no drafts.
pub fn drafts_to_csv(drafts: &[Draft]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record([
        "date",
        "source",
        "author_name",
        "venue_name",
        "rating",
        "url",
        "review",
        "response",
    ])?;
    for draft in drafts {
        writer
            .serialize(ExportRow::from(draft))
            .with_context(|| format!("Failed to serialize draft {}", draft.id))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e.error()))
}
