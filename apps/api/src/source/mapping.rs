//! Per-platform column mappings for scraper exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::models::review::{Review, SourcePlatform};
use crate::source::RawRow;

/// Column names of one platform's review table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMapping {
    pub date: &'static str,
    pub text: &'static str,
    /// Preferred over `text` when present.
    pub text_translated: Option<&'static str>,
    pub url: &'static str,
    pub existing_response: Option<&'static str>,
    pub author_name: &'static str,
    pub venue_name: &'static str,
    pub venue_address: Option<&'static str>,
    pub rating: &'static str,
    pub published_label: Option<&'static str>,
}

pub const GOOGLE_MAPS: ColumnMapping = ColumnMapping {
    date: "publishedAtDate",
    text: "text",
    text_translated: Some("textTranslated"),
    url: "reviewUrl",
    existing_response: Some("responseFromOwnerText"),
    author_name: "name",
    venue_name: "title",
    venue_address: Some("address"),
    rating: "stars",
    published_label: Some("publishAt"),
};

pub const YELP: ColumnMapping = ColumnMapping {
    date: "date",
    text: "text",
    text_translated: None,
    url: "url",
    existing_response: Some("ownerResponse"),
    author_name: "reviewerName",
    venue_name: "businessName",
    venue_address: Some("businessAddress"),
    rating: "rating",
    published_label: None,
};

// Nested scraper fields arrive flattened with `_` by the warehouse writer.
pub const TRIP_ADVISOR: ColumnMapping = ColumnMapping {
    date: "publishedDate",
    text: "text",
    text_translated: None,
    url: "url",
    existing_response: Some("ownerResponse_text"),
    author_name: "user_name",
    venue_name: "placeInfo_name",
    venue_address: Some("placeInfo_address"),
    rating: "rating",
    published_label: None,
};

pub const FACEBOOK: ColumnMapping = ColumnMapping {
    date: "date",
    text: "text",
    text_translated: None,
    url: "url",
    existing_response: None,
    author_name: "user_name",
    venue_name: "pageName",
    venue_address: None,
    rating: "rating",
    published_label: None,
};

impl ColumnMapping {
    /// `None` for platforms without a backing table.
    pub fn for_platform(platform: SourcePlatform) -> Option<&'static ColumnMapping> {
        match platform {
            SourcePlatform::GoogleMaps => Some(&GOOGLE_MAPS),
            SourcePlatform::Yelp => Some(&YELP),
            SourcePlatform::TripAdvisor => Some(&TRIP_ADVISOR),
            SourcePlatform::Facebook => Some(&FACEBOOK),
            SourcePlatform::Manual => None,
        }
    }

    /// Builds a canonical review, or `None` when the row has no review text.
    pub fn to_review(&self, row: &RawRow<'_>, platform: SourcePlatform) -> Option<Review> {
        let original = row.get(self.text)?;
        let text = self
            .text_translated
            .and_then(|column| row.get(column))
            .unwrap_or(original);

        let optional = |column: Option<&'static str>| {
            column.and_then(|c| row.get(c)).map(str::to_string)
        };

        let date = row.get(self.date).and_then(|value| {
            let parsed = parse_date(value);
            if parsed.is_none() {
                warn!("Unrecognized {} value '{}', review ranks as undated", self.date, value);
            }
            parsed
        });

        Some(Review {
            date,
            text: text.to_string(),
            url: row.get(self.url).map(str::to_string),
            source_platform: platform,
            author_name: row.get(self.author_name).map(str::to_string),
            venue_name: row.get(self.venue_name).map(str::to_string),
            venue_address: optional(self.venue_address),
            rating: row.get(self.rating).and_then(parse_rating),
            published_label: optional(self.published_label),
            existing_response: optional(self.existing_response),
        })
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and bare dates (midnight UTC).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Star rating clamped to 0..=5. Decimal exports ("4.0") are rounded.
pub fn parse_rating(value: &str) -> Option<u8> {
    let stars: f64 = value.parse().ok()?;
    if !stars.is_finite() {
        return None;
    }
    Some(stars.round().clamp(0.0, 5.0) as u8)
}
