use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform a review was scraped from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourcePlatform {
    GoogleMaps,
    Yelp,
    TripAdvisor,
    Facebook,
    Manual,
}

impl SourcePlatform {
    /// Human-readable label, used in exports and "Open in ..." links.
    pub fn label(&self) -> &'static str {
        match self {
            SourcePlatform::GoogleMaps => "Google Maps",
            SourcePlatform::Yelp => "Yelp",
            SourcePlatform::TripAdvisor => "Trip Advisor",
            SourcePlatform::Facebook => "Facebook",
            SourcePlatform::Manual => "Manual",
        }
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourcePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "google_maps" | "google" => Ok(SourcePlatform::GoogleMaps),
            "yelp" => Ok(SourcePlatform::Yelp),
            "trip_advisor" | "tripadvisor" => Ok(SourcePlatform::TripAdvisor),
            "facebook" => Ok(SourcePlatform::Facebook),
            "manual" => Ok(SourcePlatform::Manual),
            other => Err(format!("unknown source platform '{other}'")),
        }
    }
}

/// A customer review normalized to the canonical row shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub date: Option<DateTime<Utc>>,
    pub text: String,
    pub url: Option<String>,
    pub source_platform: SourcePlatform,
    pub author_name: Option<String>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub rating: Option<u8>,
    /// Relative date as shown by the platform ("a week ago").
    pub published_label: Option<String>,
    pub existing_response: Option<String>,
}

impl Review {
    /// A free-text review entered by hand.
    pub fn manual(text: impl Into<String>) -> Self {
        Self {
            date: None,
            text: text.into(),
            url: None,
            source_platform: SourcePlatform::Manual,
            author_name: None,
            venue_name: None,
            venue_address: None,
            rating: None,
            published_label: None,
            existing_response: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.existing_response.is_some()
    }
}

/// A prior review/response pair used as a few-shot example.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamplePair {
    pub review: String,
    pub response: String,
}

/// A review selected for processing plus its generated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub review: Review,
    /// `None` until the first completion call returns.
    pub response: Option<String>,
}

impl Draft {
    pub fn new(review: Review) -> Self {
        Self {
            id: Uuid::new_v4(),
            review,
            response: None,
        }
    }
}
