//! Example Selector — builds the few-shot example set.

use serde::Deserialize;
use thiserror::Error;

use crate::models::review::{ExamplePair, Review};

/// Hard cap on examples taken from answered reviews.
pub const MAX_EXAMPLES: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExampleError {
    #[error("No example responses are available; supply an example set to match your tone")]
    NoExamples,

    #[error("Example {row} has an empty {field}")]
    EmptyField { row: usize, field: &'static str },

    #[error("Example file is not valid CSV: {0}")]
    Csv(String),
}

/// Pairs answered reviews with their owner responses, most recent first,
/// capped at [`MAX_EXAMPLES`]. `answered` must already be in recency order.
pub fn select_examples(answered: &[Review]) -> Vec<ExamplePair> {
    answered
        .iter()
        .filter_map(|review| {
            let response = review.existing_response.as_deref()?;
            if review.text.trim().is_empty() || response.trim().is_empty() {
                return None;
            }
            Some(ExamplePair {
                review: review.text.clone(),
                response: response.to_string(),
            })
        })
        .take(MAX_EXAMPLES)
        .collect()
}

/// Accepts an externally supplied example list verbatim. No cap is applied;
/// each pair must have both fields non-empty. Rows are 1-based in errors.
pub fn external_examples(pairs: Vec<ExamplePair>) -> Result<Vec<ExamplePair>, ExampleError> {
    for (index, pair) in pairs.iter().enumerate() {
        if pair.review.trim().is_empty() {
            return Err(ExampleError::EmptyField {
                row: index + 1,
                field: "review",
            });
        }
        if pair.response.trim().is_empty() {
            return Err(ExampleError::EmptyField {
                row: index + 1,
                field: "response",
            });
        }
    }
    Ok(pairs)
}

#[derive(Debug, Deserialize)]
struct ExampleRecord {
    review: Option<String>,
    response: Option<String>,
}

/// Parses an uploaded CSV with `review` and `response` headers.
pub fn parse_example_csv(csv_text: &str) -> Result<Vec<ExamplePair>, ExampleError> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let pairs = reader
        .deserialize::<ExampleRecord>()
        .map(|record| {
            record
                .map(|r| ExamplePair {
                    review: r.review.unwrap_or_default(),
                    response: r.response.unwrap_or_default(),
                })
                .map_err(|e| ExampleError::Csv(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    external_examples(pairs)
}

/// `Err(NoExamples)` when the set is empty, for callers that must warn.
pub fn require_examples(examples: &[ExamplePair]) -> Result<(), ExampleError> {
    if examples.is_empty() {
        Err(ExampleError::NoExamples)
    } else {
        Ok(())
    }
}
