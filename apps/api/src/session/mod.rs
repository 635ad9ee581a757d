//! Review Session — the working set of one interactive run.
//!
//! Screens: Selecting → (Generating) → Reviewing → Selecting.
//! Every action takes the collaborators it needs by reference; the session
//! itself holds only data.
//!
//! Batch actions build drafts on owned copies and commit them only after the
//! last completion call, so dropping an action midway leaves the session as
//! it was before the action started.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::few_shot::{require_examples, select_examples};
use crate::generation::gateway::{generate, generate_batch};
use crate::llm_client::Completion;
use crate::models::review::{Draft, ExamplePair, Review, SourcePlatform};
use crate::source::{load_reviews, SourceError, TableExport};
use crate::triage::Triage;

pub mod handlers;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Selecting,
    Generating,
    Reviewing,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while the session is {screen:?}")]
    WrongScreen { action: &'static str, screen: Screen },

    #[error("Draft {0} not found in the current batch")]
    DraftNotFound(Uuid),

    #[error("No reviews are loaded")]
    NotLoaded,

    #[error("Review text cannot be empty")]
    EmptyReview,

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Last load failure, kept for display until the next successful load.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadFailure {
    pub code: &'static str,
    pub message: String,
}

/// Result of a batch generation or regeneration.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub drafts: usize,
    pub failures: usize,
    pub examples_used: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub screen: Screen,
    pub platform: SourcePlatform,
    pub table_id: Option<String>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub loaded_reviews: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub examples: usize,
    pub drafts: Vec<Draft>,
    pub error: Option<LoadFailure>,
    /// Set when the last load could only read part of the table.
    pub warning: Option<String>,
}

#[derive(Debug)]
pub struct ReviewSession {
    platform: SourcePlatform,
    table_id: Option<String>,
    reviews: Vec<Review>,
    triage: Triage,
    example_pairs: Vec<ExamplePair>,
    /// Example set the current batch was generated with; reused on regeneration.
    batch_examples: Vec<ExamplePair>,
    drafts: Vec<Draft>,
    screen: Screen,
    last_error: Option<LoadFailure>,
    load_warning: Option<String>,
}

/// Holds the screen at `Generating` while a batch runs. Dropped before
/// [`ScreenGuard::leave`], it puts the previous screen back.
struct ScreenGuard<'a> {
    screen: &'a mut Screen,
    on_drop: Screen,
}

impl<'a> ScreenGuard<'a> {
    fn enter(screen: &'a mut Screen, during: Screen) -> Self {
        let on_drop = std::mem::replace(screen, during);
        Self { screen, on_drop }
    }

    fn leave(mut self, next: Screen) {
        self.on_drop = next;
    }
}

impl Drop for ScreenGuard<'_> {
    fn drop(&mut self) {
        *self.screen = self.on_drop;
    }
}

impl ReviewSession {
    pub fn new(platform: SourcePlatform, table_id: Option<String>) -> Self {
        Self {
            platform,
            table_id,
            reviews: Vec::new(),
            triage: Triage::default(),
            example_pairs: Vec::new(),
            batch_examples: Vec::new(),
            drafts: Vec::new(),
            screen: Screen::Selecting,
            last_error: None,
            load_warning: None,
        }
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    fn expect_screen(&self, expected: Screen, action: &'static str) -> Result<(), SessionError> {
        if self.screen == expected {
            Ok(())
        } else {
            Err(SessionError::WrongScreen {
                action,
                screen: self.screen,
            })
        }
    }

    /// Switches the platform/table the next `load` reads from.
    pub fn select_source(
        &mut self,
        platform: SourcePlatform,
        table_id: Option<String>,
    ) -> Result<(), SessionError> {
        self.expect_screen(Screen::Selecting, "change the source")?;
        self.platform = platform;
        self.table_id = table_id;
        Ok(())
    }

    /// Re-fetches reviews. A failure clears the loaded set, is recorded for
    /// display, and leaves the session in `Selecting`.
    pub async fn load(&mut self, exporter: &dyn TableExport) -> Result<usize, SessionError> {
        self.expect_screen(Screen::Selecting, "load reviews")?;

        match load_reviews(exporter, self.table_id.as_deref(), self.platform).await {
            Ok(loaded) => {
                self.triage = Triage::new(&loaded.reviews);
                self.example_pairs = select_examples(&self.triage.answered);
                self.reviews = loaded.reviews;
                self.last_error = None;
                self.load_warning = loaded.truncated_at.map(|limit| {
                    format!("Only the {limit} most recent rows of the table were read")
                });
                info!(
                    "Session loaded {} reviews ({} answered, {} examples)",
                    self.reviews.len(),
                    self.triage.answered.len(),
                    self.example_pairs.len()
                );
                Ok(self.reviews.len())
            }
            Err(e) => {
                warn!("Loading reviews failed: {e}");
                self.reviews.clear();
                self.triage = Triage::default();
                self.example_pairs.clear();
                self.load_warning = None;
                self.last_error = Some(LoadFailure {
                    code: e.code(),
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Drafts responses for the `n` most recent unanswered reviews.
    pub async fn generate(
        &mut self,
        completion: &dyn Completion,
        n: i64,
    ) -> Result<GenerationOutcome, SessionError> {
        self.expect_screen(Screen::Selecting, "generate drafts")?;
        if self.reviews.is_empty() {
            return Err(SessionError::NotLoaded);
        }

        let drafts = self.triage.batch(n).into_iter().map(Draft::new).collect();
        let examples = self.example_pairs.clone();
        Ok(self.run_batch(completion, examples, drafts).await)
    }

    /// Drafts a response for one free-text review using a caller-supplied
    /// example set. Works without any loaded reviews.
    pub async fn generate_manual(
        &mut self,
        completion: &dyn Completion,
        review_text: &str,
        examples: Vec<ExamplePair>,
    ) -> Result<GenerationOutcome, SessionError> {
        self.expect_screen(Screen::Selecting, "generate drafts")?;
        if review_text.trim().is_empty() {
            return Err(SessionError::EmptyReview);
        }

        let drafts = vec![Draft::new(Review::manual(review_text))];
        Ok(self.run_batch(completion, examples, drafts).await)
    }

    async fn run_batch(
        &mut self,
        completion: &dyn Completion,
        examples: Vec<ExamplePair>,
        mut drafts: Vec<Draft>,
    ) -> GenerationOutcome {
        let mut warnings = Vec::new();
        if let Err(e) = require_examples(&examples) {
            warnings.push(e.to_string());
        }

        let guard = ScreenGuard::enter(&mut self.screen, Screen::Generating);
        let failures = generate_batch(completion, &examples, &mut drafts).await;
        guard.leave(Screen::Reviewing);

        self.batch_examples = examples;
        self.drafts = drafts;

        GenerationOutcome {
            drafts: self.drafts.len(),
            failures,
            examples_used: self.batch_examples.len(),
            warnings,
        }
    }

    /// Replaces the response of exactly one draft.
    pub async fn regenerate(
        &mut self,
        completion: &dyn Completion,
        draft_id: Uuid,
    ) -> Result<&Draft, SessionError> {
        self.expect_screen(Screen::Reviewing, "regenerate a draft")?;
        let index = self
            .drafts
            .iter()
            .position(|d| d.id == draft_id)
            .ok_or(SessionError::DraftNotFound(draft_id))?;

        let response = generate(completion, &self.batch_examples, &self.drafts[index].review.text).await;
        self.drafts[index].response = Some(response);

        info!("Regenerated draft {draft_id}");
        Ok(&self.drafts[index])
    }

    /// Regenerates every draft of the current batch, in order.
    pub async fn regenerate_all(
        &mut self,
        completion: &dyn Completion,
    ) -> Result<GenerationOutcome, SessionError> {
        self.expect_screen(Screen::Reviewing, "regenerate drafts")?;
        let examples = self.batch_examples.clone();
        let mut drafts = self.drafts.clone();
        for draft in &mut drafts {
            draft.response = None;
        }
        Ok(self.run_batch(completion, examples, drafts).await)
    }

    /// Discards the drafts and returns to selection. Loaded reviews are kept.
    pub fn back(&mut self) -> Result<(), SessionError> {
        self.expect_screen(Screen::Reviewing, "go back")?;
        self.drafts.clear();
        self.batch_examples.clear();
        self.screen = Screen::Selecting;
        Ok(())
    }

    pub fn overview(&self) -> SessionOverview {
        let newest = self.reviews.first();
        SessionOverview {
            screen: self.screen,
            platform: self.platform,
            table_id: self.table_id.clone(),
            venue_name: newest.and_then(|r| r.venue_name.clone()),
            venue_address: newest.and_then(|r| r.venue_address.clone()),
            loaded_reviews: self.reviews.len(),
            answered: self.triage.answered.len(),
            unanswered: self.triage.unanswered.len(),
            examples: self.example_pairs.len(),
            drafts: self.drafts.clone(),
            error: self.last_error.clone(),
            warning: self.load_warning.clone(),
        }
    }
}
