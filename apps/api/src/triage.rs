//! Review Triage — splits canonical reviews into answered and unanswered.

use crate::models::review::Review;

pub const DEFAULT_BATCH_SIZE: i64 = 10;

/// Disjoint partition of loaded reviews. Both halves keep the input
/// (recency) order.
#[derive(Debug, Clone, Default)]
pub struct Triage {
    pub answered: Vec<Review>,
    pub unanswered: Vec<Review>,
}

impl Triage {
    pub fn new(reviews: &[Review]) -> Self {
        let (answered, unanswered): (Vec<Review>, Vec<Review>) =
            reviews.iter().cloned().partition(Review::is_answered);
        Self {
            answered,
            unanswered,
        }
    }

    /// The first `n` unanswered reviews. `n <= 0` yields an empty batch.
    pub fn batch(&self, n: i64) -> Vec<Review> {
        let n = usize::try_from(n).unwrap_or(0);
        self.unanswered.iter().take(n).cloned().collect()
    }
}
